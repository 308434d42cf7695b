use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("invalid farm profile: {0}")] Validation(String),
    #[error("no farm profile saved yet; run `farmassist profile set` first")] MissingProfile,
    #[error("image rejected: {0}")] Image(String),
    #[error("profile store error: {0}")] Store(String),
    #[error("a chat reply is still pending")] TurnInFlight,
    #[error("a suggestions request is already in flight")] FetchInFlight,
    #[error("no pending chat turn with id {0}")] UnknownTurn(uuid::Uuid),
}
