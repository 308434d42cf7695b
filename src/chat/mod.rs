use uuid::Uuid;

use crate::errors::AdvisorError;
use crate::image::ImageAttachment;
use crate::wire::ChatMessage;

pub const GREETING: &str = "Namaste! 🙏 I'm your friendly farming guide. I can help you with any farming questions - like how to grow crops organically, solve plant problems, or improve soil health. You can also share photos of your plants if you need help identifying problems!";

/// A submitted turn waiting for its reply.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub id: Uuid,
    pub question: String,
    pub image_url: Option<String>,
}

/// Append-only transcript for one session. At most one turn is outstanding;
/// its placeholder is found by id when the reply arrives.
#[derive(Debug)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    pending: Option<Uuid>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::bot(Uuid::new_v4(), GREETING)],
            pending: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Record the user's message and a loading placeholder. Refused while a
    /// previous turn is still unresolved, or when there is nothing to send.
    pub fn submit(
        &mut self,
        text: &str,
        image: Option<ImageAttachment>,
    ) -> Result<PendingTurn, AdvisorError> {
        if self.pending.is_some() {
            return Err(AdvisorError::TurnInFlight);
        }
        if text.trim().is_empty() && image.is_none() {
            return Err(AdvisorError::Validation("type a question or attach a photo".into()));
        }

        let id = Uuid::new_v4();
        let image_url = image.map(|i| i.data_uri);
        self.messages
            .push(ChatMessage::user(id, text, image_url.clone()));
        self.messages.push(ChatMessage::placeholder(id));
        self.pending = Some(id);

        Ok(PendingTurn {
            id,
            question: text.to_string(),
            image_url,
        })
    }

    /// Swap the turn's placeholder for the bot's reply.
    pub fn resolve(&mut self, turn: Uuid, reply: String) -> Result<&ChatMessage, AdvisorError> {
        if self.pending != Some(turn) {
            return Err(AdvisorError::UnknownTurn(turn));
        }
        let idx = self
            .messages
            .iter()
            .rposition(|m| m.loading && m.is_bot && m.id == turn)
            .ok_or(AdvisorError::UnknownTurn(turn))?;

        self.messages[idx] = ChatMessage::bot(turn, reply);
        self.pending = None;
        Ok(&self.messages[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> ImageAttachment {
        ImageAttachment {
            mime: "image/jpeg",
            bytes: 3,
            data_uri: "data:image/jpeg;base64,AAAA".into(),
        }
    }

    #[test]
    fn starts_with_greeting() {
        let s = ChatSession::new();
        assert_eq!(s.messages().len(), 1);
        assert!(s.messages()[0].is_bot);
        assert_eq!(s.messages()[0].text, GREETING);
    }

    #[test]
    fn submit_appends_user_and_placeholder() {
        let mut s = ChatSession::new();
        let turn = s.submit("Why are my tomato leaves curling?", None).unwrap();

        let msgs = s.messages();
        assert_eq!(msgs.len(), 3);
        assert!(!msgs[1].is_bot);
        assert_eq!(msgs[1].id, turn.id);
        assert!(msgs[2].loading);
        assert_eq!(msgs[2].id, turn.id);
        assert!(s.is_waiting());
    }

    #[test]
    fn second_submit_while_waiting_is_refused() {
        let mut s = ChatSession::new();
        s.submit("first", None).unwrap();
        assert!(matches!(s.submit("second", None), Err(AdvisorError::TurnInFlight)));
        assert_eq!(s.messages().len(), 3);
    }

    #[test]
    fn resolve_replaces_matching_placeholder() {
        let mut s = ChatSession::new();
        let turn = s.submit("What is jeevamrut?", None).unwrap();
        s.resolve(turn.id, "A fermented manure tonic.".into()).unwrap();

        let last = s.messages().last().unwrap();
        assert!(!last.loading);
        assert!(last.is_bot);
        assert_eq!(last.text, "A fermented manure tonic.");
        assert!(!s.is_waiting());
        assert_eq!(s.messages().iter().filter(|m| m.loading).count(), 0);

        assert!(s.submit("next", None).is_ok());
    }

    #[test]
    fn resolve_with_stale_id_is_refused() {
        let mut s = ChatSession::new();
        let turn = s.submit("q", None).unwrap();
        s.resolve(turn.id, "a".into()).unwrap();
        assert!(matches!(s.resolve(turn.id, "again".into()), Err(AdvisorError::UnknownTurn(_))));
        assert!(matches!(s.resolve(Uuid::new_v4(), "x".into()), Err(AdvisorError::UnknownTurn(_))));
    }

    #[test]
    fn image_only_turn_is_allowed() {
        let mut s = ChatSession::new();
        let turn = s.submit("", Some(photo())).unwrap();
        assert_eq!(turn.image_url.as_deref(), Some("data:image/jpeg;base64,AAAA"));
        assert_eq!(s.messages()[1].text, "");
        assert_eq!(s.messages()[1].image_url, turn.image_url);
    }

    #[test]
    fn empty_turn_is_refused() {
        let mut s = ChatSession::new();
        assert!(matches!(s.submit("   ", None), Err(AdvisorError::Validation(_))));
        assert!(!s.is_waiting());
    }
}
