use anyhow::Result;

use crate::errors::AdvisorError;
use crate::log::ExchangeRecorder;
use crate::normalize;
use crate::profile::FarmProfile;
use crate::prompt;
use crate::provider::DynProvider;
use crate::store::DynStore;
use crate::wire::CropSuggestion;

pub const SUGGESTIONS_FAILED: &str = "Failed to get crop suggestions. Please try again later.";

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Success(Vec<CropSuggestion>),
    Error(String),
}

/// Lifecycle of one suggestions request:
/// `Idle -> Loading -> Success | Error`, and `Error -> Loading` on retry.
#[derive(Debug)]
pub struct SuggestionsFetch {
    state: FetchState,
}

impl Default for SuggestionsFetch {
    fn default() -> Self {
        Self { state: FetchState::Idle }
    }
}

impl SuggestionsFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn begin(&mut self) -> Result<(), AdvisorError> {
        if self.state == FetchState::Loading {
            return Err(AdvisorError::FetchInFlight);
        }
        self.state = FetchState::Loading;
        Ok(())
    }

    pub fn finish(&mut self, result: Result<Vec<CropSuggestion>>) {
        self.state = match result {
            Ok(list) => FetchState::Success(list),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "error fetching suggestions");
                match e.downcast_ref::<AdvisorError>() {
                    Some(known) => FetchState::Error(known.to_string()),
                    None => FetchState::Error(SUGGESTIONS_FAILED.to_string()),
                }
            }
        };
    }
}

/// Profile store, prompt builder, gateway and normalizer wired together.
pub struct Advisor {
    provider: DynProvider,
    store: DynStore,
    recorder: Option<ExchangeRecorder>,
}

impl Advisor {
    pub fn new(provider: DynProvider, store: DynStore) -> Self {
        Self { provider, store, recorder: None }
    }

    pub fn with_recorder(mut self, recorder: ExchangeRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn save_profile(&self, profile: &FarmProfile) -> Result<()> {
        self.store.set(profile)
    }

    pub fn profile(&self) -> Result<Option<FarmProfile>> {
        self.store.get()
    }

    /// The stored profile, only if it is complete enough to personalize.
    pub fn personal_profile(&self) -> Result<Option<FarmProfile>> {
        Ok(self.store.get()?.filter(FarmProfile::is_complete))
    }

    /// Gateway failures are returned; malformed replies are not (the
    /// normalizer substitutes its fallback).
    pub async fn suggestions(&self) -> Result<Vec<CropSuggestion>> {
        let profile = self.personal_profile()?.ok_or(AdvisorError::MissingProfile)?;
        let prompt = prompt::build_suggestion_prompt(&profile);
        let raw = self.call("suggest", &prompt).await?;
        Ok(normalize::normalize_suggestions(&raw))
    }

    /// Drive `fetch` through one request cycle.
    pub async fn fetch_suggestions(&self, fetch: &mut SuggestionsFetch) -> Result<(), AdvisorError> {
        fetch.begin()?;
        let result = self.suggestions().await;
        fetch.finish(result);
        Ok(())
    }

    /// Never fails: provider errors become the apology message. Without a
    /// usable profile the advice is generic.
    pub async fn chat_reply(&self, question: &str, image_ref: Option<&str>) -> String {
        let profile = self.personal_profile().unwrap_or_else(|e| {
            tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable farm profile for chat");
            None
        });
        let prompt = prompt::build_chat_prompt(question, profile.as_ref(), image_ref);
        normalize::normalize_chat(self.call("chat", &prompt).await)
    }

    async fn call(&self, stage: &str, prompt: &str) -> Result<String> {
        tracing::info!(provider = self.provider.name(), stage, "requesting model");
        let result = self.provider.generate(prompt).await;

        if let Some(rec) = &self.recorder {
            let reply = match &result {
                Ok(text) => Ok(text.as_str()),
                Err(e) => Err(format!("{e:#}")),
            };
            if let Err(e) = rec.save(stage, prompt, reply) {
                tracing::warn!(error = %e, "could not save exchange");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{CHAT_APOLOGY, FALLBACK_NAME};
    use crate::profile::{SoilType, WaterAvailability};
    use crate::provider::Provider;
    use crate::store::{MemoryProfileStore, ProfileStore};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Replays canned replies and remembers the prompts it saw.
    struct Scripted {
        replies: Mutex<Vec<Result<String, String>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&str, &str>>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let prompts = Arc::new(Mutex::new(Vec::new()));
            let mut replies: Vec<Result<String, String>> = replies
                .into_iter()
                .map(|r| r.map(str::to_string).map_err(str::to_string))
                .collect();
            replies.reverse();
            (Self { replies: Mutex::new(replies), prompts: prompts.clone() }, prompts)
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            match self.replies.lock().pop() {
                Some(Ok(text)) => Ok(text),
                Some(Err(e)) => Err(anyhow!(e)),
                None => Err(anyhow!("no scripted reply left")),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn profile() -> FarmProfile {
        FarmProfile {
            soil_type: SoilType::Clay,
            land_size: 5.0,
            location: "Mandya, Karnataka".into(),
            water_availability: WaterAvailability::Abundant,
            previous_crops: "sugarcane".into(),
            issues: None,
        }
    }

    fn advisor(replies: Vec<Result<&str, &str>>, with_profile: bool) -> (Advisor, Arc<Mutex<Vec<String>>>) {
        let (provider, prompts) = Scripted::new(replies);
        let store = MemoryProfileStore::new();
        if with_profile {
            store.set(&profile()).unwrap();
        }
        (Advisor::new(Box::new(provider), Box::new(store)), prompts)
    }

    #[tokio::test]
    async fn suggestions_need_a_profile() {
        let (adv, prompts) = advisor(vec![Ok("[]")], false);
        let err = adv.suggestions().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<AdvisorError>(), Some(AdvisorError::MissingProfile)));
        assert!(prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn suggestions_are_normalized() {
        let (adv, prompts) = advisor(vec![Ok(r#"[{"name":"Ragi","confidence":"85"}]"#)], true);
        let list = adv.suggestions().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Ragi");
        assert_eq!(list[0].confidence, 85);
        assert!(prompts.lock()[0].contains("Mandya, Karnataka"));
    }

    #[tokio::test]
    async fn malformed_reply_is_not_an_error() {
        let (adv, _) = advisor(vec![Ok("Sorry, I cannot help with that.")], true);
        let list = adv.suggestions().await.unwrap();
        assert_eq!(list[0].name, FALLBACK_NAME);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_on_suggestions() {
        let (adv, _) = advisor(vec![Err("connection refused")], true);
        assert!(adv.suggestions().await.is_err());
    }

    #[tokio::test]
    async fn fetch_moves_through_states_and_retries() {
        let (adv, _) = advisor(vec![Err("503"), Ok(r#"[{"name":"Jowar"}]"#)], true);
        let mut fetch = SuggestionsFetch::new();
        assert_eq!(fetch.state(), &FetchState::Idle);

        adv.fetch_suggestions(&mut fetch).await.unwrap();
        assert_eq!(fetch.state(), &FetchState::Error(SUGGESTIONS_FAILED.into()));

        adv.fetch_suggestions(&mut fetch).await.unwrap();
        match fetch.state() {
            FetchState::Success(list) => assert_eq!(list[0].name, "Jowar"),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn begin_twice_is_refused() {
        let mut fetch = SuggestionsFetch::new();
        fetch.begin().unwrap();
        assert!(matches!(fetch.begin(), Err(AdvisorError::FetchInFlight)));
        fetch.finish(Err(anyhow!("boom")));
        assert!(fetch.begin().is_ok());
    }

    #[test]
    fn missing_profile_error_keeps_its_message() {
        let mut fetch = SuggestionsFetch::new();
        fetch.begin().unwrap();
        fetch.finish(Err(AdvisorError::MissingProfile.into()));
        assert_eq!(fetch.state(), &FetchState::Error(AdvisorError::MissingProfile.to_string()));
    }

    #[tokio::test]
    async fn chat_failure_is_swallowed() {
        let (adv, _) = advisor(vec![Err("quota exceeded")], true);
        assert_eq!(adv.chat_reply("Aphids on chilli?", None).await, CHAT_APOLOGY);
    }

    #[tokio::test]
    async fn chat_without_profile_is_generic() {
        let (adv, prompts) = advisor(vec![Ok("Use neem spray.")], false);
        assert_eq!(adv.chat_reply("Aphids on chilli?", None).await, "Use neem spray.");
        assert!(!prompts.lock()[0].contains("Farmer's details"));
    }

    #[tokio::test]
    async fn chat_with_profile_is_personal() {
        let (adv, prompts) = advisor(vec![Ok("ok")], true);
        adv.chat_reply("When to sow?", Some("data:image/png;base64,AA")).await;
        let sent = prompts.lock()[0].clone();
        assert!(sent.contains("Farmer's details"));
        assert!(sent.contains("Image URL: data:image/png;base64,AA"));
    }

    #[tokio::test]
    async fn exchanges_are_recorded() {
        let root = tempfile::tempdir().unwrap();
        let (adv, _) = advisor(vec![Ok("[]"), Err("down")], true);
        let adv = adv.with_recorder(ExchangeRecorder::new(root.path(), uuid::Uuid::new_v4()));

        adv.suggestions().await.unwrap();
        adv.chat_reply("hi", None).await;

        let dir = std::fs::read_dir(root.path().join("tx")).unwrap().next().unwrap().unwrap().path();
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["001-suggest.prompt.txt", "001-suggest.response.txt", "002-chat.error.txt", "002-chat.prompt.txt"]
        );
    }
}
