use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use receptionist_core::intent::{match_keywords, Intent};

use crate::llm::LlmClient;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    ModelDisabled,
    Timeout,
    ModelError(String),
    UnrecognizedLabel(String),
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelDisabled => "model_disabled",
            Self::Timeout => "timeout",
            Self::ModelError(_) => "model_error",
            Self::UnrecognizedLabel(_) => "unrecognized_label",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassificationSource {
    Keyword,
    Model,
    Fallback(FallbackReason),
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Model => "model",
            Self::Fallback(_) => "fallback",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub source: ClassificationSource,
}

/// Never fails: every internal problem degrades to [`Intent::Unknown`] with a
/// [`ClassificationSource::Fallback`] describing why.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, utterance: &str) -> Classification;
}

pub struct KeywordFirstClassifier {
    llm: Option<Arc<dyn LlmClient>>,
    timeout: Duration,
}

impl KeywordFirstClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm: Some(llm), timeout }
    }

    /// Utterances that miss every keyword classify as `unknown` without any
    /// external call.
    pub fn keyword_only() -> Self {
        Self { llm: None, timeout: Duration::ZERO }
    }

    async fn classify_with_model(&self, utterance: &str) -> Classification {
        let Some(llm) = self.llm.as_ref() else {
            return fallback(FallbackReason::ModelDisabled);
        };

        let prompt = classification_prompt(utterance);
        match tokio::time::timeout(self.timeout, llm.complete(&prompt)).await {
            Err(_) => fallback(FallbackReason::Timeout),
            Ok(Err(error)) => fallback(FallbackReason::ModelError(error.to_string())),
            Ok(Ok(reply)) => match Intent::from_label(&reply) {
                Some(intent) => Classification { intent, source: ClassificationSource::Model },
                None => fallback(FallbackReason::UnrecognizedLabel(reply.trim().to_string())),
            },
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordFirstClassifier {
    async fn classify(&self, utterance: &str) -> Classification {
        if let Some(intent) = match_keywords(utterance) {
            return Classification { intent, source: ClassificationSource::Keyword };
        }
        self.classify_with_model(utterance).await
    }
}

fn fallback(reason: FallbackReason) -> Classification {
    Classification { intent: Intent::Unknown, source: ClassificationSource::Fallback(reason) }
}

pub fn classification_prompt(utterance: &str) -> String {
    format!(
        "You are an intent classifier for the Ascent Administrative Services phone system.\n\
         \n\
         Classify the following caller statement into EXACTLY ONE category:\n\
         - \"claims\" - anything about filing claims, claim status, adjusters, accidents, \
         losses, rentals, payments, denials\n\
         - \"onboarding\" - anything about agent support, dealer support, contracting, \
         appointments, becoming an agent/dealer, portals, logins, commissions, training\n\
         - \"unknown\" - unclear or doesn't fit above categories\n\
         \n\
         Caller said: \"{utterance}\"\n\
         \n\
         Respond with ONLY the category name, nothing else."
    )
}
