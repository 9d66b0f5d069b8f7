use std::sync::Arc;

use receptionist_core::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use receptionist_core::dialog::{CallerInput, DialogEngine, DialogState, TurnOutcome};
use receptionist_core::turn::TurnInput;

use crate::classifier::{ClassificationSource, IntentClassifier};

/// Runs one telephony turn: recover the dialog state, classify spoken input,
/// and pick the next action. Holds no per-call state.
#[derive(Clone)]
pub struct ReceptionistRuntime {
    classifier: Arc<dyn IntentClassifier>,
    engine: DialogEngine,
    sink: Arc<dyn AuditSink>,
}

impl ReceptionistRuntime {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        engine: DialogEngine,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self { classifier, engine, sink }
    }

    pub async fn handle_turn(&self, input: &TurnInput, audit: &AuditContext) -> TurnOutcome {
        let state = self.recover_state(input, audit);
        let caller_input = input.caller_input();

        let intent = match &caller_input {
            CallerInput::Spoken(utterance) => {
                let classification = self.classifier.classify(utterance).await;
                let outcome = match classification.source {
                    ClassificationSource::Fallback(_) => AuditOutcome::Degraded,
                    _ => AuditOutcome::Success,
                };
                let mut event = audit
                    .event("intent.classified", AuditCategory::Classification, outcome)
                    .with_metadata("intent", classification.intent.as_str())
                    .with_metadata("source", classification.source.as_str());
                if let ClassificationSource::Fallback(reason) = &classification.source {
                    event = event.with_metadata("fallback_reason", reason.as_str());
                }
                self.sink.emit(event);
                Some(classification.intent)
            }
            CallerInput::Silence | CallerInput::Blank => None,
        };

        self.engine.apply_with_audit(state, &caller_input, intent, self.sink.as_ref(), audit)
    }

    fn recover_state(&self, input: &TurnInput, audit: &AuditContext) -> DialogState {
        match input.dialog_state() {
            Ok(state) => state,
            Err(unknown) => {
                self.sink.emit(
                    audit
                        .event(
                            "dialog.unknown_context_token",
                            AuditCategory::Dialog,
                            AuditOutcome::Degraded,
                        )
                        .with_metadata("token", unknown.0),
                );
                DialogState::Start
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use receptionist_core::audit::{AuditContext, InMemoryAuditSink};
    use receptionist_core::dialog::{DialogEngine, DialogState, Disposition};
    use receptionist_core::intent::Intent;
    use receptionist_core::turn::TurnInput;

    use super::ReceptionistRuntime;
    use crate::classifier::{
        Classification, ClassificationSource, IntentClassifier, KeywordFirstClassifier,
    };

    struct FixedClassifier {
        intent: Intent,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IntentClassifier for FixedClassifier {
        async fn classify(&self, _utterance: &str) -> Classification {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Classification { intent: self.intent, source: ClassificationSource::Model }
        }
    }

    type Harness = (ReceptionistRuntime, Arc<FixedClassifier>, Arc<InMemoryAuditSink>);

    fn runtime(intent: Intent) -> Harness {
        let classifier = Arc::new(FixedClassifier { intent, calls: AtomicUsize::new(0) });
        let sink = Arc::new(InMemoryAuditSink::default());
        let runtime =
            ReceptionistRuntime::new(classifier.clone(), DialogEngine::default(), sink.clone());
        (runtime, classifier, sink)
    }

    fn audit() -> AuditContext {
        AuditContext::new(Some("CA7".to_owned()), "req-7", "voice-webhook")
    }

    fn spoken(text: &str, context: Option<&str>) -> TurnInput {
        TurnInput {
            speech: Some(text.to_string()),
            context_token: context.map(str::to_string),
            ..TurnInput::default()
        }
    }

    #[tokio::test]
    async fn spoken_turn_is_classified_then_routed() {
        let (runtime, classifier, sink) = runtime(Intent::Onboarding);
        let outcome = runtime.handle_turn(&spoken("new here", None), &audit()).await;

        assert_eq!(outcome.intent, Some(Intent::Onboarding));
        assert_eq!(outcome.action.disposition(), Disposition::OnboardingTransfer);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.event_types(), vec!["intent.classified", "dialog.action_selected"]);
    }

    #[tokio::test]
    async fn silence_and_blank_turns_skip_the_classifier() {
        let (runtime, classifier, _sink) = runtime(Intent::Claims);

        let silence = runtime.handle_turn(&TurnInput::default(), &audit()).await;
        assert_eq!(silence.action.disposition(), Disposition::Greeting);

        let blank = runtime.handle_turn(&spoken("   ", None), &audit()).await;
        assert_eq!(blank.action.disposition(), Disposition::ReceptionTransfer);

        let digits = TurnInput { digits: Some("4".to_string()), ..TurnInput::default() };
        let keyed = runtime.handle_turn(&digits, &audit()).await;
        assert_eq!(keyed.action.disposition(), Disposition::ReceptionTransfer);

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn context_token_carries_the_claims_follow_up() {
        let (runtime, _classifier, _sink) = runtime(Intent::Claims);
        let outcome = runtime
            .handle_turn(&spoken("yes, thank you", Some("claims_offered")), &audit())
            .await;

        assert_eq!(outcome.from, DialogState::ClaimsOffered);
        assert_eq!(outcome.action.disposition(), Disposition::Closing);
    }

    #[tokio::test]
    async fn keyword_only_follow_up_needs_a_claims_keyword_to_close() {
        let sink = Arc::new(InMemoryAuditSink::default());
        let runtime = ReceptionistRuntime::new(
            Arc::new(KeywordFirstClassifier::keyword_only()),
            DialogEngine::default(),
            sink.clone(),
        );

        let bare = runtime
            .handle_turn(&spoken("yes, thank you", Some("claims_offered")), &audit())
            .await;
        assert_eq!(bare.intent, Some(Intent::Unknown));
        assert_eq!(bare.action.disposition(), Disposition::ReceptionTransfer);

        let follow_up = spoken("yes, my claim is sorted, thank you", Some("claims_offered"));
        let with_keyword = runtime.handle_turn(&follow_up, &audit()).await;
        assert_eq!(with_keyword.intent, Some(Intent::Claims));
        assert_eq!(with_keyword.action.disposition(), Disposition::Closing);
    }

    #[tokio::test]
    async fn unknown_context_token_falls_back_to_start_with_warning() {
        let (runtime, _classifier, sink) = runtime(Intent::Claims);
        let outcome = runtime.handle_turn(&spoken("claim", Some("bogus")), &audit()).await;

        assert_eq!(outcome.from, DialogState::Start);
        assert_eq!(outcome.action.disposition(), Disposition::ClaimsSelfService);

        let events = sink.events();
        assert_eq!(events[0].event_type, "dialog.unknown_context_token");
        assert_eq!(events[0].metadata.get("token").map(String::as_str), Some("bogus"));
    }
}
