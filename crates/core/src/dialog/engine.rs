use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::dialog::states::{Action, CallerInput, DialogState, Disposition, TurnOutcome};
use crate::intent::{signals_confirmation, signals_help_request, Intent};
use crate::prompts;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptCatalog {
    pub greeting: String,
    pub claims_self_service: String,
    pub closing: String,
    pub claims_transfer: String,
    pub onboarding_transfer: String,
    pub reception_transfer: String,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            greeting: prompts::GREETING.to_string(),
            claims_self_service: prompts::CLAIMS_SELF_SERVICE.to_string(),
            closing: prompts::CLOSING.to_string(),
            claims_transfer: prompts::CLAIMS_TRANSFER.to_string(),
            onboarding_transfer: prompts::ONBOARDING_TRANSFER.to_string(),
            reception_transfer: prompts::RECEPTION_TRANSFER.to_string(),
        }
    }
}

/// Two-level receptionist dialog. Every method is pure; observability lives in
/// [`DialogEngine::apply_with_audit`].
#[derive(Clone, Debug, Default)]
pub struct DialogEngine {
    prompts: PromptCatalog,
}

impl DialogEngine {
    pub fn new(prompts: PromptCatalog) -> Self {
        Self { prompts }
    }

    pub fn prompts(&self) -> &PromptCatalog {
        &self.prompts
    }

    /// The caller said nothing and pressed nothing.
    pub fn on_silence(&self, state: DialogState) -> Action {
        match state {
            DialogState::Start => {
                self.listen(&self.prompts.greeting, DialogState::Start, Disposition::Greeting)
            }
            DialogState::ClaimsOffered => self.offer_claims_self_service(),
        }
    }

    pub fn next_action(&self, intent: Intent, utterance: &str, state: DialogState) -> Action {
        match intent {
            Intent::Claims => {
                if state == DialogState::ClaimsOffered {
                    if signals_confirmation(utterance) {
                        return self.terminate(&self.prompts.closing, Disposition::Closing);
                    }
                    if signals_help_request(utterance) {
                        return self
                            .terminate(&self.prompts.claims_transfer, Disposition::ClaimsTransfer);
                    }
                }
                self.offer_claims_self_service()
            }
            Intent::Onboarding => {
                self.terminate(&self.prompts.onboarding_transfer, Disposition::OnboardingTransfer)
            }
            Intent::Unknown => {
                self.terminate(&self.prompts.reception_transfer, Disposition::ReceptionTransfer)
            }
        }
    }

    /// `intent` is only consulted for spoken input; blank input never reaches
    /// the classifier and routes as `unknown`.
    pub fn apply(
        &self,
        state: DialogState,
        input: &CallerInput,
        intent: Option<Intent>,
    ) -> TurnOutcome {
        let (intent, action) = match input {
            CallerInput::Silence => (None, self.on_silence(state)),
            CallerInput::Blank => {
                (Some(Intent::Unknown), self.next_action(Intent::Unknown, "", state))
            }
            CallerInput::Spoken(utterance) => {
                let intent = intent.unwrap_or(Intent::Unknown);
                (Some(intent), self.next_action(intent, utterance, state))
            }
        };
        TurnOutcome { from: state, intent, action }
    }

    pub fn apply_with_audit<S>(
        &self,
        state: DialogState,
        input: &CallerInput,
        intent: Option<Intent>,
        sink: &S,
        audit: &AuditContext,
    ) -> TurnOutcome
    where
        S: AuditSink + ?Sized,
    {
        let outcome = self.apply(state, input, intent);
        let mut event = audit
            .event("dialog.action_selected", AuditCategory::Dialog, AuditOutcome::Success)
            .with_metadata("from", format!("{:?}", outcome.from))
            .with_metadata("disposition", outcome.action.disposition().as_str())
            .with_metadata("listen_next", outcome.action.listens().to_string());
        if let Some(intent) = outcome.intent {
            event = event.with_metadata("intent", intent.as_str());
        }
        if let Some(token) = outcome.action.next_context_token() {
            event = event.with_metadata("next_context_token", token);
        }
        sink.emit(event);
        outcome
    }

    fn offer_claims_self_service(&self) -> Action {
        self.listen(
            &self.prompts.claims_self_service,
            DialogState::ClaimsOffered,
            Disposition::ClaimsSelfService,
        )
    }

    fn listen(&self, text: &str, next_state: DialogState, disposition: Disposition) -> Action {
        Action::Prompt { text: text.to_string(), listen_next: true, next_state, disposition }
    }

    fn terminate(&self, text: &str, disposition: Disposition) -> Action {
        Action::Terminate { text: text.to_string(), disposition }
    }
}
