use std::sync::Arc;
use std::time::Duration;

use receptionist_agent::classifier::{IntentClassifier, KeywordFirstClassifier};
use receptionist_agent::llm::HttpLlmClient;
use receptionist_agent::runtime::ReceptionistRuntime;
use receptionist_core::audit::{AuditContext, InMemoryAuditSink};
use receptionist_core::config::{AppConfig, ConfigOverrides, LlmProvider, LoadOptions};
use receptionist_core::dialog::DialogEngine;
use receptionist_core::turn::{render_action, EnvelopeSettings, ResponseEnvelope, TurnInput};
use serde::Serialize;

use crate::commands::CommandResult;

const COMMAND: &str = "simulate";
const SIMULATED_CALL_SID: &str = "CA-simulated";

#[derive(Clone, Debug, Default)]
pub struct SimulateArgs {
    pub utterance: Option<String>,
    pub digits: Option<String>,
    pub context: Option<String>,
    pub live: bool,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    command: &'static str,
    status: &'static str,
    classifier: &'static str,
    from_state: String,
    intent: Option<&'static str>,
    disposition: &'static str,
    next_context_token: Option<&'static str>,
    envelope: ResponseEnvelope,
    audit_events: Vec<String>,
}

/// Runs one turn through the real runtime without a telephony platform.
/// Offline runs never call the model, so unmatched utterances route as `unknown`.
pub fn run(args: SimulateArgs) -> CommandResult {
    let mut overrides =
        ConfigOverrides { validate_signatures: Some(false), ..ConfigOverrides::default() };
    // Offline turns never reach a provider, so its credentials are not required.
    if !args.live {
        overrides.llm_provider = Some(LlmProvider::Ollama);
    }

    let config = match AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let classifier: Arc<dyn IntentClassifier> = if args.live {
        let llm = match HttpLlmClient::from_config(&config.llm) {
            Ok(llm) => llm,
            Err(error) => {
                return CommandResult::failure(COMMAND, "classifier_setup", error.to_string(), 3)
            }
        };
        let timeout = Duration::from_secs(config.llm.timeout_secs);
        Arc::new(KeywordFirstClassifier::new(Arc::new(llm), timeout))
    } else {
        Arc::new(KeywordFirstClassifier::keyword_only())
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                4,
            );
        }
    };

    let sink = Arc::new(InMemoryAuditSink::default());
    let receptionist = ReceptionistRuntime::new(classifier, DialogEngine::default(), sink.clone());
    let input = TurnInput {
        call_sid: Some(SIMULATED_CALL_SID.to_string()),
        caller: None,
        speech: args.utterance,
        digits: args.digits,
        context_token: args.context,
    };
    let audit = AuditContext::new(input.call_sid.clone(), "simulate", "cli-simulate");

    let outcome = runtime.block_on(receptionist.handle_turn(&input, &audit));
    let envelope = render_action(&outcome.action, &EnvelopeSettings::from(&config.telephony));

    let report = SimulationReport {
        command: COMMAND,
        status: "ok",
        classifier: if args.live { "keyword_then_model" } else { "keyword_only" },
        from_state: format!("{:?}", outcome.from),
        intent: outcome.intent.map(|intent| intent.as_str()),
        disposition: outcome.action.disposition().as_str(),
        next_context_token: outcome.action.next_context_token(),
        envelope,
        audit_events: sink.event_types(),
    };

    CommandResult::report(COMMAND, &report)
}
