use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use receptionist_agent::classifier::KeywordFirstClassifier;
use receptionist_agent::llm::{HttpLlmClient, LlmError};
use receptionist_agent::runtime::ReceptionistRuntime;
use receptionist_core::audit::{AuditSink, TracingAuditSink};
use receptionist_core::config::{AppConfig, ConfigError, LoadOptions};
use receptionist_core::dialog::DialogEngine;
use receptionist_core::signature::SignatureVerifier;
use receptionist_core::turn::EnvelopeSettings;
use thiserror::Error;
use tracing::{info, warn};

use crate::{health, twiml, voice};

pub struct Application {
    pub config: AppConfig,
    pub voice_state: voice::VoiceState,
}

impl Application {
    pub fn router(&self) -> Router {
        voice::router(self.voice_state.clone()).merge(health::router())
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("classifier client could not be built: {0}")]
    Classifier(#[source] LlmError),
    #[error("response templates failed to load: {0}")]
    Templates(#[source] tera::Error),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_provider = config.llm.provider.as_str(),
        "starting application bootstrap"
    );

    let llm = HttpLlmClient::from_config(&config.llm).map_err(BootstrapError::Classifier)?;
    let classifier =
        KeywordFirstClassifier::new(Arc::new(llm), Duration::from_secs(config.llm.timeout_secs));
    let sink: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let runtime =
        ReceptionistRuntime::new(Arc::new(classifier), DialogEngine::default(), sink.clone());

    let verifier = SignatureVerifier::from_config(&config.telephony).map(Arc::new);
    if verifier.is_none() {
        warn!(
            event_name = "system.bootstrap.signatures_disabled",
            correlation_id = "bootstrap",
            "webhook signature validation is disabled; use only for local development"
        );
    }

    let templates = twiml::init_templates().map_err(BootstrapError::Templates)?;
    info!(
        event_name = "system.bootstrap.templates_loaded",
        correlation_id = "bootstrap",
        template = twiml::RESPONSE_TEMPLATE,
        "response templates loaded"
    );

    let voice_state = voice::VoiceState {
        runtime,
        verifier,
        settings: Arc::new(EnvelopeSettings::from(&config.telephony)),
        templates,
        sink,
    };

    Ok(Application { config, voice_state })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use receptionist_core::config::{ConfigOverrides, LlmProvider, LoadOptions};
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap, BootstrapError};

    fn overrides(overrides: ConfigOverrides) -> LoadOptions {
        LoadOptions { overrides, ..LoadOptions::default() }
    }

    #[test]
    fn bootstrap_fails_fast_without_signing_secret() {
        let result = bootstrap(overrides(ConfigOverrides {
            llm_provider: Some(LlmProvider::Ollama),
            telephony_public_base_url: Some("https://voice.example.com".to_string()),
            telephony_auth_token: Some(String::new()),
            ..ConfigOverrides::default()
        }));

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("telephony.auth_token"), "{message}");
    }

    #[test]
    fn bootstrap_reports_config_errors_as_config_variant() {
        let result = bootstrap(overrides(ConfigOverrides {
            llm_provider: Some(LlmProvider::Anthropic),
            llm_api_key: Some(String::new()),
            validate_signatures: Some(false),
            ..ConfigOverrides::default()
        }));

        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[tokio::test]
    async fn bootstrapped_router_serves_health_and_voice() {
        let app = bootstrap(overrides(ConfigOverrides {
            llm_provider: Some(LlmProvider::Ollama),
            validate_signatures: Some(false),
            ..ConfigOverrides::default()
        }))
        .expect("bootstrap with signatures disabled");
        let router = app.router();

        let health = router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health response");
        assert_eq!(health.status(), StatusCode::OK);

        let voice = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/voice")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("CallSid=CA9&SpeechResult=I+am+a+new+dealer"))
                    .expect("request"),
            )
            .await
            .expect("voice response");
        assert_eq!(voice.status(), StatusCode::OK);
        let body = to_bytes(voice.into_body(), usize::MAX).await.expect("body");
        let xml = String::from_utf8(body.to_vec()).expect("utf8");
        assert!(xml.contains("<Hangup/>"));
    }
}
