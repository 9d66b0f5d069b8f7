//! Telephony webhook: one POST per caller turn.

use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use receptionist_agent::runtime::ReceptionistRuntime;
use receptionist_core::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use receptionist_core::errors::ApplicationError;
use receptionist_core::signature::{SignatureVerifier, SIGNATURE_HEADER};
use receptionist_core::turn::{render_action, EnvelopeSettings, TurnInput};
use serde::Deserialize;
use tera::Tera;
use tracing::{error, info};
use uuid::Uuid;

use crate::twiml;

pub const XML_CONTENT_TYPE: &str = "text/xml";
pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct VoiceState {
    pub runtime: ReceptionistRuntime,
    pub verifier: Option<Arc<SignatureVerifier>>,
    pub settings: Arc<EnvelopeSettings>,
    pub templates: Arc<Tera>,
    pub sink: Arc<dyn AuditSink>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContextQuery {
    pub context: Option<String>,
}

pub fn router(state: VoiceState) -> Router {
    let route = route_path(&state.settings.webhook_path).to_string();
    Router::new().route(&route, post(voice_webhook)).with_state(state)
}

fn route_path(webhook_path: &str) -> &str {
    webhook_path.split('?').next().unwrap_or(webhook_path)
}

pub async fn voice_webhook(
    State(state): State<VoiceState>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<ContextQuery>,
    Form(params): Form<Vec<(String, String)>>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let input = TurnInput::from_webhook(&params, query.context.as_deref());
    let audit = AuditContext::new(input.call_sid.clone(), correlation_id.as_str(), "voice-webhook");

    if let Some(verifier) = state.verifier.as_deref() {
        let path_and_query = uri.path_and_query().map(|value| value.as_str()).unwrap_or("/");
        let provided = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
        if let Err(rejection) = verifier.verify(path_and_query, &params, provided) {
            let event = audit.event(
                "voice.signature_rejected",
                AuditCategory::Ingress,
                AuditOutcome::Rejected,
            );
            state.sink.emit(event.with_metadata("reason", rejection.to_string()));
            let interface = ApplicationError::from(rejection).into_interface(correlation_id);
            let status =
                StatusCode::from_u16(interface.status_code()).unwrap_or(StatusCode::FORBIDDEN);
            return (
                status,
                [(CORRELATION_HEADER, interface.correlation_id().to_string())],
                interface.user_message(),
            )
                .into_response();
        }
    }

    info!(
        event_name = "voice.turn_received",
        correlation_id = %correlation_id,
        call_sid = input.call_sid.as_deref().unwrap_or("unknown"),
        has_speech = input.speech.is_some(),
        has_digits = input.digits.is_some(),
        context = input.context_token.as_deref().unwrap_or("none"),
        "voice turn received"
    );

    let outcome = state.runtime.handle_turn(&input, &audit).await;
    let envelope = render_action(&outcome.action, &state.settings);

    let body = match twiml::render(&state.templates, &envelope) {
        Ok(body) => body,
        Err(rendering) => {
            error!(
                event_name = "voice.render_failed",
                correlation_id = %correlation_id,
                call_sid = input.call_sid.as_deref().unwrap_or("unknown"),
                error = %rendering,
                "falling back to reception transfer document"
            );
            state.sink.emit(
                audit
                    .event("voice.render_failed", AuditCategory::System, AuditOutcome::Failed)
                    .with_metadata("error", rendering.to_string()),
            );
            twiml::fallback_document(&state.settings)
        }
    };

    (StatusCode::OK, [(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response()
}
