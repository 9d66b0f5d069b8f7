pub mod audit;
pub mod config;
pub mod dialog;
pub mod errors;
pub mod intent;
pub mod prompts;
pub mod signature;
pub mod turn;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use dialog::{Action, CallerInput, DialogEngine, DialogState, Disposition, TurnOutcome};
pub use errors::{ApplicationError, InterfaceError};
pub use intent::Intent;
pub use signature::{SignatureError, SignatureVerifier};
pub use turn::{Directive, EnvelopeSettings, ResponseEnvelope, TurnInput};
