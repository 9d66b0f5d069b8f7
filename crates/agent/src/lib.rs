//! Agent runtime: intent classification and per-turn orchestration.
//!
//! - `llm` - pluggable text completion (`LlmClient`) with an HTTP client for
//!   Anthropic, OpenAI and Ollama request shapes
//! - `classifier` - keyword-first `IntentClassifier`; the model is consulted
//!   only when no keyword matches, under a bounded timeout
//! - `runtime` - `ReceptionistRuntime`, which recovers the dialog state from
//!   the context token, classifies spoken input and asks the dialog engine for
//!   the next action
//!
//! # Safety Principle
//!
//! The model only labels an utterance. It never chooses what the caller hears
//! next; routing is decided by the deterministic dialog engine in core.

pub mod classifier;
pub mod llm;
pub mod runtime;

pub use classifier::{
    Classification, ClassificationSource, IntentClassifier, KeywordFirstClassifier,
};
pub use llm::{HttpLlmClient, LlmClient, LlmError};
pub use runtime::ReceptionistRuntime;
