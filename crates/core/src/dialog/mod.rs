pub mod engine;
pub mod states;

pub use engine::{DialogEngine, PromptCatalog};
pub use states::{
    Action, CallerInput, DialogState, Disposition, TurnOutcome, UnknownContextToken,
    CLAIMS_OFFERED_TOKEN,
};
