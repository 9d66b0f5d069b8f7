use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::intent::Intent;

pub const CLAIMS_OFFERED_TOKEN: &str = "claims_offered";

/// Where the call is in the receptionist dialog. The transport only ever sees
/// the serialized context token, never this type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Start,
    ClaimsOffered,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unrecognised context token `{0}`")]
pub struct UnknownContextToken(pub String);

impl DialogState {
    /// Blank and absent tokens both mean `Start`.
    pub fn from_token(token: Option<&str>) -> Result<Self, UnknownContextToken> {
        match token.map(str::trim) {
            None | Some("") => Ok(Self::Start),
            Some(CLAIMS_OFFERED_TOKEN) => Ok(Self::ClaimsOffered),
            Some(other) => Err(UnknownContextToken(other.to_string())),
        }
    }

    pub fn token(self) -> Option<&'static str> {
        match self {
            Self::Start => None,
            Self::ClaimsOffered => Some(CLAIMS_OFFERED_TOKEN),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Greeting,
    ClaimsSelfService,
    Closing,
    ClaimsTransfer,
    OnboardingTransfer,
    ReceptionTransfer,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::ClaimsSelfService => "claims_self_service",
            Self::Closing => "closing",
            Self::ClaimsTransfer => "claims_transfer",
            Self::OnboardingTransfer => "onboarding_transfer",
            Self::ReceptionTransfer => "reception_transfer",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Prompt { text: String, listen_next: bool, next_state: DialogState, disposition: Disposition },
    Terminate { text: String, disposition: Disposition },
}

impl Action {
    pub fn text(&self) -> &str {
        match self {
            Self::Prompt { text, .. } | Self::Terminate { text, .. } => text,
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Prompt { disposition, .. } | Self::Terminate { disposition, .. } => *disposition,
        }
    }

    pub fn listens(&self) -> bool {
        matches!(self, Self::Prompt { listen_next: true, .. })
    }

    /// State to round-trip to the next turn; `None` once the call is ending.
    pub fn next_state(&self) -> Option<DialogState> {
        match self {
            Self::Prompt { listen_next: true, next_state, .. } => Some(*next_state),
            _ => None,
        }
    }

    pub fn next_context_token(&self) -> Option<&'static str> {
        self.next_state().and_then(DialogState::token)
    }
}

/// What the caller supplied on this turn, before classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallerInput {
    /// No speech and no keypad input.
    Silence,
    /// A speech or keypad field was present but carried no words.
    Blank,
    Spoken(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub from: DialogState,
    pub intent: Option<Intent>,
    pub action: Action,
}
