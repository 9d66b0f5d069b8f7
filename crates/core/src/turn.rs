//! Translation between the telephony webhook and the dialog engine.
//!
//! Inbound: form fields (`SpeechResult`, `Digits`, `CallSid`, `From`) plus the
//! round-tripped `context` query parameter become a [`TurnInput`]. Outbound: an
//! [`Action`] becomes a [`ResponseEnvelope`] of telephony directives. No
//! routing decisions are made here.

use serde::{Deserialize, Serialize};

use crate::config::TelephonyConfig;
use crate::dialog::{Action, CallerInput, DialogState, UnknownContextToken};

pub const SPEECH_FIELD: &str = "SpeechResult";
pub const DIGITS_FIELD: &str = "Digits";
pub const CALL_SID_FIELD: &str = "CallSid";
pub const CALLER_FIELD: &str = "From";
pub const CONTEXT_QUERY_PARAM: &str = "context";

const TRANSFER_PAUSE_SECS: u32 = 1;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInput {
    pub call_sid: Option<String>,
    pub caller: Option<String>,
    pub speech: Option<String>,
    pub digits: Option<String>,
    pub context_token: Option<String>,
}

impl TurnInput {
    pub fn from_webhook(params: &[(String, String)], context_token: Option<&str>) -> Self {
        Self {
            call_sid: field(params, CALL_SID_FIELD).filter(|value| !value.trim().is_empty()),
            caller: field(params, CALLER_FIELD).filter(|value| !value.trim().is_empty()),
            speech: field(params, SPEECH_FIELD),
            digits: field(params, DIGITS_FIELD),
            context_token: context_token.map(str::to_string),
        }
    }

    /// A present speech field wins over keypad input. Keypad input without
    /// speech carries no words, so it counts as blank.
    pub fn caller_input(&self) -> CallerInput {
        match self.speech.as_deref() {
            Some(speech) if !speech.trim().is_empty() => CallerInput::Spoken(speech.to_string()),
            Some(_) => CallerInput::Blank,
            None => match self.digits.as_deref() {
                Some(digits) if !digits.trim().is_empty() => CallerInput::Blank,
                _ => CallerInput::Silence,
            },
        }
    }

    pub fn dialog_state(&self) -> Result<DialogState, UnknownContextToken> {
        DialogState::from_token(self.context_token.as_deref())
    }
}

fn field(params: &[(String, String)], name: &str) -> Option<String> {
    params.iter().find(|(key, _)| key == name).map(|(_, value)| value.clone())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum Directive {
    Say { text: String, voice: String },
    Pause { seconds: u32 },
    Gather { input: String, timeout_secs: u64, speech_timeout: String, action_url: String },
    Hangup,
}

impl Directive {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Gather { .. } | Self::Hangup)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub directives: Vec<Directive>,
}

impl ResponseEnvelope {
    pub fn terminal_directive(&self) -> Option<&Directive> {
        self.directives.iter().find(|directive| directive.is_terminal())
    }

    pub fn spoken_text(&self) -> Vec<&str> {
        self.directives
            .iter()
            .filter_map(|directive| match directive {
                Directive::Say { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvelopeSettings {
    pub voice: String,
    pub gather_timeout_secs: u64,
    pub webhook_path: String,
}

impl From<&TelephonyConfig> for EnvelopeSettings {
    fn from(config: &TelephonyConfig) -> Self {
        Self {
            voice: config.voice.clone(),
            gather_timeout_secs: config.gather_timeout_secs,
            webhook_path: config.webhook_path.clone(),
        }
    }
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            voice: "Polly.Joanna".to_string(),
            gather_timeout_secs: 5,
            webhook_path: "/voice".to_string(),
        }
    }
}

pub fn render_action(action: &Action, settings: &EnvelopeSettings) -> ResponseEnvelope {
    let say = Directive::Say { text: action.text().to_string(), voice: settings.voice.clone() };

    let directives = match action {
        Action::Prompt { listen_next: true, next_state, .. } => vec![
            say,
            Directive::Gather {
                input: "speech".to_string(),
                timeout_secs: settings.gather_timeout_secs,
                speech_timeout: "auto".to_string(),
                action_url: callback_url(&settings.webhook_path, next_state.token()),
            },
        ],
        Action::Prompt { listen_next: false, .. } => vec![say, Directive::Hangup],
        Action::Terminate { .. } => {
            vec![say, Directive::Pause { seconds: TRANSFER_PAUSE_SECS }, Directive::Hangup]
        }
    };

    ResponseEnvelope { directives }
}

pub fn callback_url(webhook_path: &str, context_token: Option<&str>) -> String {
    match context_token {
        Some(token) => {
            let separator = if webhook_path.contains('?') { '&' } else { '?' };
            format!("{webhook_path}{separator}{CONTEXT_QUERY_PARAM}={token}")
        }
        None => webhook_path.to_string(),
    }
}
