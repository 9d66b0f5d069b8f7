//! Caller intent labels and the deterministic keyword matcher.
//!
//! Matching is a case-insensitive substring search over the whole utterance,
//! so a keyword also matches inside longer words (`"contract"` inside
//! `"subcontractor"`, `"ok"` inside `"broken"`). Callers rely on that
//! behaviour; do not switch to word-boundary matching without a product call.

use serde::{Deserialize, Serialize};

pub const CLAIMS_KEYWORDS: &[&str] =
    &["claim", "accident", "loss", "adjuster", "rental", "payment", "denial"];

pub const ONBOARDING_KEYWORDS: &[&str] = &[
    "agent",
    "dealer",
    "onboard",
    "contract",
    "appointment",
    "portal",
    "login",
    "commission",
    "training",
];

/// Follow-up phrases meaning the self-service claims answer was enough.
pub const CONFIRMATION_KEYWORDS: &[&str] =
    &["yes", "all set", "that helps", "i'm good", "thank", "okay", "ok"];

/// Follow-up phrases asking for a human after the self-service claims answer.
pub const HELP_REQUEST_KEYWORDS: &[&str] =
    &["speak", "representative", "transfer", "person", "help", "talk"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Claims,
    Onboarding,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 3] = [Self::Claims, Self::Onboarding, Self::Unknown];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claims => "claims",
            Self::Onboarding => "onboarding",
            Self::Unknown => "unknown",
        }
    }

    /// Exact label lookup after trimming and lowercasing. Anything else is `None`.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "claims" => Some(Self::Claims),
            "onboarding" => Some(Self::Onboarding),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims keywords win over onboarding keywords. `None` means the utterance
/// needs the model fallback.
pub fn match_keywords(utterance: &str) -> Option<Intent> {
    let normalized = normalize_utterance(utterance);
    if contains_any(&normalized, CLAIMS_KEYWORDS) {
        return Some(Intent::Claims);
    }
    if contains_any(&normalized, ONBOARDING_KEYWORDS) {
        return Some(Intent::Onboarding);
    }
    None
}

pub fn signals_confirmation(utterance: &str) -> bool {
    contains_any(&normalize_utterance(utterance), CONFIRMATION_KEYWORDS)
}

pub fn signals_help_request(utterance: &str) -> bool {
    contains_any(&normalize_utterance(utterance), HELP_REQUEST_KEYWORDS)
}

/// Lowercases and folds typographic apostrophes so "I’m good" matches "i'm good".
pub fn normalize_utterance(utterance: &str) -> String {
    utterance.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

fn contains_any(normalized: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| normalized.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::{
        match_keywords, signals_confirmation, signals_help_request, Intent, CLAIMS_KEYWORDS,
        ONBOARDING_KEYWORDS,
    };

    #[test]
    fn every_claims_keyword_resolves_to_claims() {
        for keyword in CLAIMS_KEYWORDS {
            let utterance = format!("I have a question about my {}", keyword.to_uppercase());
            assert_eq!(match_keywords(&utterance), Some(Intent::Claims), "keyword `{keyword}`");
        }
    }

    #[test]
    fn every_onboarding_keyword_resolves_to_onboarding() {
        for keyword in ONBOARDING_KEYWORDS {
            let utterance = format!("calling about {keyword} stuff");
            assert_eq!(
                match_keywords(&utterance),
                Some(Intent::Onboarding),
                "keyword `{keyword}`"
            );
        }
    }

    #[test]
    fn claims_keywords_take_priority_over_onboarding_keywords() {
        assert_eq!(
            match_keywords("I'm a dealer calling about a customer's claim"),
            Some(Intent::Claims)
        );
    }

    #[test]
    fn substring_matches_inside_longer_words_are_accepted() {
        assert_eq!(match_keywords("I'm a subcontractor"), Some(Intent::Onboarding));
        assert_eq!(match_keywords("my reclaimed deposit"), Some(Intent::Claims));
    }

    #[test]
    fn unmatched_utterance_needs_fallback() {
        assert_eq!(match_keywords("what are your office hours"), None);
        assert_eq!(match_keywords(""), None);
    }

    #[test]
    fn labels_are_parsed_after_trim_and_lowercase_only() {
        assert_eq!(Intent::from_label("  Claims\n"), Some(Intent::Claims));
        assert_eq!(Intent::from_label("ONBOARDING"), Some(Intent::Onboarding));
        assert_eq!(Intent::from_label("unknown"), Some(Intent::Unknown));
        assert_eq!(Intent::from_label("claims."), None);
        assert_eq!(Intent::from_label("the category is claims"), None);
    }

    #[test]
    fn follow_up_signals_normalize_typographic_apostrophes() {
        assert!(signals_confirmation("I\u{2019}m good now"));
        assert!(signals_confirmation("OK great"));
        assert!(signals_help_request("can I talk to someone"));
        assert!(!signals_help_request("no"));
    }

    #[test]
    fn intent_serializes_to_its_label() {
        for intent in Intent::ALL {
            let json = serde_json::to_string(&intent).expect("serialize intent");
            assert_eq!(json, format!("\"{}\"", intent.as_str()));
        }
    }
}
