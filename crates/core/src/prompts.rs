//! Caller-facing copy. These strings are spoken verbatim by the telephony
//! platform; change them only with product sign-off.

pub const GREETING: &str = "Thank you for calling Ascent Administrative Services. How can I help you today? You can say things like, I have a question about a claim, or, I need agent or dealer support.";

pub const CLAIMS_SELF_SERVICE: &str = "For claims, you can file a new claim, upload documents, and check the status of an existing claim at any time on the claims page of our website. Did that answer your question, or would you like to speak with a claims representative?";

pub const CLOSING: &str =
    "Great, I'm glad I could help. Thank you for calling Ascent Administrative Services. Goodbye.";

pub const CLAIMS_TRANSFER: &str =
    "No problem. Please hold while I transfer you to a member of our claims team.";

pub const ONBOARDING_TRANSFER: &str =
    "Thank you. Please hold while I transfer you to our agent and dealer support team.";

pub const RECEPTION_TRANSFER: &str =
    "Thank you. Please hold while I transfer you to our reception desk.";
