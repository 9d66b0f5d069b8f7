//! Telephony webhook request signing.
//!
//! Signature = base64(HMAC-SHA1(auth_token, url ++ sorted(name ++ value)...)),
//! where `url` is the full public URL the platform requested (including any
//! query string) and the POST parameters are sorted by name, then value.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use thiserror::Error;

use crate::config::TelephonyConfig;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("request signature header is missing")]
    Missing,
    #[error("request signature header is not valid base64")]
    Malformed,
    #[error("request signature does not match")]
    Mismatch,
    #[error("signing key is unusable")]
    InvalidKey,
}

#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    auth_token: SecretString,
    public_base_url: String,
}

impl SignatureVerifier {
    pub fn new(auth_token: SecretString, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self { auth_token, public_base_url }
    }

    /// `None` when signature validation is switched off.
    pub fn from_config(config: &TelephonyConfig) -> Option<Self> {
        if !config.validate_signatures {
            return None;
        }
        let base_url = config.public_base_url.as_deref()?;
        Some(Self::new(config.auth_token.clone(), base_url))
    }

    pub fn request_url(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{path_and_query}", self.public_base_url)
        } else {
            format!("{}/{path_and_query}", self.public_base_url)
        }
    }

    pub fn sign(
        &self,
        path_and_query: &str,
        params: &[(String, String)],
    ) -> Result<String, SignatureError> {
        let mac = self.mac_for(&self.request_url(path_and_query), params)?;
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    pub fn verify(
        &self,
        path_and_query: &str,
        params: &[(String, String)],
        provided: Option<&str>,
    ) -> Result<(), SignatureError> {
        let provided = provided.map(str::trim).filter(|value| !value.is_empty());
        let Some(provided) = provided else {
            return Err(SignatureError::Missing);
        };
        let decoded = STANDARD.decode(provided).map_err(|_| SignatureError::Malformed)?;

        let mac = self.mac_for(&self.request_url(path_and_query), params)?;
        mac.verify_slice(&decoded).map_err(|_| SignatureError::Mismatch)
    }

    fn mac_for(&self, url: &str, params: &[(String, String)]) -> Result<HmacSha1, SignatureError> {
        let mut mac = HmacSha1::new_from_slice(self.auth_token.expose_secret().as_bytes())
            .map_err(|_| SignatureError::InvalidKey)?;
        mac.update(signing_payload(url, params).as_bytes());
        Ok(mac)
    }
}

fn signing_payload(url: &str, params: &[(String, String)]) -> String {
    let mut sorted = params.iter().collect::<Vec<_>>();
    sorted.sort();

    let mut payload = String::from(url);
    for (name, value) in sorted {
        payload.push_str(name);
        payload.push_str(value);
    }
    payload
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{SignatureError, SignatureVerifier};
    use crate::config::AppConfig;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    fn platform_sample() -> Vec<(String, String)> {
        params(&[
            ("CallSid", "CA1234567890ABCDE"),
            ("Caller", "+14158675309"),
            ("Digits", "1234"),
            ("From", "+14158675309"),
            ("To", "+18005551212"),
        ])
    }

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(SecretString::from("12345".to_string()), "https://mycompany.com/")
    }

    #[test]
    fn matches_platform_reference_signature() {
        let signature =
            verifier().sign("/myapp.php?foo=1&bar=2", &platform_sample()).expect("sign request");
        assert_eq!(signature, "RSOYDt4T1cUTdK1PDd93/VVr8B8=");
    }

    #[test]
    fn parameter_order_does_not_change_the_signature() {
        let verifier = verifier();
        let mut reversed = platform_sample();
        reversed.reverse();

        let forward = verifier.sign("/voice", &platform_sample()).expect("sign forward");
        let backward = verifier.sign("/voice", &reversed).expect("sign reversed");
        assert_eq!(forward, backward);
        assert_eq!(verifier.verify("/voice", &reversed, Some(&forward)), Ok(()));
    }

    #[test]
    fn tampered_parameters_are_rejected() {
        let verifier = verifier();
        let signature = verifier.sign("/voice", &platform_sample()).expect("sign request");
        let mut tampered = platform_sample();
        tampered.push(("SpeechResult".to_string(), "transfer me".to_string()));

        assert_eq!(
            verifier.verify("/voice", &tampered, Some(&signature)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn context_query_is_part_of_the_signed_url() {
        let verifier = verifier();
        let signature = verifier.sign("/voice", &platform_sample()).expect("sign request");

        assert_eq!(
            verifier.verify("/voice?context=claims_offered", &platform_sample(), Some(&signature)),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn missing_and_malformed_headers_are_rejected() {
        let verifier = verifier();
        assert_eq!(verifier.verify("/voice", &[], None), Err(SignatureError::Missing));
        assert_eq!(verifier.verify("/voice", &[], Some("  ")), Err(SignatureError::Missing));
        assert_eq!(
            verifier.verify("/voice", &[], Some("not base64 !!")),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn disabled_validation_builds_no_verifier() {
        let mut config = AppConfig::default();
        config.telephony.validate_signatures = false;
        config.telephony.public_base_url = Some("https://voice.example.com".to_string());
        assert!(SignatureVerifier::from_config(&config.telephony).is_none());

        config.telephony.validate_signatures = true;
        let verifier =
            SignatureVerifier::from_config(&config.telephony).expect("verifier when enabled");
        assert_eq!(verifier.request_url("/voice"), "https://voice.example.com/voice");
    }
}
