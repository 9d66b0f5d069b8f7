use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use receptionist_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = vec![
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["RECEPTIONIST_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["RECEPTIONIST_SERVER_PORT", "PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["RECEPTIONIST_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field(
            "telephony.auth_token",
            redact_secret(Some(&config.telephony.auth_token)),
            &["RECEPTIONIST_TELEPHONY_AUTH_TOKEN", "TWILIO_AUTH_TOKEN"],
        ),
        field(
            "telephony.public_base_url",
            config.telephony.public_base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["RECEPTIONIST_TELEPHONY_PUBLIC_BASE_URL"],
        ),
        field(
            "telephony.validate_signatures",
            config.telephony.validate_signatures.to_string(),
            &["RECEPTIONIST_TELEPHONY_VALIDATE_SIGNATURES"],
        ),
        field(
            "telephony.webhook_path",
            config.telephony.webhook_path.clone(),
            &["RECEPTIONIST_TELEPHONY_WEBHOOK_PATH"],
        ),
        field("telephony.voice", config.telephony.voice.clone(), &["RECEPTIONIST_TELEPHONY_VOICE"]),
        field(
            "telephony.gather_timeout_secs",
            config.telephony.gather_timeout_secs.to_string(),
            &["RECEPTIONIST_TELEPHONY_GATHER_TIMEOUT_SECS"],
        ),
        field(
            "llm.provider",
            config.llm.provider.as_str().to_string(),
            &["RECEPTIONIST_LLM_PROVIDER"],
        ),
        field(
            "llm.api_key",
            redact_secret(config.llm.api_key.as_ref()),
            &["RECEPTIONIST_LLM_API_KEY", "ANTHROPIC_API_KEY"],
        ),
        field(
            "llm.base_url",
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["RECEPTIONIST_LLM_BASE_URL"],
        ),
        field("llm.model", config.llm.model.clone(), &["RECEPTIONIST_LLM_MODEL"]),
        field(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["RECEPTIONIST_LLM_TIMEOUT_SECS"],
        ),
        field(
            "llm.max_tokens",
            config.llm.max_tokens.to_string(),
            &["RECEPTIONIST_LLM_MAX_TOKENS"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["RECEPTIONIST_LOGGING_LEVEL", "RECEPTIONIST_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["RECEPTIONIST_LOGGING_FORMAT", "RECEPTIONIST_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

struct ConfigField {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

fn field(key: &'static str, value: String, env_keys: &'static [&'static str]) -> ConfigField {
    ConfigField { key, value, env_keys }
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("receptionist.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/receptionist.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys.iter().find(|env_key| {
        env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false)
    });
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret.map(|value| value.expose_secret().trim().is_empty()) {
        None => "<unset>".to_string(),
        Some(true) => "<empty>".to_string(),
        Some(false) => "<redacted>".to_string(),
    }
}
