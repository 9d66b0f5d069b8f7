use receptionist_agent::llm::HttpLlmClient;
use receptionist_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_signing_secret(&config));
            checks.push(check_classifier_credentials(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("webhook_signing_secret"));
            checks.push(skipped("classifier_credentials"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_signing_secret(config: &AppConfig) -> DoctorCheck {
    let telephony = &config.telephony;
    if !telephony.validate_signatures {
        return DoctorCheck {
            name: "webhook_signing_secret",
            status: CheckStatus::Skipped,
            details: "signature validation disabled; acceptable for local development only"
                .to_string(),
        };
    }

    let token_present = !telephony.auth_token.expose_secret().trim().is_empty();
    match (token_present, telephony.public_base_url.as_deref()) {
        (true, Some(base_url)) => DoctorCheck {
            name: "webhook_signing_secret",
            status: CheckStatus::Pass,
            details: format!(
                "signatures verified against `{}{}`",
                base_url.trim_end_matches('/'),
                telephony.webhook_path
            ),
        },
        (false, _) => DoctorCheck {
            name: "webhook_signing_secret",
            status: CheckStatus::Fail,
            details: "telephony.auth_token is empty".to_string(),
        },
        (true, None) => DoctorCheck {
            name: "webhook_signing_secret",
            status: CheckStatus::Fail,
            details: "telephony.public_base_url is unset".to_string(),
        },
    }
}

fn check_classifier_credentials(config: &AppConfig) -> DoctorCheck {
    match HttpLlmClient::from_config(&config.llm) {
        Ok(client) => DoctorCheck {
            name: "classifier_credentials",
            status: CheckStatus::Pass,
            details: format!(
                "provider `{}` model `{}` at `{}` (timeout {}s)",
                config.llm.provider.as_str(),
                config.llm.model,
                client.endpoint(),
                config.llm.timeout_secs
            ),
        },
        Err(error) => DoctorCheck {
            name: "classifier_credentials",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
