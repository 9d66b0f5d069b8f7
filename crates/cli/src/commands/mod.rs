pub mod config;
pub mod doctor;
pub mod simulate;

use serde::Serialize;

/// Exit code plus the text printed to stdout.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandError<'a> {
    command: &'a str,
    status: &'static str,
    error_class: &'a str,
    message: String,
}

/// Exit code used when a report cannot be serialized.
const SERIALIZATION_EXIT_CODE: u8 = 5;

impl CommandResult {
    /// Pretty-printed JSON report with exit code 0.
    pub fn report(command: &str, report: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(report) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(
                command,
                "serialization",
                error.to_string(),
                SERIALIZATION_EXIT_CODE,
            ),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload =
            CommandError { command, status: "error", error_class, message: message.into() };
        let output = serde_json::to_string(&payload).unwrap_or_else(|_| {
            format!(
                "{{\"command\":\"{command}\",\"status\":\"error\",\"error_class\":\"{error_class}\"}}"
            )
        });
        Self { exit_code, output }
    }
}
