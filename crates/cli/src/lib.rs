pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::simulate::SimulateArgs;

#[derive(Debug, Parser)]
#[command(
    name = "receptionist",
    about = "Ascent receptionist operator CLI",
    long_about = "Inspect configuration, check readiness, and simulate caller turns offline.",
    after_help = "Examples:\n  receptionist doctor --json\n  receptionist config\n  \
                  receptionist simulate \"I was in an accident\"\n  \
                  receptionist simulate --context claims_offered \"yes, thank you\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, webhook signing secret, and classifier credentials")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run one caller turn through the dialog and print the response envelope")]
    Simulate {
        #[arg(long, help = "Context token carried over from the previous turn")]
        context: Option<String>,
        #[arg(long, help = "Keypad digits pressed instead of speaking")]
        digits: Option<String>,
        #[arg(long, help = "Consult the configured model when no keyword matches")]
        live: bool,
        #[arg(help = "What the caller said; omit to simulate silence")]
        utterance: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Simulate { context, digits, live, utterance } => {
            commands::simulate::run(SimulateArgs { utterance, digits, context, live })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
