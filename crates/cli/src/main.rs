use std::process::ExitCode;

fn main() -> ExitCode {
    receptionist_cli::run()
}
