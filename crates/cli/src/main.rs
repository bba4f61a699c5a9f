use std::process::ExitCode;

fn main() -> ExitCode {
    casevalue_cli::run()
}
