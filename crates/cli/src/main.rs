use std::process::ExitCode;

fn main() -> ExitCode {
    arreda_cli::run()
}
