use std::process::ExitCode;

fn main() -> ExitCode {
    picksy_cli::run()
}
