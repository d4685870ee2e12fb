use std::process::ExitCode;

fn main() -> ExitCode {
    sarpipe_cli::run()
}
