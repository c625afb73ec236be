use std::process::ExitCode;

fn main() -> ExitCode {
    joinery_cli::run()
}
