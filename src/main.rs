//! Binary entrypoint that launches the coach bootstrap.

use std::process::ExitCode;

use lingua_coach::start_coach;

/// Start the coach runtime with the local console transport.
fn main() -> ExitCode {
    start_coach::run()
}
