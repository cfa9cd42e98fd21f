//! Styleconf - command-line tool for resolving style declarations

use std::process::ExitCode;

use styleconf::cli;

fn main() -> ExitCode {
    cli::run()
}
