//! itematlas - command-line tool that packs item and block icons into a grid atlas

use std::process::ExitCode;

use itematlas::cli;

fn main() -> ExitCode {
    cli::run()
}
