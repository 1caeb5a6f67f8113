//! themekit - command-line build pipeline for front-end theme assets

use std::process::ExitCode;

use themekit::cli;

fn main() -> ExitCode {
    cli::run()
}
