//! Binary entrypoint for the `folder-links` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    folder_links::logging::init();
    match folder_links::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
