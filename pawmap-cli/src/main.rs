//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::error::Error;

use pawmap_cli::CliError;

fn main() {
    if let Err(err) = pawmap_cli::run() {
        report(&err);
        std::process::exit(1);
    }
}

#[expect(
    clippy::print_stderr,
    reason = "fatal errors are reported to the operator on stderr"
)]
fn report(err: &CliError) {
    eprintln!("pawmap: {err}");
    let mut cause = err.source();
    while let Some(inner) = cause {
        eprintln!("  caused by: {inner}");
        cause = inner.source();
    }
}
