//! Implements the command-line interface for `shoptest`.

use clap::Parser;
use std::io::Write;

use crate::args::CommandLineArgs;
use crate::commands;
use crate::events;
use crate::productinfo;

/// Main entry point for `shoptest`.
pub fn run() {
    //
    // Install panic handlers to report our panic and cleanly exit on panic.
    //
    install_panic_handlers();

    //
    // Parse args.
    //
    let parsed_args = match CommandLineArgs::try_parse() {
        Ok(parsed_args) => parsed_args,
        Err(e) => {
            let _ = e.print();

            // clap returns errors for `--help`, `--version`, etc.
            let exit_code = match e.kind() {
                clap::error::ErrorKind::DisplayVersion | clap::error::ErrorKind::DisplayHelp => 0,
                _ => 1,
            };

            std::process::exit(exit_code);
        }
    };

    //
    // Run.
    //
    let exit_code = match run_with_args(&parsed_args) {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!("error: {err:#}");
            1
        }
    };

    std::process::exit(exit_code);
}

fn install_panic_handlers() {
    //
    // Set up panic handler. On release builds, it will capture panic details to a
    // temporary .toml file and report a human-readable message to the screen.
    //
    human_panic::setup_panic!(
        human_panic::Metadata::new(productinfo::PRODUCT_NAME, productinfo::PRODUCT_VERSION)
            .support("please report the issue along with the generated report file")
    );
}

/// Runs the selected command with tracing initialized, writing to stdout.
///
/// # Arguments
///
/// * `args` - The already-parsed command-line arguments.
fn run_with_args(args: &CommandLineArgs) -> anyhow::Result<()> {
    let _event_config = events::TraceEventConfig::init(&args.enabled_debug_events);

    let mut stdout = std::io::stdout().lock();
    commands::execute(args, &mut stdout)?;
    stdout.flush()?;

    Ok(())
}
