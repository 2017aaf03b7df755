//! Command-line argument definitions for `shoptest`.

use clap::{Parser, Subcommand, builder::styling};
use std::path::PathBuf;

use crate::{events, productinfo};

const SHORT_DESCRIPTION: &str = "Shop test configuration and exception log inspector";

const LONG_DESCRIPTION: &str = r"
shoptest resolves the test configuration of a shop test suite (test_config.yml plus
environment variable overrides) and inspects or clears the shop's exception log.

Every configuration parameter can be overridden by an environment variable named after
the parameter in upper case, e.g. SHOP_URL for shop_url.
";

/// Parsed command-line arguments for `shoptest`.
#[derive(Parser)]
#[clap(name = productinfo::PRODUCT_NAME,
       version = productinfo::PRODUCT_VERSION,
       about = SHORT_DESCRIPTION,
       long_about = LONG_DESCRIPTION,
       styles = shoptest_help_styles())]
pub struct CommandLineArgs {
    /// Root directory of the testing library checkout.
    #[clap(
        long = "library-path",
        env = "TEST_LIBRARY_BASE_PATH",
        default_value = ".",
        global = true
    )]
    pub library_path: PathBuf,

    /// Use this vendor directory instead of discovering it from the library path.
    #[clap(long = "vendor-path", global = true)]
    pub vendor_path: Option<PathBuf>,

    /// Use this configuration file instead of the one next to the vendor directory.
    #[clap(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,

    /// Test file or directory being run; selects the current test suite.
    #[clap(long = "test-target", global = true)]
    pub test_target: Option<PathBuf>,

    /// Enable debug logging for classes of tracing events.
    #[clap(long = "log-enable", alias = "debug", value_name = "EVENT", global = true)]
    pub enabled_debug_events: Vec<events::TraceEvent>,

    /// Command to run.
    #[clap(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect the resolved test configuration.
    #[clap(subcommand)]
    Config(ConfigCommand),

    /// Inspect or clear an exception log.
    #[clap(subcommand)]
    Exceptions(ExceptionsCommand),
}

/// Commands operating on the test configuration.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print every configured parameter with environment overrides applied.
    Show,

    /// Print the effective value of a single parameter.
    Get {
        /// Name of the parameter, e.g. `shop_url`.
        key: String,
    },

    /// Print the resolved shop paths, URL, edition, test suites and modules.
    Paths,
}

/// Commands operating on an exception log file.
#[derive(Debug, Subcommand)]
pub enum ExceptionsCommand {
    /// Print the exceptions recorded in the log.
    List {
        /// Path to the exception log.
        log_file: PathBuf,

        /// Print the raw log content instead of parsed entries.
        #[clap(long = "original")]
        original: bool,
    },

    /// Truncate the log.
    Clear {
        /// Path to the exception log.
        log_file: PathBuf,
    },
}

/// Returns clap styling to be used for command-line help.
#[doc(hidden)]
fn shoptest_help_styles() -> clap::builder::Styles {
    styling::Styles::styled()
        .header(
            styling::AnsiColor::Yellow.on_default()
                | styling::Effects::BOLD
                | styling::Effects::UNDERLINE,
        )
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Magenta.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default())
}
