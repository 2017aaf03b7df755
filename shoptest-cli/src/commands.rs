//! Implementations of the `shoptest` subcommands.

use anyhow::{Context, Result};
use serde::Serialize;
use shoptest_library::{ExceptionLogFile, ShopEdition, ShopId, TestConfig, TestConfigOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::args::{Command, CommandLineArgs, ConfigCommand, ExceptionsCommand};

/// Resolved locations and derived settings printed by `config paths`.
#[derive(Serialize)]
struct ConfigSummary<'a> {
    vendor_path: &'a Path,
    config_file: &'a Path,
    shop_path: &'a Path,
    shop_tests_path: PathBuf,
    shop_url: &'a str,
    shop_edition: ShopEdition,
    shop_id: ShopId,
    current_test_suite: &'a Path,
    test_suites: &'a [PathBuf],
    partial_module_paths: Vec<String>,
    modules_to_activate: Vec<String>,
}

impl<'a> ConfigSummary<'a> {
    fn resolve(config: &'a TestConfig) -> Result<Self> {
        Ok(Self {
            vendor_path: config.vendor_path(),
            config_file: config.config_file_path(),
            shop_path: config.shop_path()?,
            shop_tests_path: config.shop_tests_path()?,
            shop_url: config.shop_url()?,
            shop_edition: config.shop_edition()?,
            shop_id: config.shop_id()?,
            current_test_suite: config.current_test_suite()?,
            test_suites: config.test_suites()?,
            partial_module_paths: config.partial_module_paths(),
            modules_to_activate: config.modules_to_activate()?,
        })
    }
}

/// Runs the command selected on the command line, writing its output to `out`.
pub fn execute(args: &CommandLineArgs, out: &mut impl Write) -> Result<()> {
    match &args.command {
        Command::Config(command) => {
            let config = load_config(args)?;
            execute_config_command(&config, command, out)
        }
        Command::Exceptions(command) => execute_exceptions_command(command, out),
    }
}

fn load_config(args: &CommandLineArgs) -> Result<TestConfig> {
    let options = TestConfigOptions::builder()
        .library_base_path(args.library_path.clone())
        .maybe_vendor_path(args.vendor_path.clone())
        .maybe_config_file(args.config_file.clone())
        .maybe_test_target(args.test_target.clone())
        .test_target_from_args(false)
        .build();

    TestConfig::load(options).with_context(|| {
        format!(
            "failed to load test configuration for {}",
            args.library_path.display()
        )
    })
}

fn execute_config_command(
    config: &TestConfig,
    command: &ConfigCommand,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            write_yaml(out, &config.effective_parameters())?;
        }
        ConfigCommand::Get { key } => {
            let value = config
                .value(key)
                .with_context(|| format!("parameter '{key}' is not configured"))?;

            if let Some(s) = value.as_string() {
                writeln!(out, "{s}")?;
            } else {
                write_yaml(out, &value)?;
            }
        }
        ConfigCommand::Paths => {
            let summary = ConfigSummary::resolve(config)?;
            write_yaml(out, &summary)?;
        }
    }

    Ok(())
}

fn execute_exceptions_command(command: &ExceptionsCommand, out: &mut impl Write) -> Result<()> {
    match command {
        ExceptionsCommand::List { log_file, original } => {
            let log = ExceptionLogFile::new(log_file.as_path())?.read()?;
            if *original {
                out.write_all(log.original())?;
            } else {
                write_yaml(out, &log.entries)?;
            }
        }
        ExceptionsCommand::Clear { log_file } => {
            ExceptionLogFile::new(log_file.as_path())?.clear()?;
        }
    }

    Ok(())
}

fn write_yaml(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    let rendered = serde_yaml::to_string(value).context("failed to render output as YAML")?;
    out.write_all(rendered.as_bytes())?;
    Ok(())
}
