//! Support library for shop test suites.
//!
//! This crate provides the pieces a test suite needs to find its way around a shop
//! installation:
//!
//! 1. **Test configuration** ([`TestConfig`]): reads `test_config.yml`, lets environment
//!    variables override individual parameters, and resolves shop paths, the shop URL,
//!    edition, modules and test suites from it.
//!
//! 2. **Exception log helper** ([`ExceptionLogFile`]): clears the shop's exception log
//!    and parses it into structured [`ExceptionRecord`]s so tests can assert on the
//!    exceptions a shop raised.

pub mod config;
mod error;
pub mod helpers;
pub mod trace_categories;

pub use config::{
    ConfigValue, EnvironmentSource, Parameters, ShopEdition, ShopId, TestConfig,
    TestConfigOptions,
};
pub use error::{Error, Result};
pub use helpers::{ExceptionLog, ExceptionLogFile, ExceptionRecord};
