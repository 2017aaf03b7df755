//! Helpers for inspecting shop state from tests.

mod exception_log;

pub use exception_log::{EXCEPTION_MARKER, ExceptionLog, ExceptionLogFile, ExceptionRecord};
