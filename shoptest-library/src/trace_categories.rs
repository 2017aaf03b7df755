//! Trace utilities

/// Trace category for test configuration resolution.
pub const CONFIG: &str = "config";
/// Trace category for exception log handling.
pub const EXCEPTIONS: &str = "exceptions";
