//! Helpers for the shop's exception log file.
//!
//! The shop appends one entry per logged exception, shaped like:
//!
//! ```text
//! [<timestamp>] [exception] [type <class>] [code <code>] [file <file>] [line <line>] [message <message>]
//! ```
//!
//! possibly followed by stack trace lines. Only the entry lines are parsed; everything
//! else in the file is kept in the original content but otherwise ignored.

use serde::Serialize;
use serde_yaml::Value;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::trace_categories;

/// Substring identifying the lines of the log that start an exception entry.
pub const EXCEPTION_MARKER: &str = "[exception] [type ";

/// A single exception entry of the log. All fields are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExceptionRecord {
    /// When the exception was logged.
    pub timestamp: String,
    /// Log level of the entry.
    pub level: String,
    /// Class name of the exception.
    #[serde(rename = "type")]
    pub exception_type: String,
    /// Exception code.
    pub code: String,
    /// File the exception was raised in.
    pub file: String,
    /// Line the exception was raised at.
    pub line: String,
    /// Exception message.
    pub message: String,
}

impl ExceptionRecord {
    /// Parses one entry line. The message extends to the last `]` of the line, so it
    /// may itself contain brackets.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedLogEntry(line.to_owned());

        let mut rest = line.trim();
        let timestamp = take_field(&mut rest).ok_or_else(malformed)?;
        let level = take_field(&mut rest).ok_or_else(malformed)?;
        let exception_type = take_labeled_field(&mut rest, "type").ok_or_else(malformed)?;
        let code = take_labeled_field(&mut rest, "code").ok_or_else(malformed)?;
        let file = take_labeled_field(&mut rest, "file").ok_or_else(malformed)?;
        let line_number = take_labeled_field(&mut rest, "line").ok_or_else(malformed)?;

        let message = rest
            .trim_start()
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
            .and_then(|inner| strip_label(inner, "message"))
            .ok_or_else(malformed)?;

        Ok(Self {
            timestamp: timestamp.to_owned(),
            level: level.to_owned(),
            exception_type: exception_type.to_owned(),
            code: code.to_owned(),
            file: file.to_owned(),
            line: line_number.to_owned(),
            message: message.to_owned(),
        })
    }
}

/// Takes the next `[...]` field off the front of `rest`.
fn take_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let inner = rest.trim_start().strip_prefix('[')?;
    let (field, remainder) = inner.split_once(']')?;
    *rest = remainder;

    Some(field.trim())
}

fn take_labeled_field<'a>(rest: &mut &'a str, label: &str) -> Option<&'a str> {
    take_field(rest).and_then(|field| strip_label(field, label))
}

fn strip_label<'a>(field: &'a str, label: &str) -> Option<&'a str> {
    let value = field.trim().strip_prefix(label)?;
    if value.is_empty() || value.starts_with(' ') {
        Some(value.trim())
    } else {
        None
    }
}

/// Content of an exception log: the verbatim bytes and the entries parsed from them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExceptionLog {
    original: Vec<u8>,
    /// Parsed exception entries, in file order.
    pub entries: Vec<ExceptionRecord>,
}

impl ExceptionLog {
    /// Parses log content. Invalid UTF-8 in entries is replaced with U+FFFD; entry
    /// lines that cannot be parsed are skipped.
    pub fn parse(content: impl Into<Vec<u8>>) -> Self {
        let original = content.into();

        let entries = String::from_utf8_lossy(&original)
            .lines()
            .filter(|line| line.contains(EXCEPTION_MARKER))
            .filter_map(|line| match ExceptionRecord::parse(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(target: trace_categories::EXCEPTIONS, "skipping entry: {e}");
                    None
                }
            })
            .collect();

        Self { original, entries }
    }

    /// Returns the log content exactly as read.
    pub fn original(&self) -> &[u8] {
        &self.original
    }

    /// Returns the log content as text, with invalid UTF-8 replaced by U+FFFD.
    pub fn original_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.original)
    }

    /// Returns whether the log holds no exception entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of exception entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the entries for the given exception class.
    pub fn entries_of_type<'a>(
        &'a self,
        exception_type: &'a str,
    ) -> impl Iterator<Item = &'a ExceptionRecord> {
        self.entries
            .iter()
            .filter(move |record| record.exception_type == exception_type)
    }
}

/// Reads and clears the shop's exception log file.
#[derive(Clone, Debug)]
pub struct ExceptionLogFile {
    path: PathBuf,
}

impl ExceptionLogFile {
    /// Creates a helper for the log file at the given path. Empty paths and `"0"` are
    /// rejected.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() || path.as_os_str() == "0" {
            return Err(Error::InvalidLogFilePath);
        }

        Ok(Self { path })
    }

    /// Creates a helper from a loosely-typed configuration value. Only non-empty
    /// strings are accepted.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(path) => Self::new(path),
            _ => Err(Error::InvalidLogFilePath),
        }
    }

    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the log file.
    ///
    /// Use this only when a test deliberately provokes exceptions; it is not meant to
    /// silence exceptions whose cause is not understood.
    pub fn clear(&self) -> Result<()> {
        std::fs::File::create(&self.path)
            .map_err(|e| Error::LogFileNotWritable(self.path.clone(), e))?;

        tracing::debug!(target: trace_categories::EXCEPTIONS, "cleared {}", self.path.display());

        Ok(())
    }

    /// Reads the log file and parses its exception entries.
    pub fn read(&self) -> Result<ExceptionLog> {
        let content = std::fs::read(&self.path)
            .map_err(|e| Error::LogFileNotReadable(self.path.clone(), e))?;

        let log = ExceptionLog::parse(content);
        tracing::debug!(
            target: trace_categories::EXCEPTIONS,
            "parsed {} exception(s) from {}",
            log.len(),
            self.path.display()
        );

        Ok(log)
    }
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::{assert_eq, assert_matches};
    use std::fs;

    const EXPECTED_TYPE: &str = r"OxidEsales\Eshop\Core\Exception\StandardException";

    fn format_exception(message: &str, code: i32, file: &str, line: u32) -> String {
        std::format!(
            "[Fri Dec 08 10:31:25.123456 2017] [exception] [type {EXPECTED_TYPE}] [code {code}] \
             [file {file}] [line {line}] [message {message}]\n\
             [stacktrace]\n#0 {{main}}\n"
        )
    }

    fn log_file_with(content: &str) -> Result<(tempfile::NamedTempFile, ExceptionLogFile)> {
        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), content)?;
        let helper = ExceptionLogFile::new(file.path())?;
        Ok((file, helper))
    }

    #[test]
    fn new_rejects_empty_path() {
        assert_matches!(ExceptionLogFile::new(""), Err(Error::InvalidLogFilePath));
        assert_matches!(ExceptionLogFile::new("0"), Err(Error::InvalidLogFilePath));
        assert_eq!(
            Error::InvalidLogFilePath.to_string(),
            "exception log file path must be a non-empty string"
        );
    }

    #[test]
    fn from_value_rejects_anything_but_non_empty_strings() -> Result<()> {
        for yaml in ["''", "'0'", "~", "[]", "{}", "false", "true", "1", "0"] {
            let value: Value = serde_yaml::from_str(yaml)?;
            assert_matches!(
                ExceptionLogFile::from_value(&value),
                Err(Error::InvalidLogFilePath),
                "expected {yaml} to be rejected"
            );
        }

        let helper = ExceptionLogFile::from_value(&Value::String(String::from("/tmp/ex.log")))?;
        assert_eq!(helper.path(), Path::new("/tmp/ex.log"));

        Ok(())
    }

    #[test]
    fn read_returns_original_content() -> Result<()> {
        let contents = [
            "",
            "test",
            "tèßt",
            "\n            \n            test\n            \n            ",
        ];

        for expected in contents {
            let (_file, helper) = log_file_with(expected)?;
            assert_eq!(helper.read()?.original(), expected.as_bytes());
        }

        Ok(())
    }

    #[test]
    fn read_keeps_non_utf8_content() -> Result<()> {
        let content: &[u8] =
            b"[ts] [exception] [type Foo] [code 1] [file /a.php] [line 3] [message caf\xe9]\n";

        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), content)?;
        let log = ExceptionLogFile::new(file.path())?.read()?;

        assert_eq!(log.original(), content);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries[0].message, "caf\u{fffd}");
        assert!(log.original_lossy().contains("[message caf\u{fffd}]"));

        Ok(())
    }

    #[test]
    fn read_missing_file_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing.log");
        let helper = ExceptionLogFile::new(&path)?;

        let err = helper.read().err();
        assert_matches!(&err, Some(Error::LogFileNotReadable(p, _)) if *p == path);
        assert_eq!(
            err.map(|e| e.to_string()),
            Some(std::format!("File {} could not be read", path.display()))
        );

        Ok(())
    }

    #[test]
    fn clear_empties_file() -> Result<()> {
        let (_file, helper) = log_file_with("test")?;

        helper.clear()?;

        assert_eq!(helper.read()?.original(), b"");
        assert!(helper.read()?.is_empty());

        Ok(())
    }

    #[test]
    fn clear_read_only_file_fails() -> Result<()> {
        let (file, helper) = log_file_with("test")?;

        let mut permissions = fs::metadata(file.path())?.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(file.path(), permissions)?;

        // Privileged users can write regardless of permissions.
        if fs::OpenOptions::new().write(true).open(file.path()).is_ok() {
            return Ok(());
        }

        let err = helper.clear().err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some(std::format!(
                "File {} could not be opened in write mode",
                file.path().display()
            ))
        );
        assert_eq!(fs::read_to_string(file.path())?, "test");

        Ok(())
    }

    #[test]
    fn clear_directory_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let helper = ExceptionLogFile::new(dir.path())?;

        let err = helper.clear().err();
        assert_matches!(&err, Some(Error::LogFileNotWritable(p, _)) if p == dir.path());
        assert_eq!(
            err.map(|e| e.to_string()),
            Some(std::format!(
                "File {} could not be opened in write mode",
                dir.path().display()
            ))
        );

        Ok(())
    }

    #[test]
    fn read_parses_repeated_entries() -> Result<()> {
        let expected = ExceptionRecord {
            timestamp: String::from("Fri Dec 08 10:31:25.123456 2017"),
            level: String::from("exception"),
            exception_type: String::from(EXPECTED_TYPE),
            code: String::from("1024"),
            file: String::from("/var/www/tests/ExceptionTest.php"),
            line: String::from("42"),
            message: String::from("test message"),
        };

        for count in [0, 1, 5] {
            let content = format_exception("test message", 1024, &expected.file, 42).repeat(count);
            let (_file, helper) = log_file_with(&content)?;

            let log = helper.read()?;
            assert_eq!(log.len(), count);
            assert_eq!(log.original(), content.as_bytes());
            for record in &log.entries {
                assert_eq!(record, &expected);
            }
        }

        Ok(())
    }

    #[test]
    fn message_may_contain_brackets_and_labels() -> Result<()> {
        let line = format_exception("bad [type file] given", 0, "/a.php", 7);
        let record = ExceptionRecord::parse(line.lines().next().unwrap_or_default())?;

        assert_eq!(record.message, "bad [type file] given");
        assert_eq!(record.code, "0");
        assert_eq!(record.line, "7");

        Ok(())
    }

    #[test]
    fn malformed_and_unrelated_lines_are_skipped() {
        let content = "[2017-12-08] [exception] [type Foo] [code 1]\n\
                       some unrelated line\n\
                       [2017-12-08] [exception] [type Foo] [code 1] [file f] [line 2] [message m]\n";

        let log = ExceptionLog::parse(content);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries[0].message, "m");
        assert_eq!(log.entries_of_type("Foo").count(), 1);
        assert_eq!(log.entries_of_type("Bar").count(), 0);
    }

    #[test]
    fn parse_rejects_mislabeled_fields() {
        let line = "[ts] [exception] [type Foo] [kode 1] [file f] [line 2] [message m]";
        assert_matches!(ExceptionRecord::parse(line), Err(Error::MalformedLogEntry(_)));
    }

    #[test]
    fn records_serialize_with_type_key() -> Result<()> {
        let log = ExceptionLog::parse(format_exception("m", 1, "f.php", 3));
        let value = serde_yaml::to_value(&log.entries)?;

        assert_eq!(value[0]["type"], Value::String(String::from(EXPECTED_TYPE)));
        assert_eq!(value[0]["message"], Value::String(String::from("m")));
        assert_eq!(value[0]["line"], Value::String(String::from("3")));

        Ok(())
    }
}
