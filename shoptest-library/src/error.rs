use std::path::PathBuf;

/// Monolithic error type for the testing library.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An exception log helper was requested for an empty, `"0"` or non-string path.
    #[error("exception log file path must be a non-empty string")]
    InvalidLogFilePath,

    /// The exception log could not be opened for writing.
    #[error("File {} could not be opened in write mode", .0.display())]
    LogFileNotWritable(PathBuf, #[source] std::io::Error),

    /// The exception log could not be read.
    #[error("File {} could not be read", .0.display())]
    LogFileNotReadable(PathBuf, #[source] std::io::Error),

    /// A log line did not have the bracketed exception layout.
    #[error("malformed exception log entry: '{0}'")]
    MalformedLogEntry(String),

    /// The configuration file could not be read.
    #[error("failed to read config file {}: {}", .0.display(), .1)]
    ConfigFileRead(PathBuf, #[source] std::io::Error),

    /// The configuration file is not valid YAML.
    #[error("failed to parse config file {}: {}", .0.display(), .1)]
    ConfigParse(PathBuf, #[source] serde_yaml::Error),

    /// A top-level section of the configuration file has the wrong shape.
    #[error("config section '{0}' must be a mapping")]
    InvalidConfigSection(&'static str),

    /// A path could not be resolved on disk.
    #[error("path not found: {}: {}", .0.display(), .1)]
    PathNotFound(PathBuf, #[source] std::io::Error),

    /// Neither the configuration nor the shop's own config file provide a URL.
    #[error("no shop url configured and none found in {}", .0.display())]
    ShopUrlNotFound(PathBuf),

    /// The configured shop edition is not one of CE, PE or EE.
    #[error("unknown shop edition: '{0}'")]
    UnknownShopEdition(String),
}

/// Result type for the testing library.
pub type Result<T> = std::result::Result<T, Error>;
