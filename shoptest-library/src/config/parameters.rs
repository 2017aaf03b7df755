//! Parameters loaded from the test configuration YAML file.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::trace_categories;

const MANDATORY_SECTION: &str = "mandatory_parameters";
const OPTIONAL_SECTION: &str = "optional_parameters";

/// Layout of the configuration file. Unknown top-level sections are ignored.
#[derive(Deserialize)]
struct RawConfigFile {
    mandatory_parameters: Value,
    #[serde(default)]
    optional_parameters: Value,
}

/// Flat parameter map merged from the mandatory and optional sections of the
/// configuration file. Optional parameters take precedence over mandatory ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    values: IndexMap<String, Value>,
}

impl Parameters {
    /// Loads parameters from the YAML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(target: trace_categories::CONFIG, "loading config file: {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigFileRead(path.to_path_buf(), e))?;

        Self::parse(&content, path)
    }

    /// Parses parameters from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::parse(content, Path::new("<string>"))
    }

    fn parse(content: &str, source: &Path) -> Result<Self> {
        let raw: RawConfigFile = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigParse(PathBuf::from(source), e))?;

        let mut values = section_entries(MANDATORY_SECTION, raw.mandatory_parameters)?;
        for (key, value) in section_entries(OPTIONAL_SECTION, raw.optional_parameters)? {
            values.insert(key, value);
        }

        tracing::debug!(target: trace_categories::CONFIG, "loaded {} parameters", values.len());

        Ok(Self { values })
    }

    /// Returns the value configured for the given key, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Iterates over all parameters in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no parameters are defined.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(key, value)| (key.into(), value)).collect(),
        }
    }
}

fn section_entries(name: &'static str, section: Value) -> Result<IndexMap<String, Value>> {
    match section {
        Value::Null => Ok(IndexMap::new()),
        Value::Mapping(mapping) => mapping
            .into_iter()
            .map(|(key, value)| match key {
                Value::String(key) => Ok((key, value)),
                _ => Err(Error::InvalidConfigSection(name)),
            })
            .collect(),
        _ => Err(Error::InvalidConfigSection(name)),
    }
}
