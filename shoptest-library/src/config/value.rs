//! Effective configuration values.

use serde::Serialize;
use serde_yaml::Value;

/// A configuration value, either as written in the YAML file or as overridden
/// from the environment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A value taken from the configuration file.
    Yaml(Value),
    /// A value taken from an environment variable.
    Env(String),
}

impl ConfigValue {
    /// Returns whether the value came from the environment.
    pub const fn is_override(&self) -> bool {
        matches!(self, Self::Env(_))
    }

    /// Renders a scalar value as a string. Null values and collections yield `None`.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::Yaml(value) => scalar_to_string(value),
            Self::Env(s) => Some(s.clone()),
        }
    }

    /// Interprets the value as a list.
    ///
    /// A YAML sequence yields its scalar items; any other scalar is split on `,`.
    /// Items are trimmed, and empty items are dropped.
    pub fn as_list(&self) -> Vec<String> {
        let items: Vec<String> = match self {
            Self::Yaml(Value::Sequence(seq)) => seq.iter().filter_map(scalar_to_string).collect(),
            other => other
                .as_string()
                .map(|s| s.split(',').map(String::from).collect())
                .unwrap_or_default(),
        };

        items
            .into_iter()
            .map(|item| item.trim().to_owned())
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Interprets the value as a flag.
    ///
    /// Null, `false`, zero, empty strings and collections, and the strings `"0"`,
    /// `"false"`, `"no"` and `"off"` (in any case) are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Yaml(value) => yaml_is_truthy(value),
            Self::Env(s) => str_is_truthy(s),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn yaml_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i != 0
            } else if let Some(u) = n.as_u64() {
                u != 0
            } else {
                n.as_f64().is_some_and(|f| f.abs() > 0.0)
            }
        }
        Value::String(s) => str_is_truthy(s),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => yaml_is_truthy(&tagged.value),
    }
}

fn str_is_truthy(s: &str) -> bool {
    !(s.is_empty()
        || s == "0"
        || ["false", "no", "off"]
            .iter()
            .any(|falsy| s.eq_ignore_ascii_case(falsy)))
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    fn yaml(s: &str) -> Result<ConfigValue> {
        Ok(ConfigValue::Yaml(serde_yaml::from_str(s)?))
    }

    #[test]
    fn scalars_render_as_strings() -> Result<()> {
        assert_eq!(yaml("shop")?.as_string().as_deref(), Some("shop"));
        assert_eq!(yaml("true")?.as_string().as_deref(), Some("true"));
        assert_eq!(yaml("42")?.as_string().as_deref(), Some("42"));
        assert_eq!(yaml("~")?.as_string(), None);
        assert_eq!(yaml("[a, b]")?.as_string(), None);

        let env = ConfigValue::Env(String::from("/var/www"));
        assert_eq!(env.as_string().as_deref(), Some("/var/www"));
        assert!(env.is_override());

        Ok(())
    }

    #[test]
    fn comma_separated_lists_are_split_and_trimmed() -> Result<()> {
        assert_eq!(
            yaml("'oe/paypal, acme/foo,,'")?.as_list(),
            ["oe/paypal", "acme/foo"]
        );
        assert_eq!(
            ConfigValue::Env(String::from("a,b")).as_list(),
            ["a", "b"]
        );
        assert!(yaml("''")?.as_list().is_empty());
        assert!(yaml("~")?.as_list().is_empty());

        Ok(())
    }

    #[test]
    fn sequences_are_lists() -> Result<()> {
        assert_eq!(yaml("[oe/paypal, ' acme/foo ', '']")?.as_list(), [
            "oe/paypal",
            "acme/foo"
        ]);

        Ok(())
    }

    #[test]
    fn truthiness() -> Result<()> {
        for falsy in ["~", "false", "0", "0.0", "''", "'0'", "'false'", "'Off'", "'no'", "[]", "{}"] {
            assert!(!yaml(falsy)?.is_truthy(), "expected {falsy} to be falsy");
        }

        for truthy in ["true", "1", "-1", "0.5", "'yes'", "'x'", "[0]"] {
            assert!(yaml(truthy)?.is_truthy(), "expected {truthy} to be truthy");
        }

        assert!(!ConfigValue::Env(String::new()).is_truthy());
        assert!(!ConfigValue::Env(String::from("FALSE")).is_truthy());
        assert!(ConfigValue::Env(String::from("1")).is_truthy());

        Ok(())
    }
}
