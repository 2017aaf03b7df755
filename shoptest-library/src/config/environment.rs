//! Sources of environment variable overrides.

use std::collections::HashMap;
use std::ffi::OsString;

use crate::trace_categories;

/// Where configuration overrides are read from.
#[derive(Clone, Debug, Default)]
pub enum EnvironmentSource {
    /// The environment of the current process.
    #[default]
    Process,
    /// A fixed set of variables, independent of the process environment.
    Fixed(HashMap<String, String>),
}

impl EnvironmentSource {
    /// Creates a fixed environment from name/value pairs.
    pub fn fixed<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            vars.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Looks up a variable. A variable that is defined but empty is still returned.
    pub fn var(&self, name: &str) -> Option<String> {
        match self {
            Self::Process => {
                std::env::var_os(name).map(|value| os_value_to_string(name, value))
            }
            Self::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

fn os_value_to_string(name: &str, value: OsString) -> String {
    value.into_string().unwrap_or_else(|value| {
        tracing::warn!(
            target: trace_categories::CONFIG,
            "${name} is not valid unicode; replacing invalid bytes"
        );
        value.to_string_lossy().into_owned()
    })
}

/// Returns the name of the environment variable that overrides the given parameter.
pub fn override_var_name(param: &str) -> String {
    param.to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fixed_environment_returns_defined_vars() {
        let env = EnvironmentSource::fixed([("SHOP_URL", "http://localhost/"), ("EMPTY", "")]);

        assert_eq!(env.var("SHOP_URL").as_deref(), Some("http://localhost/"));
        assert_eq!(env.var("EMPTY").as_deref(), Some(""));
        assert_eq!(env.var("MISSING"), None);
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_values_are_converted_lossily() {
        use std::os::unix::ffi::OsStringExt;

        let value = OsString::from_vec(b"http://caf\xe9.example/".to_vec());
        assert_eq!(
            os_value_to_string("SHOP_URL", value),
            "http://caf\u{fffd}.example/"
        );
        assert_eq!(
            os_value_to_string("SHOP_URL", OsString::from("plain")),
            "plain"
        );
    }

    #[test]
    fn override_names_are_uppercased() {
        assert_eq!(override_var_name("shop_tests_path"), "SHOP_TESTS_PATH");
        assert_eq!(override_var_name("is_subshop"), "IS_SUBSHOP");
    }
}
