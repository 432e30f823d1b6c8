//! Session variable and alias tables.
//!
//! Both tables are plain ordered maps owned by one [`Environment`]; nothing
//! is shared between sessions. Listings come out sorted by name.

use std::collections::BTreeMap;

use crate::config::{DEFAULT_ALIASES, DEFAULT_VARS, ShellConfig};
use crate::error::EnvironmentError;

/// Check if a variable name is valid.
///
/// Valid names must:
/// - Not be empty
/// - Start with a letter or underscore
/// - Contain only alphanumeric characters and underscores
pub fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Alias names are single words without quotes, `=` or `/`.
pub fn is_valid_alias_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | '/' | '\'' | '"' | '$' | '|' | ';' | '&'))
}

#[derive(Clone, Debug, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
}

impl Environment {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment of a fresh session: identity variables, the stock
    /// defaults, then the config's overrides.
    pub fn seeded(config: &ShellConfig) -> Self {
        let home = config.home_dir();
        let mut env = Self::new();
        for (key, value) in [
            ("USER", config.user.as_str()),
            ("LOGNAME", config.user.as_str()),
            ("HOME", home.as_str()),
            ("PWD", home.as_str()),
            ("HOSTNAME", config.hostname.as_str()),
        ]
        .into_iter()
        .chain(DEFAULT_VARS.iter().copied())
        {
            env.vars.insert(key.to_string(), value.to_string());
        }
        for (name, value) in DEFAULT_ALIASES {
            env.aliases.insert(name.to_string(), value.to_string());
        }

        for (key, value) in &config.variables {
            if let Err(err) = env.set(key, value) {
                tracing::warn!(%err, "config variable skipped");
            }
        }
        for (name, value) in &config.aliases {
            if let Err(err) = env.set_alias(name, value) {
                tracing::warn!(%err, "config alias skipped");
            }
        }
        env
    }

    // =========================================================================
    // Variables
    // =========================================================================

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), EnvironmentError> {
        if !is_valid_var_name(key) {
            return Err(EnvironmentError::InvalidVariableName(key.to_string()));
        }
        self.vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Returns false when the variable was not set.
    pub fn unset(&mut self, key: &str) -> bool {
        self.vars.remove(key).is_some()
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Variables in `export` listing form: `declare -x KEY="value"`.
    pub fn format_export_output(&self) -> Vec<String> {
        self.vars()
            .map(|(key, value)| format!("declare -x {}=\"{}\"", key, value))
            .collect()
    }

    // =========================================================================
    // Aliases
    // =========================================================================

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn set_alias(&mut self, name: &str, value: &str) -> Result<(), EnvironmentError> {
        if !is_valid_alias_name(name) {
            return Err(EnvironmentError::InvalidAliasName(name.to_string()));
        }
        self.aliases.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn unalias(&mut self, name: &str) -> bool {
        self.aliases.remove(name).is_some()
    }

    pub fn clear_aliases(&mut self) {
        self.aliases.clear();
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
