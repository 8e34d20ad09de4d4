//! Credential and endpoint lookup
//!
//! Providers never read the process environment directly; they go through a
//! `CredentialSource` so runs can be driven from a fixed set of values.

use std::collections::HashMap;

pub trait CredentialSource {
    /// Raw value of a named variable, if set
    fn get(&self, name: &str) -> Option<String>;

    /// First non-blank value among `names`, trimmed
    fn first_of(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| {
            self.get(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
    }
}

/// Reads from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed in-memory values
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
