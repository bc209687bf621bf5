//! # Secret Reference
//!
//! Identity of the target Secret, parsed from `<namespace>/<name>`.

use crate::config::ConfigError;
use crate::constants::SECRET_REF_SEPARATOR;
use std::fmt;
use std::str::FromStr;

/// Namespace and name of the Secret the pair is published to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    pub namespace: String,
    pub name: String,
}

impl SecretRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl FromStr for SecretRef {
    type Err = ConfigError;

    /// Exactly one separator, with a non-empty part on each side
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split(SECRET_REF_SEPARATOR).collect();
        match parts.as_slice() {
            [namespace, name] if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(*namespace, *name))
            }
            _ => Err(ConfigError::InvalidSecretRef(value.to_string())),
        }
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, SECRET_REF_SEPARATOR, self.name)
    }
}
