//! Logical key names.
//!
//! A logical name is the stable, user-facing identifier of a key. It never
//! changes across rotations and is never used directly as a storage id; the
//! store sees `"{name}--v{N}"` instead (see [`crate::storage::VersionedName`]).

use crate::error::{Error, Result};
use std::fmt;

/// Maximum length of a logical key name.
pub const MAX_KEY_NAME_LEN: usize = 127;

/// A validated logical key name matching `^[A-Za-z][A-Za-z0-9-]{0,126}$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyName(String);

impl KeyName {
    /// Validates `name` and wraps it.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidInput("key name cannot be empty".to_string()));
        }
        if name.len() > MAX_KEY_NAME_LEN {
            return Err(Error::InvalidInput(format!(
                "key name is {} characters long, the limit is {MAX_KEY_NAME_LEN}",
                name.len()
            )));
        }

        let mut chars = name.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !starts_with_letter || !rest_valid {
            return Err(Error::InvalidInput(format!(
                "invalid key name '{name}': must start with a letter and contain only 0-9, a-z, A-Z and -"
            )));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for KeyName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

/// The three logical names of a cascade, one per layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeKeyNames {
    pub twofish: KeyName,
    pub serpent: KeyName,
    pub aes: KeyName,
}

impl CascadeKeyNames {
    /// Validates all three names; fails on the first invalid one.
    pub fn parse(twofish: &str, serpent: &str, aes: &str) -> Result<Self> {
        Ok(Self {
            twofish: KeyName::parse(twofish)?,
            serpent: KeyName::parse(serpent)?,
            aes: KeyName::parse(aes)?,
        })
    }

    /// Uses one name for all three layers.
    pub fn uniform(name: KeyName) -> Self {
        Self {
            twofish: name.clone(),
            serpent: name.clone(),
            aes: name,
        }
    }
}
