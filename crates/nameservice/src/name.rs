//! Dotted hierarchical names: validation, level split and hashing.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::{ChildNameHash, NameHash, NameServiceError, Result};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_LABEL_LEN: usize = 63;

/// A dotted name such as `wallet.terra` or `pay.wallet.terra`.
///
/// Construction does not validate; call [`Name::validate`] on untrusted input.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| NameServiceError::InvalidName {
            name: self.0.clone(),
            reason: reason.to_string(),
        };

        if self.0.is_empty() {
            return Err(invalid("empty name"));
        }
        if self.0.len() > MAX_NAME_LEN {
            return Err(invalid("name longer than 255 bytes"));
        }
        for label in self.0.split('.') {
            if label.is_empty() {
                return Err(invalid("empty label"));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(invalid("label longer than 63 bytes"));
            }
        }
        if self.0.nfc().collect::<String>() != self.0 {
            return Err(invalid("name is not in normalized form"));
        }

        Ok(())
    }

    pub fn levels(&self) -> usize {
        self.0.split('.').count()
    }

    /// Splits into `(root, parent, child)`; `child` is empty for two-level names.
    ///
    /// # Panics
    ///
    /// Panics unless the name has two or three levels. Callers check
    /// [`Name::levels`] during message validation.
    pub fn split(&self) -> (&str, &str, &str) {
        let labels: Vec<&str> = self.0.split('.').collect();
        match labels.as_slice() {
            [parent, root] => (root, parent, ""),
            [child, parent, root] => (root, parent, child),
            _ => panic!("name {} must have 2 or 3 levels, has {}", self.0, labels.len()),
        }
    }

    /// `(digest(parent.root), digest(child))`.
    pub fn hash(&self) -> (NameHash, ChildNameHash) {
        let (root, parent, child) = self.split();
        (
            NameHash::digest(&format!("{parent}.{root}")),
            ChildNameHash::digest(child),
        )
    }

    /// The two-level ancestor, `parent.root`.
    pub fn second_level(&self) -> Name {
        let (root, parent, _) = self.split();
        Name(format!("{parent}.{root}"))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
