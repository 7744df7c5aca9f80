//! Identifier types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An opaque, persistent identifier naming a single live object.
///
/// Identifiers are plain strings on disk, so the host can serialize them like any other string
/// field. An empty identifier never names anything: templates carry one, and references that
/// point nowhere hold one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// The empty identifier.
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Mints a fresh, random 128-bit identifier, formatted as a hyphenated UUID.
    ///
    /// ```
    /// # use tether::Identifier;
    /// let a = Identifier::generate();
    /// let b = Identifier::generate();
    /// assert_eq!(a.as_str().len(), 36);
    /// assert_ne!(a, b);
    /// ```
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resets the identifier back to empty, keeping the allocation.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-process value identifying one live instance of an object.
///
/// Two different instances never share an [`InstanceId`] during a single run, but the values are
/// meaningless across runs and are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub u64);

#[cfg(test)]
mod tests {
    use super::Identifier;
    use ahash::AHashSet;

    #[test]
    fn generated_identifiers_are_distinct() {
        let ids: AHashSet<_> = (0..1000).map(|_| Identifier::generate()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| !id.is_empty()));
    }

    #[test]
    fn serializes_as_plain_string() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Holder {
            id: Identifier,
        }

        let text = toml::to_string(&Holder { id: "abc-1".into() }).unwrap();
        assert_eq!(text.trim(), r#"id = "abc-1""#);

        let back: Holder = toml::from_str(&text).unwrap();
        assert_eq!(back.id.as_str(), "abc-1");
    }
}
