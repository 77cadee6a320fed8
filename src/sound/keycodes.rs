//! Key descriptor to sound pack key code mapping.
//!
//! Sound pack manifests address samples by numeric key code. The table that
//! turns a key descriptor into such a code is configuration: an embedded
//! default follows the common pack convention, and a JSON file of the same
//! shape can replace it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::models::KeyEvent;

/// Numeric key code used by sound pack manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KeyCode {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Descriptor → key code table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodeTable {
    codes: HashMap<String, KeyCode>,
}

impl KeyCodeTable {
    /// Loads the embedded default table.
    pub fn load_embedded() -> Result<Self> {
        let json_data = include_str!("keycodes.json");
        Self::from_json(json_data).context("Failed to parse embedded keycodes.json")
    }

    /// Parses a table from a JSON object of `"descriptor": code` entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let codes: HashMap<String, KeyCode> =
            serde_json::from_str(json).context("Invalid key code table")?;

        if codes.is_empty() {
            anyhow::bail!("Key code table is empty");
        }

        Ok(Self { codes })
    }

    /// Reads a table from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key code table: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to load key code table: {}", path.display()))
    }

    /// Looks up a raw descriptor, retrying in lowercase.
    #[must_use]
    pub fn lookup(&self, descriptor: &str) -> Option<KeyCode> {
        self.codes
            .get(descriptor)
            .or_else(|| self.codes.get(&descriptor.to_lowercase()))
            .copied()
    }

    /// Key code for a normalized key event.
    #[must_use]
    pub fn code_for(&self, event: &KeyEvent) -> Option<KeyCode> {
        match event {
            KeyEvent::Char(c) => self.lookup(c.encode_utf8(&mut [0; 4])),
            KeyEvent::Named(named) => self.lookup(named.descriptor()),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NamedKey;

    #[test]
    fn test_embedded_table() {
        let table = KeyCodeTable::load_embedded().unwrap();
        assert_eq!(table.len(), 55);
        assert_eq!(table.lookup("a"), Some(KeyCode(30)));
        assert_eq!(table.lookup("Enter"), Some(KeyCode(3612)));
        assert_eq!(table.lookup(" "), Some(KeyCode(57)));
        assert_eq!(table.lookup("\\"), Some(KeyCode(28)));
    }

    #[test]
    fn test_lookup_falls_back_to_lowercase() {
        let table = KeyCodeTable::load_embedded().unwrap();
        assert_eq!(table.lookup("A"), Some(KeyCode(30)));
        assert_eq!(table.lookup("F13"), None);
    }

    #[test]
    fn test_code_for_events() {
        let table = KeyCodeTable::load_embedded().unwrap();
        assert_eq!(table.code_for(&KeyEvent::Char('Q')), Some(KeyCode(16)));
        assert_eq!(
            table.code_for(&KeyEvent::Named(NamedKey::Space)),
            Some(KeyCode(57))
        );
        assert_eq!(
            table.code_for(&KeyEvent::Named(NamedKey::Control)),
            Some(KeyCode(29))
        );
        assert_eq!(table.code_for(&KeyEvent::Char('é')), None);
    }

    #[test]
    fn test_custom_table() {
        let table = KeyCodeTable::from_json(r#"{ "a": 65, "Enter": 28 }"#).unwrap();
        assert_eq!(table.lookup("a"), Some(KeyCode(65)));
        assert_eq!(table.lookup("Enter"), Some(KeyCode(28)));

        assert!(KeyCodeTable::from_json("{}").is_err());
        assert!(KeyCodeTable::from_json(r#"{ "a": "x" }"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.json");
        std::fs::write(&path, r#"{ "z": 1 }"#).unwrap();
        let table = KeyCodeTable::from_file(&path).unwrap();
        assert_eq!(table.lookup("Z"), Some(KeyCode(1)));

        assert!(KeyCodeTable::from_file(&dir.path().join("missing.json")).is_err());
    }
}
