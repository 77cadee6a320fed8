//! Sound pack manifest (`config.json`) parsing and validation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::KeyCode;

/// How a pack stores its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDefineType {
    /// One shared audio file sliced per key
    Single,
    /// One audio file per key
    Multi,
}

impl fmt::Display for KeyDefineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Multi => write!(f, "multi"),
        }
    }
}

/// One entry of the manifest `defines` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyDefine {
    /// `[startMs, lengthMs]` into the shared file
    Region([f64; 2]),
    /// Dedicated file name
    File(String),
}

/// Millisecond slice of a shared sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Slice start in milliseconds
    pub start_ms: f64,
    /// Slice length in milliseconds
    pub length_ms: f64,
}

impl Region {
    /// Slice start in seconds.
    #[must_use]
    pub fn offset_secs(&self) -> f64 {
        self.start_ms / 1000.0
    }

    /// Slice length in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.length_ms / 1000.0
    }
}

/// Parsed `config.json` of a sound pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Display name
    pub name: String,
    /// Sample storage mode
    pub key_define_type: KeyDefineType,
    /// Shared audio file (single mode)
    #[serde(default)]
    pub sound: Option<String>,
    /// Key code → sample definition; `null` entries are unmapped keys
    #[serde(default)]
    pub defines: HashMap<String, Option<KeyDefine>>,
    /// Marks the pack used when no preference is saved
    #[serde(default)]
    pub default: bool,
}

impl Manifest {
    /// Parses and validates a manifest.
    pub fn parse(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json).context("Invalid sound pack manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parses manifest bytes as fetched from an asset source.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let json = std::str::from_utf8(bytes).context("Manifest is not valid UTF-8")?;
        Self::parse(json)
    }

    /// Validates the manifest.
    ///
    /// Checks:
    /// - single mode names a shared `sound` file
    /// - every define key is a numeric key code
    /// - single mode defines are regions, multi mode defines are file names
    /// - regions are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        if self.key_define_type == KeyDefineType::Single
            && self.sound.as_deref().filter(|s| !s.is_empty()).is_none()
        {
            anyhow::bail!("Single-file pack '{}' has no sound file", self.name);
        }

        for (key, define) in &self.defines {
            key.parse::<KeyCode>()
                .with_context(|| format!("Invalid key code '{key}' in pack '{}'", self.name))?;

            match (self.key_define_type, define) {
                (_, None) => {}
                (KeyDefineType::Single, Some(KeyDefine::Region([start, length]))) => {
                    if !start.is_finite() || !length.is_finite() || *start < 0.0 || *length < 0.0 {
                        anyhow::bail!(
                            "Invalid region [{start}, {length}] for key {key} in pack '{}'",
                            self.name
                        );
                    }
                }
                (KeyDefineType::Multi, Some(KeyDefine::File(file))) => {
                    if file.is_empty() {
                        anyhow::bail!("Empty file name for key {key} in pack '{}'", self.name);
                    }
                }
                (mode, Some(_)) => {
                    anyhow::bail!(
                        "Key {key} in pack '{}' does not match define type {mode}",
                        self.name
                    );
                }
            }
        }

        Ok(())
    }

    /// Mapped regions of a single-mode pack.
    #[must_use]
    pub fn regions(&self) -> HashMap<KeyCode, Region> {
        self.defines
            .iter()
            .filter_map(|(key, define)| match define {
                Some(KeyDefine::Region([start_ms, length_ms])) => Some((
                    key.parse().ok()?,
                    Region {
                        start_ms: *start_ms,
                        length_ms: *length_ms,
                    },
                )),
                _ => None,
            })
            .collect()
    }

    /// Mapped files of a multi-mode pack, sorted by key code.
    #[must_use]
    pub fn files(&self) -> Vec<(KeyCode, String)> {
        let mut files: Vec<(KeyCode, String)> = self
            .defines
            .iter()
            .filter_map(|(key, define)| match define {
                Some(KeyDefine::File(file)) => Some((key.parse().ok()?, file.clone())),
                _ => None,
            })
            .collect();
        files.sort();
        files
    }
}
