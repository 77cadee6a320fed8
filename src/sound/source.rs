//! Where sound pack assets come from.
//!
//! Paths are always `<packId>/<file>`, relative to the source root.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::constants::PACK_MANIFEST_FILE;

/// Read access to sound pack files.
///
/// Sources are shared with the background fetch thread, so they must be
/// `Send + Sync`.
pub trait AssetSource: Send + Sync {
    /// Reads one file.
    fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

/// Assets read from a packs directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Packs directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists pack ids by scanning the root for subdirectories containing a
    /// manifest.
    ///
    /// Returns an empty list if the root does not exist. Ids are sorted.
    pub fn discover_packs(&self) -> Result<Vec<String>> {
        let mut packs = Vec::new();

        if !self.root.exists() {
            return Ok(packs);
        }

        let entries = fs::read_dir(&self.root).context(format!(
            "Failed to read sound pack directory: {}",
            self.root.display()
        ))?;

        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_dir() || !path.join(PACK_MANIFEST_FILE).exists() {
                continue;
            }

            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                packs.push(name.to_string());
            }
        }

        packs.sort();
        Ok(packs)
    }
}

impl AssetSource for DirAssetSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("Asset path must stay inside the packs directory: {path}");
        }

        let full = self.root.join(relative);
        fs::read(&full).context(format!("Failed to read asset: {}", full.display()))
    }
}

/// Assets held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .with_context(|| format!("Asset not found: {path}"))
    }
}
