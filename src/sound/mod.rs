//! Sound pack catalog, selection and keystroke playback.
//!
//! A pack switch runs in three steps so the slow part can leave the main
//! thread:
//!
//! 1. [`SoundEngine::begin_selection`] bumps the selection generation. A
//!    pack decoded earlier in the session is activated on the spot;
//!    otherwise the active pack is parked as a fallback and a
//!    [`SelectionTicket`] is handed out.
//! 2. [`SelectionTicket::fetch`] reads the pack files. It only needs the
//!    ticket and an [`AssetSource`], so it can run on a worker thread.
//! 3. [`SoundEngine::complete_selection`] decodes the bytes and activates
//!    the pack, unless a newer selection started in the meantime.
//!
//! Keystrokes arriving between steps 1 and 3 are dropped silently. Decoded
//! packs stay cached until the engine is dropped.

pub mod backend;
pub mod keycodes;
pub mod loader;
pub mod manifest;
#[cfg(feature = "audio")]
pub mod rodio_backend;
pub mod source;

use anyhow::anyhow;
use std::collections::HashMap;

use crate::constants::{DEFAULT_SOUND_VOLUME, PACK_MANIFEST_FILE};
use crate::error::PipelineError;
use crate::models::KeyEvent;

pub use backend::{
    AudioBackend, NullBackend, PlaybackRegion, PlaybackRequest, RecordedBuffer, RecordedPlayback,
    RecordingBackend,
};
pub use keycodes::{KeyCode, KeyCodeTable};
pub use loader::PackLoader;
pub use manifest::{KeyDefine, KeyDefineType, Manifest, Region};
#[cfg(feature = "audio")]
pub use rodio_backend::{RodioBackend, RodioBuffer};
pub use source::{AssetSource, DirAssetSource, MemoryAssetSource};

/// A catalog entry: a pack whose manifest loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PackEntry {
    /// Directory name of the pack
    pub id: String,
    /// Parsed manifest
    pub manifest: Manifest,
}

impl PackEntry {
    /// Display name from the manifest.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.manifest.name
    }
}

#[derive(Debug)]
enum PackAudio<Buf> {
    Single {
        buffer: Buf,
        regions: HashMap<KeyCode, Region>,
    },
    Multi {
        buffers: HashMap<KeyCode, Buf>,
    },
}

/// A decoded, immutable sound pack.
#[derive(Debug)]
pub struct SoundPack<Buf> {
    id: String,
    display_name: String,
    audio: PackAudio<Buf>,
}

impl<Buf> SoundPack<Buf> {
    /// Pack id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Storage mode.
    #[must_use]
    pub const fn mode(&self) -> KeyDefineType {
        match self.audio {
            PackAudio::Single { .. } => KeyDefineType::Single,
            PackAudio::Multi { .. } => KeyDefineType::Multi,
        }
    }

    /// Number of key codes with a playable sample.
    #[must_use]
    pub fn mapped_keys(&self) -> usize {
        match &self.audio {
            PackAudio::Single { regions, .. } => regions.len(),
            PackAudio::Multi { buffers } => buffers.len(),
        }
    }

    fn resolve(&self, code: KeyCode) -> Result<(&Buf, PlaybackRegion), PipelineError> {
        match &self.audio {
            PackAudio::Single { buffer, regions } => {
                let region = regions.get(&code).ok_or(PipelineError::RegionMiss(code))?;
                Ok((
                    buffer,
                    PlaybackRegion::Slice {
                        offset_secs: region.offset_secs(),
                        duration_secs: region.duration_secs(),
                    },
                ))
            }
            PackAudio::Multi { buffers } => buffers
                .get(&code)
                .map(|buffer| (buffer, PlaybackRegion::Whole))
                .ok_or(PipelineError::RegionMiss(code)),
        }
    }
}

/// Permission to fetch one pack selection.
#[derive(Debug, Clone)]
pub struct SelectionTicket {
    generation: u64,
    pack_id: String,
    manifest: Manifest,
}

impl SelectionTicket {
    /// Selection generation this ticket belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Pack being selected.
    #[must_use]
    pub fn pack_id(&self) -> &str {
        &self.pack_id
    }

    /// Reads every audio file the pack needs.
    ///
    /// Never fails; per-file errors travel inside the result and are
    /// reported by [`SoundEngine::complete_selection`].
    #[must_use]
    pub fn fetch(self, source: &dyn AssetSource) -> FetchedPack {
        let payload = match self.manifest.key_define_type {
            KeyDefineType::Single => {
                let file = self.manifest.sound.clone().unwrap_or_default();
                let bytes = source.fetch(&format!("{}/{file}", self.pack_id));
                FetchedPayload::Single { file, bytes }
            }
            KeyDefineType::Multi => FetchedPayload::Multi {
                files: self
                    .manifest
                    .files()
                    .into_iter()
                    .map(|(code, file)| {
                        let bytes = source.fetch(&format!("{}/{file}", self.pack_id));
                        FetchedFile { code, file, bytes }
                    })
                    .collect(),
            },
        };

        FetchedPack {
            generation: self.generation,
            pack_id: self.pack_id,
            manifest: self.manifest,
            payload,
        }
    }
}

/// One fetched file of a multi-mode pack.
#[derive(Debug)]
pub struct FetchedFile {
    /// Key code the file is mapped to
    pub code: KeyCode,
    /// File name inside the pack
    pub file: String,
    /// File contents or the read error
    pub bytes: anyhow::Result<Vec<u8>>,
}

/// Raw audio of a fetched pack.
#[derive(Debug)]
pub enum FetchedPayload {
    /// Shared file of a single-mode pack
    Single {
        /// File name inside the pack
        file: String,
        /// File contents or the read error
        bytes: anyhow::Result<Vec<u8>>,
    },
    /// Per-key files of a multi-mode pack
    Multi {
        /// Fetched files, sorted by key code
        files: Vec<FetchedFile>,
    },
}

/// How a selection started.
#[derive(Debug)]
pub enum Selection {
    /// The pack was decoded earlier in the session and is active again.
    Cached,
    /// The pack must be fetched and passed to
    /// [`SoundEngine::complete_selection`].
    Fetch(SelectionTicket),
}

impl Selection {
    /// The ticket to fetch, if the pack was not cached.
    #[must_use]
    pub fn into_ticket(self) -> Option<SelectionTicket> {
        match self {
            Self::Cached => None,
            Self::Fetch(ticket) => Some(ticket),
        }
    }
}

/// Result of [`SelectionTicket::fetch`], ready to be applied.
#[derive(Debug)]
pub struct FetchedPack {
    generation: u64,
    pack_id: String,
    manifest: Manifest,
    payload: FetchedPayload,
}

impl FetchedPack {
    /// Selection generation the fetch belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Pack that was fetched.
    #[must_use]
    pub fn pack_id(&self) -> &str {
        &self.pack_id
    }
}

/// How a pack selection ended.
#[derive(Debug)]
pub enum SelectOutcome {
    /// The pack is now active.
    Applied,
    /// A newer selection superseded this one; nothing changed.
    Stale,
    /// The pack could not be used; the previous pack (if any) is active again.
    Failed(PipelineError),
}

impl SelectOutcome {
    /// True if the pack became active.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Result of a keystroke playback attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// A sample was started.
    Played(PlaybackRequest),
    /// No pack is ready (none selected, or a switch is in flight).
    Dropped,
    /// The key has no sample in the active pack.
    Unmapped,
}

/// Playback counters for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStats {
    /// Samples started
    pub triggered: u32,
    /// Keystrokes with no pack ready
    pub dropped: u32,
    /// Keystrokes with no mapped sample
    pub unmapped: u32,
}

/// Sound pack state machine over an audio backend.
pub struct SoundEngine<B: AudioBackend> {
    backend: B,
    key_codes: KeyCodeTable,
    catalog: Vec<PackEntry>,
    packs: HashMap<String, SoundPack<B::Buffer>>,
    active: Option<String>,
    fallback: Option<String>,
    generation: u64,
    pending: Option<u64>,
    volume: f32,
    stats: PlaybackStats,
}

impl<B: AudioBackend> SoundEngine<B> {
    /// Creates an engine with an empty catalog and no active pack.
    pub fn new(mut backend: B, key_codes: KeyCodeTable) -> Self {
        backend.set_volume(DEFAULT_SOUND_VOLUME);
        Self {
            backend,
            key_codes,
            catalog: Vec::new(),
            packs: HashMap::new(),
            active: None,
            fallback: None,
            generation: 0,
            pending: None,
            volume: DEFAULT_SOUND_VOLUME,
            stats: PlaybackStats::default(),
        }
    }

    /// Replaces the catalog with the packs whose manifests load.
    ///
    /// Failing packs are logged and skipped. Returns the number loaded.
    pub fn load_catalog<S: AsRef<str>>(&mut self, source: &dyn AssetSource, ids: &[S]) -> usize {
        self.catalog.clear();

        for id in ids {
            let id = id.as_ref();
            match Self::load_manifest(source, id) {
                Ok(manifest) => {
                    tracing::debug!(pack = id, name = %manifest.name, "Loaded sound pack manifest");
                    self.catalog.push(PackEntry {
                        id: id.to_string(),
                        manifest,
                    });
                }
                Err(err) => {
                    tracing::warn!(pack = id, error = %err.report(), "Skipping sound pack");
                }
            }
        }

        tracing::info!(loaded = self.catalog.len(), requested = ids.len(), "Sound pack catalog ready");
        self.catalog.len()
    }

    fn load_manifest(source: &dyn AssetSource, id: &str) -> Result<Manifest, PipelineError> {
        source
            .fetch(&format!("{id}/{PACK_MANIFEST_FILE}"))
            .and_then(|bytes| Manifest::from_bytes(&bytes))
            .map_err(|source| PipelineError::ManifestLoad {
                pack: id.to_string(),
                source,
            })
    }

    /// Loaded catalog, in request order.
    #[must_use]
    pub fn catalog(&self) -> &[PackEntry] {
        &self.catalog
    }

    /// Pack to use when no preference is saved: the first marked `default`,
    /// otherwise the first loaded.
    #[must_use]
    pub fn default_pack_id(&self) -> Option<&str> {
        self.catalog
            .iter()
            .find(|entry| entry.manifest.default)
            .or_else(|| self.catalog.first())
            .map(|entry| entry.id.as_str())
    }

    /// Starts selecting a catalog pack.
    ///
    /// A cached pack becomes active immediately and any selection still in
    /// flight goes stale. Otherwise the active pack is deactivated until the
    /// returned ticket completes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ManifestLoad`] if the pack is not in the
    /// catalog; nothing changes in that case.
    pub fn begin_selection(&mut self, id: &str) -> Result<Selection, PipelineError> {
        let entry = self
            .catalog
            .iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| PipelineError::ManifestLoad {
                pack: id.to_string(),
                source: anyhow!("pack is not in the catalog"),
            })?;
        let manifest = entry.manifest.clone();

        self.generation += 1;

        if self.packs.contains_key(id) {
            if self.pending.take().is_some() {
                self.fallback = None;
            }
            self.active = Some(id.to_string());
            tracing::info!(pack = id, "Sound pack active (cached)");
            return Ok(Selection::Cached);
        }

        self.pending = Some(self.generation);
        if let Some(active) = self.active.take() {
            self.fallback = Some(active);
        }

        tracing::debug!(pack = id, generation = self.generation, "Sound pack selection started");

        Ok(Selection::Fetch(SelectionTicket {
            generation: self.generation,
            pack_id: id.to_string(),
            manifest,
        }))
    }

    /// Decodes and activates a fetched pack if its selection is still current.
    pub fn complete_selection(&mut self, fetched: FetchedPack) -> SelectOutcome {
        if self.pending != Some(fetched.generation) {
            tracing::debug!(
                pack = %fetched.pack_id,
                generation = fetched.generation,
                "Discarding superseded sound pack"
            );
            return SelectOutcome::Stale;
        }
        self.pending = None;

        match self.decode_pack(fetched) {
            Ok(pack) => {
                tracing::info!(pack = %pack.id, mapped = pack.mapped_keys(), "Sound pack active");
                self.active = Some(pack.id.clone());
                self.packs.insert(pack.id.clone(), pack);
                self.fallback = None;
                SelectOutcome::Applied
            }
            Err(err) => {
                self.active = self.fallback.take();
                tracing::error!(
                    error = %err.report(),
                    restored = ?self.active,
                    "Sound pack selection failed"
                );
                SelectOutcome::Failed(err)
            }
        }
    }

    fn decode_pack(&self, fetched: FetchedPack) -> Result<SoundPack<B::Buffer>, PipelineError> {
        let FetchedPack {
            pack_id,
            manifest,
            payload,
            ..
        } = fetched;

        let audio = match payload {
            FetchedPayload::Single { file, bytes } => {
                let buffer = bytes
                    .and_then(|bytes| self.backend.decode(bytes))
                    .map_err(|source| PipelineError::AudioDecode {
                        pack: pack_id.clone(),
                        file,
                        source,
                    })?;
                PackAudio::Single {
                    buffer,
                    regions: manifest.regions(),
                }
            }
            FetchedPayload::Multi { files } => {
                let total = files.len();
                let mut buffers = HashMap::new();
                let mut last_error = None;

                for FetchedFile { code, file, bytes } in files {
                    match bytes.and_then(|bytes| self.backend.decode(bytes)) {
                        Ok(buffer) => {
                            buffers.insert(code, buffer);
                        }
                        Err(source) => {
                            tracing::warn!(pack = %pack_id, file = %file, error = %format!("{source:#}"), "Skipping sample");
                            last_error = Some((file, source));
                        }
                    }
                }

                if buffers.is_empty() && total > 0 {
                    if let Some((file, source)) = last_error {
                        return Err(PipelineError::AudioDecode {
                            pack: pack_id,
                            file,
                            source,
                        });
                    }
                }

                PackAudio::Multi { buffers }
            }
        };

        Ok(SoundPack {
            id: pack_id,
            display_name: manifest.name,
            audio,
        })
    }

    /// Selects a pack synchronously: begin, fetch and complete in one call.
    pub fn select_pack(&mut self, id: &str, source: &dyn AssetSource) -> SelectOutcome {
        match self.begin_selection(id) {
            Ok(Selection::Cached) => SelectOutcome::Applied,
            Ok(Selection::Fetch(ticket)) => {
                let fetched = ticket.fetch(source);
                self.complete_selection(fetched)
            }
            Err(err) => SelectOutcome::Failed(err),
        }
    }

    /// True if `id` was decoded earlier in the session.
    #[must_use]
    pub fn is_cached(&self, id: &str) -> bool {
        self.packs.contains_key(id)
    }

    /// True while a selection has begun but not completed.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The active pack, if any.
    #[must_use]
    pub fn active_pack(&self) -> Option<&SoundPack<B::Buffer>> {
        self.active.as_ref().and_then(|id| self.packs.get(id))
    }

    /// Id of the active pack, if any.
    #[must_use]
    pub fn active_pack_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Plays the sample for a keystroke.
    ///
    /// Misses (no pack, unknown key, unmapped key) are silent outcomes, not
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Playback`] if the backend cannot start the
    /// sample.
    pub fn play_key(&mut self, event: &KeyEvent) -> Result<PlayOutcome, PipelineError> {
        let pack = self
            .active
            .as_ref()
            .filter(|_| self.pending.is_none())
            .and_then(|id| self.packs.get(id));
        let Some(pack) = pack else {
            self.stats.dropped += 1;
            return Ok(PlayOutcome::Dropped);
        };

        let resolved = self
            .key_codes
            .code_for(event)
            .ok_or_else(|| PipelineError::UnknownKey(event.to_string()))
            .and_then(|code| pack.resolve(code).map(|(buffer, region)| (code, buffer, region)));

        let (key_code, buffer, region) = match resolved {
            Ok(resolved) => resolved,
            Err(err) if err.is_lookup_miss() => {
                tracing::trace!(key = %event, reason = %err, "No sample for key");
                self.stats.unmapped += 1;
                return Ok(PlayOutcome::Unmapped);
            }
            Err(err) => return Err(err),
        };

        let request = PlaybackRequest {
            pack_id: pack.id.clone(),
            key_code,
            region,
        };
        self.backend
            .play(buffer, &request)
            .map_err(PipelineError::Playback)?;

        self.stats.triggered += 1;
        Ok(PlayOutcome::Played(request))
    }

    /// Sets playback volume, clamped to `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() {
            DEFAULT_SOUND_VOLUME
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.volume = volume;
        self.backend.set_volume(volume);
    }

    /// Current volume.
    #[must_use]
    pub const fn volume(&self) -> f32 {
        self.volume
    }

    /// Playback counters since the last reset.
    #[must_use]
    pub const fn stats(&self) -> PlaybackStats {
        self.stats
    }

    /// Zeroes playback counters.
    pub fn reset_stats(&mut self) {
        self.stats = PlaybackStats::default();
    }

    /// Audio backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}
