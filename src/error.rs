//! Error taxonomy for the feedback pipeline.
//!
//! None of these conditions is fatal. Lookups that miss are recovered as
//! no-ops by their callers, and sound pack failures degrade the pipeline to
//! visual-only feedback instead of halting input handling.

use thiserror::Error;

use crate::sound::KeyCode;

/// Errors raised inside the key, typing and sound state machines.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A key name that the layout table does not know.
    #[error("unknown key '{0}'")]
    UnknownKey(String),

    /// Fetching or parsing one sound pack manifest failed.
    #[error("failed to load manifest for sound pack '{pack}'")]
    ManifestLoad {
        /// Pack identifier
        pack: String,
        /// Underlying fetch or parse error
        #[source]
        source: anyhow::Error,
    },

    /// Fetching or decoding the audio payload of a sound pack failed.
    #[error("failed to decode audio '{file}' for sound pack '{pack}'")]
    AudioDecode {
        /// Pack identifier
        pack: String,
        /// Audio file name inside the pack
        file: String,
        /// Underlying fetch or decode error
        #[source]
        source: anyhow::Error,
    },

    /// The active pack has no sample mapped for a key code.
    #[error("no sample mapped for key code {0}")]
    RegionMiss(KeyCode),

    /// The audio backend refused to start a playback instance.
    #[error("audio playback failed")]
    Playback(#[source] anyhow::Error),
}

impl PipelineError {
    /// Returns true for lookup misses that callers swallow silently.
    #[must_use]
    pub const fn is_lookup_miss(&self) -> bool {
        matches!(self, Self::UnknownKey(_) | Self::RegionMiss(_))
    }

    /// Message including every underlying cause, for logs.
    #[must_use]
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
