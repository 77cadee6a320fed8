//! Audio output abstraction.
//!
//! The sound engine decodes and triggers samples only through
//! [`AudioBackend`]. [`NullBackend`] discards everything and backs muted or
//! headless runs. [`RecordingBackend`] captures playback requests for tests.

use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::constants::DEFAULT_SOUND_VOLUME;

use super::KeyCode;

/// Portion of a buffer to play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackRegion {
    /// Slice of a shared buffer, in seconds
    Slice {
        /// Start offset
        offset_secs: f64,
        /// Slice length
        duration_secs: f64,
    },
    /// The whole buffer from its start
    Whole,
}

/// One fire-and-forget playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    /// Pack the sample comes from
    pub pack_id: String,
    /// Key code that triggered it
    pub key_code: KeyCode,
    /// What to play
    pub region: PlaybackRegion,
}

/// Decodes and plays audio.
pub trait AudioBackend {
    /// Decoded, replayable audio.
    type Buffer;

    /// Decodes a complete audio file.
    fn decode(&self, bytes: Vec<u8>) -> Result<Self::Buffer>;

    /// Starts an independent playback instance. Must not block.
    fn play(&self, buffer: &Self::Buffer, request: &PlaybackRequest) -> Result<()>;

    /// Sets output volume, already clamped to `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);
}

/// Backend that plays nothing.
///
/// Decoding only rejects empty input, so a pack with missing audio still
/// fails the same way it would with a real device.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    type Buffer = ();

    fn decode(&self, bytes: Vec<u8>) -> Result<Self::Buffer> {
        if bytes.is_empty() {
            anyhow::bail!("Audio data is empty");
        }
        Ok(())
    }

    fn play(&self, _buffer: &Self::Buffer, _request: &PlaybackRequest) -> Result<()> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}
}

/// Buffer produced by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBuffer {
    /// Leading bytes of the source file, lossily decoded
    pub tag: String,
}

/// A playback captured by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPlayback {
    /// The request as received
    pub request: PlaybackRequest,
    /// Tag of the buffer that was played
    pub buffer_tag: String,
    /// Volume at the time of playback
    pub volume: f32,
}

/// Backend that records instead of playing.
///
/// Clones share their recordings, so a test can keep a handle after moving
/// the backend into the engine. Input that is empty or starts with `BAD` is
/// rejected by [`AudioBackend::decode`].
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    played: Rc<RefCell<Vec<RecordedPlayback>>>,
    decoded: Rc<Cell<usize>>,
    volume: Rc<Cell<f32>>,
    fail_playback: Rc<Cell<bool>>,
}

impl RecordingBackend {
    /// Creates a backend with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            played: Rc::default(),
            decoded: Rc::default(),
            volume: Rc::new(Cell::new(DEFAULT_SOUND_VOLUME)),
            fail_playback: Rc::default(),
        }
    }

    /// Playbacks so far.
    #[must_use]
    pub fn played(&self) -> Vec<RecordedPlayback> {
        self.played.borrow().clone()
    }

    /// Number of successful decodes.
    #[must_use]
    pub fn decoded_count(&self) -> usize {
        self.decoded.get()
    }

    /// Last volume set.
    #[must_use]
    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// Makes every following playback fail.
    pub fn set_fail_playback(&self, fail: bool) {
        self.fail_playback.set(fail);
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for RecordingBackend {
    type Buffer = RecordedBuffer;

    fn decode(&self, bytes: Vec<u8>) -> Result<Self::Buffer> {
        if bytes.is_empty() {
            anyhow::bail!("Audio data is empty");
        }
        if bytes.starts_with(b"BAD") {
            anyhow::bail!("Audio data is corrupt");
        }

        self.decoded.set(self.decoded.get() + 1);
        let head = &bytes[..bytes.len().min(32)];
        Ok(RecordedBuffer {
            tag: String::from_utf8_lossy(head).into_owned(),
        })
    }

    fn play(&self, buffer: &Self::Buffer, request: &PlaybackRequest) -> Result<()> {
        if self.fail_playback.get() {
            anyhow::bail!("Audio device unavailable");
        }

        self.played.borrow_mut().push(RecordedPlayback {
            request: request.clone(),
            buffer_tag: buffer.tag.clone(),
            volume: self.volume.get(),
        });
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume.set(volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlaybackRequest {
        PlaybackRequest {
            pack_id: "pack".to_string(),
            key_code: KeyCode(30),
            region: PlaybackRegion::Whole,
        }
    }

    #[test]
    fn test_null_backend_discards_playback() {
        let mut backend = NullBackend;
        backend.set_volume(0.5);
        backend.decode(b"click".to_vec()).unwrap();
        assert!(backend.decode(Vec::new()).is_err());
        assert!(backend.play(&(), &request()).is_ok());
    }

    #[test]
    fn test_recording_backend_tracks_playback() {
        let mut backend = RecordingBackend::new();
        let observer = backend.clone();

        let buffer = backend.decode(b"click".to_vec()).unwrap();
        backend.set_volume(0.5);
        backend.play(&buffer, &request()).unwrap();

        let played = observer.played();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].buffer_tag, "click");
        assert_eq!(played[0].volume, 0.5);
        assert_eq!(observer.decoded_count(), 1);
    }

    #[test]
    fn test_recording_backend_rejects_bad_audio() {
        let backend = RecordingBackend::new();
        assert!(backend.decode(Vec::new()).is_err());
        assert!(backend.decode(b"BAD data".to_vec()).is_err());
        assert_eq!(backend.decoded_count(), 0);
    }

    #[test]
    fn test_recording_backend_playback_failure() {
        let backend = RecordingBackend::new();
        let buffer = backend.decode(b"ok".to_vec()).unwrap();
        backend.set_fail_playback(true);
        assert!(backend.play(&buffer, &request()).is_err());
        assert!(backend.played().is_empty());
    }
}
