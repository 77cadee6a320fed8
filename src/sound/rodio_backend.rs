//! Speaker output through rodio.
//!
//! Each playback gets its own detached sink, so overlapping keystrokes mix
//! instead of queueing behind each other.

use anyhow::{Context, Result};
use rodio::source::Buffered;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::time::Duration;

use crate::constants::DEFAULT_SOUND_VOLUME;

use super::{AudioBackend, PlaybackRegion, PlaybackRequest};

/// Plays sound pack samples on the default output device.
pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl RodioBackend {
    /// Opens the default output device.
    pub fn new() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("Failed to open default audio output")?;

        Ok(Self {
            _stream: stream,
            handle,
            volume: DEFAULT_SOUND_VOLUME,
        })
    }
}

/// Decoded sample, cheap to clone per playback.
pub type RodioBuffer = Buffered<Decoder<Cursor<Vec<u8>>>>;

/// Decodes a complete audio file without touching the output device.
pub fn decode_audio(bytes: Vec<u8>) -> Result<RodioBuffer> {
    let decoder = Decoder::new(Cursor::new(bytes)).context("Unsupported or corrupt audio")?;
    Ok(decoder.buffered())
}

impl AudioBackend for RodioBackend {
    type Buffer = RodioBuffer;

    fn decode(&self, bytes: Vec<u8>) -> Result<Self::Buffer> {
        decode_audio(bytes)
    }

    fn play(&self, buffer: &Self::Buffer, request: &PlaybackRequest) -> Result<()> {
        let sink = Sink::try_new(&self.handle).context("Failed to create audio sink")?;
        sink.set_volume(self.volume);

        match request.region {
            PlaybackRegion::Slice {
                offset_secs,
                duration_secs,
            } => {
                let offset = Duration::try_from_secs_f64(offset_secs)
                    .context("Invalid playback offset")?;
                let duration = Duration::try_from_secs_f64(duration_secs)
                    .context("Invalid playback duration")?;
                sink.append(buffer.clone().skip_duration(offset).take_duration(duration));
            }
            PlaybackRegion::Whole => sink.append(buffer.clone()),
        }

        sink.detach();
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }
}
