//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and the defaults that seed a fresh config.

use std::time::Duration;

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "Keyclack";

/// The binary name of the application (used in command examples).
pub const APP_BINARY_NAME: &str = "keyclack";

/// Directory name used under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "Keyclack";

/// Countdown lengths offered by the session timer, in seconds.
pub const TIMER_CHOICES_SECS: [u64; 3] = [15, 30, 60];

/// Countdown length used when nothing else is configured.
pub const DEFAULT_TIMER: Duration = Duration::from_secs(30);

/// Number of words kept in the typing queue.
pub const DEFAULT_MAX_WORDS: usize = 50;

/// Largest accepted typing queue length.
pub const MAX_WORDS_LIMIT: usize = 1000;

/// Playback volume used when no preference is stored.
pub const DEFAULT_SOUND_VOLUME: f32 = 0.33;

/// Sound packs shipped with the original key sound collection.
///
/// Used as the catalog when the packs directory cannot be scanned.
pub const DEFAULT_PACK_IDS: [&str; 10] = [
    "banana-split-lubed",
    "banana-split-stock",
    "cherrymx-black-abs",
    "cherrymx-black-pbt",
    "cherrymx-blue-abs",
    "cherrymx-blue-pbt",
    "cherrymx-red-abs",
    "cherrymx-red-pbt",
    "cherrymx-brown-abs",
    "cherrymx-brown-pbt",
];

/// File name of a sound pack manifest inside its pack directory.
pub const PACK_MANIFEST_FILE: &str = "config.json";
