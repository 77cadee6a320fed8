//! Normalized keyboard input.
//!
//! Raw input descriptors mix single printable characters with named keys.
//! They are normalized once, at the input boundary, into a [`KeyEvent`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-printable keys the pipeline reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    /// Delete the previous character
    Backspace,
    /// Return / Enter
    Enter,
    /// Either Shift key
    Shift,
    /// Tab
    Tab,
    /// Either Control key
    Control,
    /// Either Alt key
    Alt,
    /// Caps Lock
    CapsLock,
    /// The space bar (word delimiter)
    Space,
}

impl NamedKey {
    /// Browser-style key descriptor, as used by the key-code table.
    #[must_use]
    pub const fn descriptor(self) -> &'static str {
        match self {
            Self::Backspace => "Backspace",
            Self::Enter => "Enter",
            Self::Shift => "Shift",
            Self::Tab => "Tab",
            Self::Control => "Control",
            Self::Alt => "Alt",
            Self::CapsLock => "CapsLock",
            Self::Space => " ",
        }
    }

    /// Lowercase name of the keyboard key this maps to.
    #[must_use]
    pub const fn key_name(self) -> &'static str {
        match self {
            Self::Backspace => "backspace",
            Self::Enter => "enter",
            Self::Shift => "shift",
            Self::Tab => "tab",
            Self::Control => "ctrl",
            Self::Alt => "alt",
            Self::CapsLock => "caps",
            Self::Space => "spacebar",
        }
    }

    /// Parses a raw named-key descriptor (e.g. "Backspace", "Ctrl").
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let key = match raw.to_ascii_lowercase().as_str() {
            "backspace" => Self::Backspace,
            "enter" | "return" => Self::Enter,
            "shift" => Self::Shift,
            "tab" => Self::Tab,
            "control" | "ctrl" => Self::Control,
            "alt" => Self::Alt,
            "capslock" | "caps" => Self::CapsLock,
            "space" | "spacebar" | " " => Self::Space,
            _ => return None,
        };
        Some(key)
    }
}

/// A single normalized key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyEvent {
    /// A printable character, case preserved
    Char(char),
    /// A named key
    Named(NamedKey),
}

impl KeyEvent {
    /// Builds an event from a printable character.
    ///
    /// A space becomes [`NamedKey::Space`] so that both spellings of the
    /// delimiter reach the same key.
    #[must_use]
    pub const fn from_char(c: char) -> Self {
        if c == ' ' {
            Self::Named(NamedKey::Space)
        } else {
            Self::Char(c)
        }
    }

    /// Normalizes a raw descriptor: a single character or a named key.
    ///
    /// Returns `None` for descriptors the pipeline does not know
    /// (function keys, media keys, ...).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Self::from_char(c));
        }
        NamedKey::parse(raw).map(Self::Named)
    }

    /// Lowercase key name used for key-state lookups.
    #[must_use]
    pub fn key_name(&self) -> String {
        match self {
            Self::Char(c) => c.to_lowercase().collect(),
            Self::Named(named) => named.key_name().to_string(),
        }
    }

    /// The character this event types, if any.
    ///
    /// Space yields `' '`; other named keys yield nothing.
    #[must_use]
    pub const fn typed_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            Self::Named(NamedKey::Space) => Some(' '),
            Self::Named(_) => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::Named(NamedKey::Space) => write!(f, "Space"),
            Self::Named(named) => write!(f, "{}", named.descriptor()),
        }
    }
}
