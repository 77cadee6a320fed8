//! Data models shared by the pipeline and its front ends.
//!
//! Models are independent of UI and audio concerns.

pub mod key_event;
pub mod rgb;

// Re-export all model types
pub use key_event::{KeyEvent, NamedKey};
pub use rgb::RgbColor;
