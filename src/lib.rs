//! Keyclack Library
//!
//! Keystroke feedback for typing practice: spring-animated key caps, a
//! rolling typing test and mechanical switch sounds played from sound packs.
//! The [`pipeline::Pipeline`] ties the state machines together; the [`tui`]
//! module is one front end for it.

// Module declarations
pub mod config;
pub mod constants;
pub mod error;
pub mod keyboard;
pub mod layout;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod sound;
pub mod tui;
pub mod typing;

pub use error::PipelineError;
pub use pipeline::Pipeline;
