//! CLI command implementations.

pub mod common;
pub mod pattern;
pub mod play;
pub mod render;
pub mod settings;
pub mod state;
