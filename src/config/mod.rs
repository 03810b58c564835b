//! Configuration module for memo
//!
//! This module handles user settings, their serialization to TOML, and
//! persistent storage in the platform-specific config directory.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
