//! # archguard-settings
//!
//! Configuration for archguard, loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ArchguardSettings::default()`]
//! 2. **Project file**: `archguard.yaml` at the repository root (deep-merged over defaults)
//! 3. **Environment variables**: `ARCHGUARD_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    api_key_from_env, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::*;
