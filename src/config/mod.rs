//! Engine Configuration Module
//!
//! Provides solver and forecast tuning loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `DCA_CONFIG` environment variable (path to TOML file)
//! 2. `dca_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(EngineConfig::load());
//!
//! // Anywhere in the codebase:
//! let b_max = config::get().fitting.b_max;
//! ```

mod engine_config;
pub mod defaults;
pub mod validation;

pub use engine_config::*;

use std::sync::OnceLock;

/// Global engine configuration, initialized once at startup.
static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Initialize the global engine configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: EngineConfig) {
    if ENGINE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global engine configuration, or the built-in defaults when
/// `init()` has not been called.
pub fn get() -> &'static EngineConfig {
    static DEFAULT: OnceLock<EngineConfig> = OnceLock::new();
    ENGINE_CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT.get_or_init(EngineConfig::default))
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    ENGINE_CONFIG.get().is_some()
}
