//! Configuration loading, env substitution, and validation.
//!
//! Config files: `switchyard.toml`, `switchyard.yaml`, or `switchyard.json`
//! Searched in `./` then `~/.config/switchyard/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{BundlesConfig, DispatchConfig, GlobalConfig, MetricsConfig, SwitchyardConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
