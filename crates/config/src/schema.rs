//! Config schema types (global behaviour, dispatch buffers, bundles, metrics).

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    pub global: GlobalConfig,
    pub dispatch: DispatchConfig,
    pub bundles: BundlesConfig,
    pub metrics: MetricsConfig,
}

/// Behaviour shared by every adapter connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Character that marks an explicit command (`!deploy prod`).
    pub command_trigger: String,

    /// Create accounts for unknown chat users on their first command.
    pub allow_self_registration: bool,

    /// Match raw message text against bundle command trigger patterns.
    pub enable_spoken_commands: bool,

    /// Resolve `<trigger>bundle:command` style messages by name.
    pub enable_explicit_commands: bool,

    /// Announce the bot in every present channel after connecting.
    pub greeting: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            command_trigger: "!".into(),
            allow_self_registration: false,
            enable_spoken_commands: true,
            enable_explicit_commands: true,
            greeting: true,
        }
    }
}

impl GlobalConfig {
    /// The trigger as a single character, if it is configured as one.
    #[must_use]
    pub fn trigger_char(&self) -> Option<char> {
        let mut chars = self.command_trigger.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

/// Channel capacities for the dispatch pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Capacity of the merged provider-event channel.
    pub event_buffer: usize,
    /// Capacity of the outbound command-request channel.
    pub request_buffer: usize,
    /// Capacity of the inbound command-response channel.
    pub response_buffer: usize,
    /// Pipeline errors held for the host; later ones are dropped after logging.
    pub error_buffer: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            event_buffer: 256,
            request_buffer: 64,
            response_buffer: 64,
            error_buffer: 128,
        }
    }
}

/// Bundle manifests installed at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlesConfig {
    /// Directory scanned for `*.yml` / `*.yaml` bundle manifests.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Labels added to every exported series.
    pub labels: BTreeMap<String, String>,
    /// Print the Prometheus exposition to stderr on shutdown.
    pub report_on_exit: bool,
}
