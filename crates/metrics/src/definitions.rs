//! Metric name and label definitions.

/// Event dispatch pipeline metrics
pub mod dispatch {
    /// Provider events taken off the merged stream
    pub const EVENTS_RECEIVED_TOTAL: &str = "switchyard_events_received_total";
    /// Messages that resolved to exactly one command
    pub const COMMANDS_RESOLVED_TOTAL: &str = "switchyard_commands_resolved_total";
    /// Messages whose command could not be resolved (no such / ambiguous)
    pub const RESOLUTION_FAILURES_TOTAL: &str = "switchyard_resolution_failures_total";
    /// Time spent tokenizing, resolving, provisioning and authorizing a message
    pub const RESOLUTION_DURATION_SECONDS: &str = "switchyard_resolution_duration_seconds";
    /// Requests rejected by the rule gate
    pub const AUTHORIZATION_DENIED_TOTAL: &str = "switchyard_authorization_denied_total";
    /// Command requests handed to the executor
    pub const REQUESTS_EMITTED_TOTAL: &str = "switchyard_requests_emitted_total";
    /// Command responses sent back to a channel
    pub const RESPONSES_ROUTED_TOTAL: &str = "switchyard_responses_routed_total";
    /// Errors surfaced on the operator error channel
    pub const PIPELINE_ERRORS_TOTAL: &str = "switchyard_pipeline_errors_total";
}

/// User provisioning metrics
pub mod provisioning {
    /// Accounts created through self-registration
    pub const USERS_CREATED_TOTAL: &str = "switchyard_users_provisioned_total";
    /// Self-registration attempts refused by policy or bootstrap state
    pub const REFUSED_TOTAL: &str = "switchyard_provisioning_refused_total";
}

/// Adapter connection metrics
pub mod channels {
    /// Number of registered adapter connections
    pub const ACTIVE: &str = "switchyard_adapters_active";
    /// Messages sent through an adapter
    pub const MESSAGES_SENT_TOTAL: &str = "switchyard_adapter_messages_sent_total";
}

/// Common label keys
pub mod labels {
    pub const ADAPTER: &str = "adapter";
    pub const BUNDLE: &str = "bundle";
    pub const REASON: &str = "reason";
}

/// Histogram buckets (seconds)
pub mod buckets {
    /// Resolution is local lookups; covers 100µs to 5s.
    pub const RESOLUTION_DURATION: &[f64] = &[
        0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
    ];
}
