use thiserror::Error;

/// Operator-facing failures, surfaced on the pipeline's error channel.
///
/// None of these stop the pipeline; each one ends at most the processing of
/// a single event or response.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("adapter {adapter}: authentication failed: {message}")]
    Authentication { adapter: String, message: String },

    #[error("adapter {adapter}: {message}")]
    Adapter { adapter: String, message: String },

    #[error("adapter {adapter}: {context}: {source}")]
    AdapterCall {
        adapter: String,
        context: String,
        #[source]
        source: switchyard_channels::Error,
    },

    #[error("adapter {adapter}: failed to listen: {source}")]
    Listen {
        adapter: String,
        #[source]
        source: switchyard_channels::Error,
    },

    #[error("adapter {adapter}: send to channel {channel_id} failed: {source}")]
    Send {
        adapter: String,
        channel_id: String,
        #[source]
        source: switchyard_channels::Error,
    },

    #[error("response for request {request_id} names unknown adapter {adapter}")]
    UnknownAdapter { adapter: String, request_id: i64 },

    #[error("adapter {adapter}: refused command from {user_id}: no admin account exists")]
    NotBootstrapped { adapter: String, user_id: String },

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: switchyard_store::Error,
    },

    #[error("{context}: {message}")]
    Internal { context: String, message: String },

    #[error("request channel closed, dropped request {request_id}")]
    RequestChannelClosed { request_id: i64 },
}

impl PipelineError {
    #[must_use]
    pub fn adapter_call(
        adapter: impl Into<String>,
        context: impl Into<String>,
        source: switchyard_channels::Error,
    ) -> Self {
        Self::AdapterCall {
            adapter: adapter.into(),
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn send(
        adapter: impl Into<String>,
        channel_id: impl Into<String>,
        source: switchyard_channels::Error,
    ) -> Self {
        Self::Send {
            adapter: adapter.into(),
            channel_id: channel_id.into(),
            source,
        }
    }

    #[must_use]
    pub fn store(context: impl Into<String>, source: switchyard_store::Error) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Map an authorization-layer failure that is not the user's fault.
    #[must_use]
    pub fn from_auth(context: impl Into<String>, source: switchyard_auth::Error) -> Self {
        match source {
            switchyard_auth::Error::Store(source) => Self::store(context, source),
            other => Self::Internal {
                context: context.into(),
                message: other.to_string(),
            },
        }
    }

    /// Adapter the failure concerns, when there is one.
    #[must_use]
    pub fn adapter(&self) -> Option<&str> {
        match self {
            Self::Authentication { adapter, .. }
            | Self::Adapter { adapter, .. }
            | Self::AdapterCall { adapter, .. }
            | Self::Listen { adapter, .. }
            | Self::Send { adapter, .. }
            | Self::UnknownAdapter { adapter, .. }
            | Self::NotBootstrapped { adapter, .. } => Some(adapter),
            Self::Store { .. } | Self::Internal { .. } | Self::RequestChannelClosed { .. } => None,
        }
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::Adapter { .. } => "adapter",
            Self::AdapterCall { .. } => "adapter_call",
            Self::Listen { .. } => "listen",
            Self::Send { .. } => "send",
            Self::UnknownAdapter { .. } => "unknown_adapter",
            Self::NotBootstrapped { .. } => "not_bootstrapped",
            Self::Store { .. } => "store",
            Self::Internal { .. } => "internal",
            Self::RequestChannelClosed { .. } => "request_channel_closed",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
