use std::error::Error as StdError;

/// Crate-wide result type for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed adapter errors shared by every provider integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid adapter input: {message}")]
    InvalidInput { message: String },

    /// No adapter is registered under this name.
    #[error("unknown adapter: {name}")]
    UnknownAdapter { name: String },

    /// Two adapters were registered under the same name.
    #[error("adapter registered twice: {name}")]
    DuplicateAdapter { name: String },

    /// The provider has no record of this user.
    #[error("no such provider user: {id}")]
    NoSuchUser { id: String },

    /// The provider has no record of this channel.
    #[error("no such provider channel: {id}")]
    NoSuchChannel { id: String },

    /// Operation is currently unavailable (not connected, already listening).
    #[error("adapter operation unavailable: {message}")]
    Unavailable { message: String },

    /// Wrapped source error from the provider SDK or transport.
    #[error("adapter operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_adapter(name: impl std::fmt::Display) -> Self {
        Self::UnknownAdapter {
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn no_such_user(id: impl std::fmt::Display) -> Self {
        Self::NoSuchUser { id: id.to_string() }
    }

    #[must_use]
    pub fn no_such_channel(id: impl std::fmt::Display) -> Self {
        Self::NoSuchChannel { id: id.to_string() }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
