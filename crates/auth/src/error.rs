use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("self-registration is disabled; ask an administrator to create your account")]
    SelfRegistrationOff,

    #[error("switchyard has not been bootstrapped; no admin account exists")]
    NotBootstrapped,

    #[error("switchyard is already bootstrapped")]
    AlreadyBootstrapped,

    #[error("{user} is not allowed to run {command}: {reason}")]
    Unauthorized {
        user: String,
        command: String,
        reason: String,
    },

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] switchyard_store::Error),

    #[error(transparent)]
    Channel(#[from] switchyard_channels::Error),
}

impl Error {
    #[must_use]
    pub fn unauthorized(
        user: impl Into<String>,
        command: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Unauthorized {
            user: user.into(),
            command: command.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
