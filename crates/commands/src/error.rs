use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no such command: {name}")]
    NoSuchCommand { name: String },

    #[error("ambiguous command: {first} and {second} both match")]
    AmbiguousCommand { first: String, second: String },

    #[error(transparent)]
    Store(#[from] switchyard_store::Error),
}

impl Error {
    #[must_use]
    pub fn no_such_command(name: impl Into<String>) -> Self {
        Self::NoSuchCommand { name: name.into() }
    }

    /// Resolution failures a chat user can act on, as opposed to store faults.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::NoSuchCommand { .. } | Self::AmbiguousCommand { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
