use thiserror::Error;

/// Data-access errors. Validation variants are part of the contract: every
/// backend reports the same variant for the same condition.
#[derive(Debug, Error)]
pub enum Error {
    // ── Bundles ─────────────────────────────────────────────────────────────
    #[error("bundle name is empty")]
    EmptyBundleName,

    #[error("bundle name {name:?} must not contain ':'")]
    InvalidBundleName { name: String },

    #[error("bundle version is empty")]
    EmptyBundleVersion,

    #[error("bundle version {version:?} is not a semantic version")]
    InvalidBundleVersion { version: String },

    #[error("no such bundle: {name} {version}")]
    NoSuchBundle { name: String, version: String },

    #[error("bundle already exists: {name} {version}")]
    BundleExists { name: String, version: String },

    #[error("command name is empty in bundle {bundle}")]
    EmptyCommandName { bundle: String },

    #[error("invalid trigger for {bundle}:{command}: {source}")]
    InvalidTrigger {
        bundle: String,
        command: String,
        #[source]
        source: regex::Error,
    },

    // ── Users ───────────────────────────────────────────────────────────────
    #[error("user name is empty")]
    EmptyUserName,

    #[error("no such user: {0}")]
    NoSuchUser(String),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("email already in use: {0}")]
    DuplicateEmail(String),

    #[error("the admin {0} cannot be deleted")]
    AdminUndeletable(&'static str),

    // ── Groups ──────────────────────────────────────────────────────────────
    #[error("group name is empty")]
    EmptyGroupName,

    #[error("no such group: {0}")]
    NoSuchGroup(String),

    #[error("group already exists: {0}")]
    GroupExists(String),

    // ── Roles ───────────────────────────────────────────────────────────────
    #[error("role name is empty")]
    EmptyRoleName,

    #[error("no such role: {0}")]
    NoSuchRole(String),

    #[error("role already exists: {0}")]
    RoleExists(String),

    #[error("permission name is empty")]
    EmptyPermission,

    // ── Requests ────────────────────────────────────────────────────────────
    #[error("request {0} has already begun")]
    RequestAlreadyBegun(i64),

    #[error("no such request: {0}")]
    NoSuchRequest(i64),

    // ── Dynamic configuration ───────────────────────────────────────────────
    #[error("invalid configuration layer {0:?}: expected bundle, room, group or user")]
    InvalidConfigLayer(String),

    #[error("dynamic configuration field {0} is empty")]
    MissingConfigField(&'static str),

    #[error("no such configuration: {0}")]
    NoSuchConfiguration(String),

    #[error("configuration already exists: {0}")]
    ConfigurationExists(String),

    // ── Manifests ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn no_such_bundle(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::NoSuchBundle {
            name: name.into(),
            version: version.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl switchyard_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

switchyard_common::impl_context!();
