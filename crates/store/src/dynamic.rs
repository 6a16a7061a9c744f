//! Layered key-value configuration for bundles.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scope a dynamic configuration value applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationLayer {
    Bundle,
    Room,
    Group,
    User,
}

impl ConfigurationLayer {
    pub const ALL: [Self; 4] = [Self::Bundle, Self::Room, Self::Group, Self::User];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bundle => "bundle",
            Self::Room => "room",
            Self::Group => "group",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ConfigurationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationLayer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidConfigLayer(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicConfiguration {
    pub layer: ConfigurationLayer,
    pub bundle: String,
    /// Room, group or user name; empty for the bundle layer.
    #[serde(default)]
    pub owner: String,
    pub key: String,
    pub value: String,
    /// Secret values are redacted when listed.
    #[serde(default)]
    pub secret: bool,
}

impl DynamicConfiguration {
    /// Check required fields for the configuration's layer.
    pub fn validate(&self) -> Result<()> {
        validate_fields(self.layer, &self.bundle, &self.owner, &self.key)
    }

    /// `layer/bundle/owner/key`, used in error messages.
    #[must_use]
    pub fn path(&self) -> String {
        config_path(self.layer, &self.bundle, &self.owner, &self.key)
    }
}

pub(crate) fn validate_fields(
    layer: ConfigurationLayer,
    bundle: &str,
    owner: &str,
    key: &str,
) -> Result<()> {
    if bundle.is_empty() {
        return Err(Error::MissingConfigField("bundle"));
    }
    if layer != ConfigurationLayer::Bundle && owner.is_empty() {
        return Err(Error::MissingConfigField("owner"));
    }
    if key.is_empty() {
        return Err(Error::MissingConfigField("key"));
    }
    Ok(())
}

pub(crate) fn config_path(layer: ConfigurationLayer, bundle: &str, owner: &str, key: &str) -> String {
    format!("{layer}/{bundle}/{owner}/{key}")
}

/// Listing filter: empty or `*` matches anything.
pub(crate) fn wildcard_matches(filter: &str, value: &str) -> bool {
    filter.is_empty() || filter == "*" || filter == value
}
