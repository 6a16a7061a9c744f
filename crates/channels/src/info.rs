use serde::{Deserialize, Serialize};

/// Which provider a connection talks to, and the name it was registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider type, e.g. "slack" or "discord".
    pub kind: String,
    /// Adapter name from configuration; unique per process.
    pub name: String,
}

impl ProviderInfo {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Snapshot of a provider channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Provider-specific opaque identifier.
    pub id: String,
    pub name: String,
    /// Provider user IDs of the channel members, when known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// Snapshot of a provider user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Provider-specific opaque identifier.
    pub id: String,
    /// Handle, e.g. "alice".
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserInfo {
    /// Best human-readable name: display name, then real name, then handle.
    #[must_use]
    pub fn preferred_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.real_name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_name_fallbacks() {
        let mut user = UserInfo {
            id: "U1".into(),
            name: "alice".into(),
            ..Default::default()
        };
        assert_eq!(user.preferred_name(), "alice");
        user.real_name = Some("Alice Liddell".into());
        assert_eq!(user.preferred_name(), "Alice Liddell");
        user.display_name = Some(String::new());
        assert_eq!(user.preferred_name(), "Alice Liddell");
        user.display_name = Some("Al".into());
        assert_eq!(user.preferred_name(), "Al");
    }
}
