//! User → group → role → permission graph.

use std::{cmp::Ordering, collections::BTreeMap, fmt, iter};

use serde::{Deserialize, Serialize};

/// Name of the bootstrap user; never deletable.
pub const ADMIN_USER: &str = "admin";
/// Name of the bootstrap group; neither it nor its members can be removed.
pub const ADMIN_GROUP: &str = "admin";
/// Name of the bootstrap role.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: String,
    /// Argon2 PHC string; never serialized.
    #[serde(skip)]
    pub password_hash: Option<String>,
    /// Adapter name → provider user ID.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mappings: BTreeMap<String, String>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A permission granted to a role, scoped to the bundle that defines it.
///
/// Equality and ordering follow the `bundle:permission` string form. Bundle
/// names cannot contain `:`, so the string form is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermission {
    pub bundle_name: String,
    pub permission: String,
}

impl RolePermission {
    pub fn new(bundle_name: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            permission: permission.into(),
        }
    }

    /// Parse `bundle:permission`. The first `:` separates the two halves.
    #[must_use]
    pub fn parse(qualified: &str) -> Option<Self> {
        let (bundle, permission) = qualified.split_once(':')?;
        if bundle.is_empty() || permission.is_empty() {
            return None;
        }
        Some(Self::new(bundle, permission))
    }

    fn string_form(&self) -> impl Iterator<Item = u8> + '_ {
        self.bundle_name
            .bytes()
            .chain(iter::once(b':'))
            .chain(self.permission.bytes())
    }
}

impl fmt::Display for RolePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bundle_name, self.permission)
    }
}

impl PartialEq for RolePermission {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RolePermission {}

impl Ord for RolePermission {
    fn cmp(&self, other: &Self) -> Ordering {
        self.string_form().cmp(other.string_form())
    }
}

impl PartialOrd for RolePermission {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
