//! Data-access contract consumed by the dispatch core.
//!
//! Every mutating call is atomic: it either applies fully or leaves the
//! store unchanged, and it checks that every referenced entity exists before
//! touching anything.

use async_trait::async_trait;

use crate::{
    Result,
    bundle::{Bundle, CommandEntry},
    dynamic::DynamicConfiguration,
    rbac::{Group, Role, RolePermission, User},
    request::{CommandRequest, RequestRecord},
};

#[async_trait]
pub trait BundleStore: Send + Sync {
    /// Install a bundle version. A bundle created with `enabled = true` is
    /// enabled as if by [`bundle_enable`](Self::bundle_enable).
    async fn bundle_create(&self, bundle: Bundle) -> Result<()>;
    async fn bundle_delete(&self, name: &str, version: &str) -> Result<()>;
    /// Enable one version, disabling every sibling version of the same name.
    async fn bundle_enable(&self, name: &str, version: &str) -> Result<()>;
    async fn bundle_disable(&self, name: &str, version: &str) -> Result<()>;
    /// The enabled version of `name`, if any.
    async fn bundle_enabled_version(&self, name: &str) -> Result<Option<String>>;
    async fn bundle_exists(&self, name: &str, version: &str) -> Result<bool>;
    async fn bundle_get(&self, name: &str, version: &str) -> Result<Bundle>;
    /// Every installed version of every bundle.
    async fn bundle_list(&self) -> Result<Vec<Bundle>>;
    /// Installed versions of `name`, oldest first.
    async fn bundle_list_versions(&self, name: &str) -> Result<Vec<Bundle>>;

    /// Enabled commands matching the names; an empty name matches any.
    async fn find_command_entry(
        &self,
        bundle_name: &str,
        command_name: &str,
    ) -> Result<Vec<CommandEntry>>;

    /// Enabled commands with a trigger pattern matching the raw message text.
    async fn find_command_entry_by_trigger(&self, text: &str) -> Result<Vec<CommandEntry>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UserExists` / `DuplicateEmail` when the username or email
    /// is already taken.
    async fn user_create(&self, user: User) -> Result<()>;
    async fn user_get(&self, username: &str) -> Result<User>;
    /// Case-insensitive email lookup.
    async fn user_get_by_email(&self, email: &str) -> Result<User>;
    /// Replace a user's fields. A `None` password hash keeps the current one.
    async fn user_update(&self, user: User) -> Result<()>;
    /// Also removes the user from every group.
    async fn user_delete(&self, username: &str) -> Result<()>;
    async fn user_exists(&self, username: &str) -> Result<bool>;
    async fn user_list(&self) -> Result<Vec<User>>;
    async fn user_group_list(&self, username: &str) -> Result<Vec<Group>>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn group_create(&self, group: Group) -> Result<()>;
    async fn group_get(&self, name: &str) -> Result<Group>;
    async fn group_list(&self) -> Result<Vec<Group>>;
    async fn group_delete(&self, name: &str) -> Result<()>;
    async fn group_exists(&self, name: &str) -> Result<bool>;
    async fn group_user_add(&self, group: &str, username: &str) -> Result<()>;
    async fn group_user_delete(&self, group: &str, username: &str) -> Result<()>;
    async fn group_user_list(&self, group: &str) -> Result<Vec<User>>;
    async fn group_role_add(&self, group: &str, role: &str) -> Result<()>;
    async fn group_role_delete(&self, group: &str, role: &str) -> Result<()>;
    async fn group_role_list(&self, group: &str) -> Result<Vec<Role>>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn role_create(&self, name: &str) -> Result<()>;
    async fn role_get(&self, name: &str) -> Result<Role>;
    /// Also removes the role from every group.
    async fn role_delete(&self, name: &str) -> Result<()>;
    async fn role_exists(&self, name: &str) -> Result<bool>;
    async fn role_list(&self) -> Result<Vec<Role>>;
    async fn role_permission_add(&self, role: &str, bundle: &str, permission: &str)
    -> Result<()>;
    async fn role_permission_delete(
        &self,
        role: &str,
        bundle: &str,
        permission: &str,
    ) -> Result<()>;
    async fn role_permission_list(&self, role: &str) -> Result<Vec<RolePermission>>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Assign the next request identifier and record the request. Fails with
    /// `RequestAlreadyBegun` if the request already has one.
    async fn request_begin(&self, request: &mut CommandRequest) -> Result<()>;
    /// Record the outcome of a begun request.
    async fn request_close(&self, request_id: i64, status: i16, error: Option<&str>)
    -> Result<()>;
    async fn request_get(&self, request_id: i64) -> Result<RequestRecord>;
}

/// Layer names are parsed case-insensitively; anything other than bundle,
/// room, group or user fails with `InvalidConfigLayer`.
#[async_trait]
pub trait DynamicConfigurationStore: Send + Sync {
    async fn dynamic_configuration_create(&self, config: DynamicConfiguration) -> Result<()>;
    async fn dynamic_configuration_get(
        &self,
        layer: &str,
        bundle: &str,
        owner: &str,
        key: &str,
    ) -> Result<DynamicConfiguration>;
    async fn dynamic_configuration_delete(
        &self,
        layer: &str,
        bundle: &str,
        owner: &str,
        key: &str,
    ) -> Result<()>;
    async fn dynamic_configuration_exists(
        &self,
        layer: &str,
        bundle: &str,
        owner: &str,
        key: &str,
    ) -> Result<bool>;
    /// `bundle`, `owner` and `key` accept `*` or an empty string as wildcards.
    async fn dynamic_configuration_list(
        &self,
        layer: &str,
        bundle: &str,
        owner: &str,
        key: &str,
    ) -> Result<Vec<DynamicConfiguration>>;
}

/// The full data-access surface.
pub trait DataAccess:
    BundleStore + UserStore + GroupStore + RoleStore + RequestStore + DynamicConfigurationStore
{
}

impl<T> DataAccess for T where
    T: BundleStore + UserStore + GroupStore + RoleStore + RequestStore + DynamicConfigurationStore
{
}
