//! In-process implementation of the data-access contract.
//!
//! All state sits behind one `RwLock`, so every call observes and produces a
//! consistent snapshot; each mutating call holds the write lock for its whole
//! validate-then-apply sequence.

use std::collections::{BTreeMap, BTreeSet};

use {
    async_trait::async_trait,
    regex::Regex,
    tokio::sync::RwLock,
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    access::{
        BundleStore, DynamicConfigurationStore, GroupStore, RequestStore, RoleStore, UserStore,
    },
    bundle::{Bundle, BundleCommand, CommandEntry},
    dynamic::{
        ConfigurationLayer, DynamicConfiguration, config_path, validate_fields, wildcard_matches,
    },
    rbac::{ADMIN_GROUP, ADMIN_USER, Group, Role, RolePermission, User},
    request::{CommandRequest, RequestRecord},
    version::BundleVersion,
};

/// Reference store holding everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct State {
    /// Bundle name → its installed versions.
    bundles: BTreeMap<String, BundleVersions>,
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, GroupRecord>,
    roles: BTreeMap<String, BTreeSet<RolePermission>>,
    requests: BTreeMap<i64, RequestRecord>,
    last_request_id: i64,
    configs: BTreeMap<ConfigKey, DynamicConfiguration>,
}

#[derive(Default)]
struct BundleVersions {
    versions: BTreeMap<BundleVersion, StoredBundle>,
    enabled: Option<BundleVersion>,
}

impl BundleVersions {
    fn enabled_bundle(&self) -> Option<&StoredBundle> {
        self.enabled.as_ref().and_then(|v| self.versions.get(v))
    }

    fn snapshot(&self, version: &BundleVersion, stored: &StoredBundle) -> Bundle {
        let mut bundle = stored.bundle.clone();
        bundle.enabled = self.enabled.as_ref() == Some(version);
        bundle
    }
}

struct StoredBundle {
    bundle: Bundle,
    /// Compiled trigger patterns, per command name.
    triggers: Vec<(String, Vec<Regex>)>,
}

impl StoredBundle {
    fn compile(bundle: Bundle) -> Result<Self> {
        let mut triggers = Vec::new();
        for command in bundle.commands.values() {
            if command.triggers.is_empty() {
                continue;
            }
            let compiled = command
                .triggers
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|source| Error::InvalidTrigger {
                        bundle: bundle.name.clone(),
                        command: command.name.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            triggers.push((command.name.clone(), compiled));
        }
        Ok(Self { bundle, triggers })
    }

    fn entry(&self, command: &BundleCommand) -> CommandEntry {
        let mut bundle = self.bundle.clone();
        bundle.enabled = true;
        CommandEntry::new(bundle, command.clone())
    }
}

#[derive(Default)]
struct GroupRecord {
    users: BTreeSet<String>,
    roles: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ConfigKey {
    layer: ConfigurationLayer,
    bundle: String,
    owner: String,
    key: String,
}

impl ConfigKey {
    fn parse(layer: &str, bundle: &str, owner: &str, key: &str) -> Result<Self> {
        let layer: ConfigurationLayer = layer.parse()?;
        validate_fields(layer, bundle, owner, key)?;
        Ok(Self {
            layer,
            bundle: bundle.to_string(),
            owner: owner.to_string(),
            key: key.to_string(),
        })
    }

    fn path(&self) -> String {
        config_path(self.layer, &self.bundle, &self.owner, &self.key)
    }
}

impl State {
    fn bundle_versions(&self, name: &str) -> Result<&BundleVersions> {
        self.bundles
            .get(name)
            .ok_or_else(|| Error::no_such_bundle(name, ""))
    }

    fn locate_version(&self, name: &str, version: &str) -> Result<BundleVersion> {
        if name.is_empty() {
            return Err(Error::EmptyBundleName);
        }
        let coerced = BundleVersion::coerce(version)?;
        match self.bundles.get(name) {
            Some(versions) if versions.versions.contains_key(&coerced) => Ok(coerced),
            _ => Err(Error::no_such_bundle(name, version)),
        }
    }

    fn require_user(&self, username: &str) -> Result<()> {
        if username.is_empty() {
            return Err(Error::EmptyUserName);
        }
        if !self.users.contains_key(username) {
            return Err(Error::NoSuchUser(username.to_string()));
        }
        Ok(())
    }

    fn require_role(&self, role: &str) -> Result<()> {
        if role.is_empty() {
            return Err(Error::EmptyRoleName);
        }
        if !self.roles.contains_key(role) {
            return Err(Error::NoSuchRole(role.to_string()));
        }
        Ok(())
    }

    fn group_mut(&mut self, group: &str) -> Result<&mut GroupRecord> {
        if group.is_empty() {
            return Err(Error::EmptyGroupName);
        }
        self.groups
            .get_mut(group)
            .ok_or_else(|| Error::NoSuchGroup(group.to_string()))
    }

    fn group_ref(&self, group: &str) -> Result<&GroupRecord> {
        if group.is_empty() {
            return Err(Error::EmptyGroupName);
        }
        self.groups
            .get(group)
            .ok_or_else(|| Error::NoSuchGroup(group.to_string()))
    }

    fn email_taken(&self, email: &str, except: &str) -> bool {
        self.users.values().any(|u| {
            u.username != except
                && u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
        })
    }
}

fn require_email_free(state: &State, user: &User) -> Result<()> {
    if let Some(email) = user.email.as_deref().filter(|e| !e.is_empty())
        && state.email_taken(email, &user.username)
    {
        return Err(Error::DuplicateEmail(email.to_string()));
    }
    Ok(())
}

// ── Bundles ─────────────────────────────────────────────────────────────────

#[async_trait]
impl BundleStore for MemoryStore {
    async fn bundle_create(&self, bundle: Bundle) -> Result<()> {
        let version = bundle.validate()?;
        let enable = bundle.enabled;
        let name = bundle.name.clone();
        let stored = StoredBundle::compile(Bundle {
            enabled: false,
            ..bundle
        })?;

        let mut state = self.state.write().await;
        let versions = state.bundles.entry(name.clone()).or_default();
        if versions.versions.contains_key(&version) {
            return Err(Error::BundleExists {
                name,
                version: stored.bundle.version.clone(),
            });
        }
        versions.versions.insert(version.clone(), stored);
        if enable {
            versions.enabled = Some(version.clone());
        }
        info!(bundle = %name, %version, enabled = enable, "bundle installed");
        Ok(())
    }

    async fn bundle_delete(&self, name: &str, version: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let coerced = state.locate_version(name, version)?;
        if let Some(versions) = state.bundles.get_mut(name) {
            versions.versions.remove(&coerced);
            if versions.enabled.as_ref() == Some(&coerced) {
                versions.enabled = None;
            }
            if versions.versions.is_empty() {
                state.bundles.remove(name);
            }
        }
        info!(bundle = %name, version = %coerced, "bundle deleted");
        Ok(())
    }

    async fn bundle_enable(&self, name: &str, version: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let coerced = state.locate_version(name, version)?;
        if let Some(versions) = state.bundles.get_mut(name) {
            if let Some(previous) = versions.enabled.replace(coerced.clone())
                && previous != coerced
            {
                debug!(bundle = %name, %previous, "disabling sibling version");
            }
        }
        info!(bundle = %name, version = %coerced, "bundle enabled");
        Ok(())
    }

    async fn bundle_disable(&self, name: &str, version: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let coerced = state.locate_version(name, version)?;
        if let Some(versions) = state.bundles.get_mut(name)
            && versions.enabled.as_ref() == Some(&coerced)
        {
            versions.enabled = None;
            info!(bundle = %name, version = %coerced, "bundle disabled");
        }
        Ok(())
    }

    async fn bundle_enabled_version(&self, name: &str) -> Result<Option<String>> {
        if name.is_empty() {
            return Err(Error::EmptyBundleName);
        }
        let state = self.state.read().await;
        Ok(state
            .bundles
            .get(name)
            .and_then(BundleVersions::enabled_bundle)
            .map(|stored| stored.bundle.version.clone()))
    }

    async fn bundle_exists(&self, name: &str, version: &str) -> Result<bool> {
        let state = self.state.read().await;
        match state.locate_version(name, version) {
            Ok(_) => Ok(true),
            Err(Error::NoSuchBundle { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn bundle_get(&self, name: &str, version: &str) -> Result<Bundle> {
        let state = self.state.read().await;
        let coerced = state.locate_version(name, version)?;
        let versions = state.bundle_versions(name)?;
        versions
            .versions
            .get(&coerced)
            .map(|stored| versions.snapshot(&coerced, stored))
            .ok_or_else(|| Error::no_such_bundle(name, version))
    }

    async fn bundle_list(&self) -> Result<Vec<Bundle>> {
        let state = self.state.read().await;
        Ok(state
            .bundles
            .values()
            .flat_map(|versions| {
                versions
                    .versions
                    .iter()
                    .map(|(v, stored)| versions.snapshot(v, stored))
            })
            .collect())
    }

    async fn bundle_list_versions(&self, name: &str) -> Result<Vec<Bundle>> {
        if name.is_empty() {
            return Err(Error::EmptyBundleName);
        }
        let state = self.state.read().await;
        Ok(state
            .bundles
            .get(name)
            .map(|versions| {
                versions
                    .versions
                    .iter()
                    .map(|(v, stored)| versions.snapshot(v, stored))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_command_entry(
        &self,
        bundle_name: &str,
        command_name: &str,
    ) -> Result<Vec<CommandEntry>> {
        let state = self.state.read().await;
        let enabled = state
            .bundles
            .iter()
            .filter(|(name, _)| bundle_name.is_empty() || name.as_str() == bundle_name)
            .filter_map(|(_, versions)| versions.enabled_bundle());

        let mut entries = Vec::new();
        for stored in enabled {
            entries.extend(
                stored
                    .bundle
                    .commands
                    .values()
                    .filter(|c| command_name.is_empty() || c.name == command_name)
                    .map(|c| stored.entry(c)),
            );
        }
        Ok(entries)
    }

    async fn find_command_entry_by_trigger(&self, text: &str) -> Result<Vec<CommandEntry>> {
        let state = self.state.read().await;
        let mut entries = Vec::new();
        for stored in state
            .bundles
            .values()
            .filter_map(BundleVersions::enabled_bundle)
        {
            for (command_name, patterns) in &stored.triggers {
                if !patterns.iter().any(|re| re.is_match(text)) {
                    continue;
                }
                if let Some(command) = stored.bundle.commands.get(command_name) {
                    entries.push(stored.entry(command));
                }
            }
        }
        Ok(entries)
    }
}

// ── Users ───────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_create(&self, user: User) -> Result<()> {
        if user.username.trim().is_empty() {
            return Err(Error::EmptyUserName);
        }
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.username) {
            return Err(Error::UserExists(user.username));
        }
        require_email_free(&state, &user)?;
        debug!(username = %user.username, "user created");
        state.users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn user_get(&self, username: &str) -> Result<User> {
        if username.is_empty() {
            return Err(Error::EmptyUserName);
        }
        let state = self.state.read().await;
        state
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| Error::NoSuchUser(username.to_string()))
    }

    async fn user_get_by_email(&self, email: &str) -> Result<User> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|u| {
                !email.is_empty()
                    && u.email
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned()
            .ok_or_else(|| Error::NoSuchUser(email.to_string()))
    }

    async fn user_update(&self, mut user: User) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_user(&user.username)?;
        require_email_free(&state, &user)?;
        if let Some(existing) = state.users.get_mut(&user.username) {
            if user.password_hash.is_none() {
                user.password_hash = existing.password_hash.take();
            }
            *existing = user;
        }
        Ok(())
    }

    async fn user_delete(&self, username: &str) -> Result<()> {
        if username == ADMIN_USER {
            return Err(Error::AdminUndeletable("user"));
        }
        let mut state = self.state.write().await;
        state.require_user(username)?;
        state.users.remove(username);
        for group in state.groups.values_mut() {
            group.users.remove(username);
        }
        debug!(username, "user deleted");
        Ok(())
    }

    async fn user_exists(&self, username: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.users.contains_key(username))
    }

    async fn user_list(&self) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn user_group_list(&self, username: &str) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        state.require_user(username)?;
        Ok(state
            .groups
            .iter()
            .filter(|(_, record)| record.users.contains(username))
            .map(|(name, _)| Group::new(name.clone()))
            .collect())
    }
}

// ── Groups ──────────────────────────────────────────────────────────────────

#[async_trait]
impl GroupStore for MemoryStore {
    async fn group_create(&self, group: Group) -> Result<()> {
        if group.name.trim().is_empty() {
            return Err(Error::EmptyGroupName);
        }
        let mut state = self.state.write().await;
        if state.groups.contains_key(&group.name) {
            return Err(Error::GroupExists(group.name));
        }
        state.groups.insert(group.name, GroupRecord::default());
        Ok(())
    }

    async fn group_get(&self, name: &str) -> Result<Group> {
        let state = self.state.read().await;
        state.group_ref(name)?;
        Ok(Group::new(name))
    }

    async fn group_list(&self) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.keys().cloned().map(Group::new).collect())
    }

    async fn group_delete(&self, name: &str) -> Result<()> {
        if name == ADMIN_GROUP {
            return Err(Error::AdminUndeletable("group"));
        }
        let mut state = self.state.write().await;
        state.group_ref(name)?;
        state.groups.remove(name);
        Ok(())
    }

    async fn group_exists(&self, name: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.groups.contains_key(name))
    }

    async fn group_user_add(&self, group: &str, username: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.group_ref(group)?;
        state.require_user(username)?;
        state.group_mut(group)?.users.insert(username.to_string());
        Ok(())
    }

    async fn group_user_delete(&self, group: &str, username: &str) -> Result<()> {
        if group == ADMIN_GROUP && username == ADMIN_USER {
            return Err(Error::AdminUndeletable("group member"));
        }
        let mut state = self.state.write().await;
        state.group_ref(group)?;
        state.require_user(username)?;
        state.group_mut(group)?.users.remove(username);
        Ok(())
    }

    async fn group_user_list(&self, group: &str) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let record = state.group_ref(group)?;
        Ok(record
            .users
            .iter()
            .filter_map(|name| state.users.get(name).cloned())
            .collect())
    }

    async fn group_role_add(&self, group: &str, role: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.group_ref(group)?;
        state.require_role(role)?;
        state.group_mut(group)?.roles.insert(role.to_string());
        Ok(())
    }

    async fn group_role_delete(&self, group: &str, role: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.group_ref(group)?;
        state.require_role(role)?;
        state.group_mut(group)?.roles.remove(role);
        Ok(())
    }

    async fn group_role_list(&self, group: &str) -> Result<Vec<Role>> {
        let state = self.state.read().await;
        let record = state.group_ref(group)?;
        Ok(record.roles.iter().cloned().map(Role::new).collect())
    }
}

// ── Roles ───────────────────────────────────────────────────────────────────

#[async_trait]
impl RoleStore for MemoryStore {
    async fn role_create(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::EmptyRoleName);
        }
        let mut state = self.state.write().await;
        if state.roles.contains_key(name) {
            return Err(Error::RoleExists(name.to_string()));
        }
        state.roles.insert(name.to_string(), BTreeSet::new());
        Ok(())
    }

    async fn role_get(&self, name: &str) -> Result<Role> {
        let state = self.state.read().await;
        state.require_role(name)?;
        Ok(Role::new(name))
    }

    async fn role_delete(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_role(name)?;
        state.roles.remove(name);
        for group in state.groups.values_mut() {
            group.roles.remove(name);
        }
        Ok(())
    }

    async fn role_exists(&self, name: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.roles.contains_key(name))
    }

    async fn role_list(&self) -> Result<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.keys().cloned().map(Role::new).collect())
    }

    async fn role_permission_add(
        &self,
        role: &str,
        bundle: &str,
        permission: &str,
    ) -> Result<()> {
        let grant = validate_grant(bundle, permission)?;
        let mut state = self.state.write().await;
        state.require_role(role)?;
        if let Some(perms) = state.roles.get_mut(role) {
            perms.insert(grant);
        }
        Ok(())
    }

    async fn role_permission_delete(
        &self,
        role: &str,
        bundle: &str,
        permission: &str,
    ) -> Result<()> {
        let grant = validate_grant(bundle, permission)?;
        let mut state = self.state.write().await;
        state.require_role(role)?;
        if let Some(perms) = state.roles.get_mut(role) {
            perms.remove(&grant);
        }
        Ok(())
    }

    async fn role_permission_list(&self, role: &str) -> Result<Vec<RolePermission>> {
        let state = self.state.read().await;
        state.require_role(role)?;
        Ok(state
            .roles
            .get(role)
            .map(|perms| perms.iter().cloned().collect())
            .unwrap_or_default())
    }
}

fn validate_grant(bundle: &str, permission: &str) -> Result<RolePermission> {
    if bundle.is_empty() {
        return Err(Error::EmptyBundleName);
    }
    if bundle.contains(':') {
        return Err(Error::InvalidBundleName {
            name: bundle.to_string(),
        });
    }
    if permission.is_empty() {
        return Err(Error::EmptyPermission);
    }
    Ok(RolePermission::new(bundle, permission))
}

// ── Requests ────────────────────────────────────────────────────────────────

#[async_trait]
impl RequestStore for MemoryStore {
    async fn request_begin(&self, request: &mut CommandRequest) -> Result<()> {
        if request.request_id() != 0 {
            return Err(Error::RequestAlreadyBegun(request.request_id()));
        }
        let mut state = self.state.write().await;
        let id = state.last_request_id + 1;
        request.assign_id(id)?;
        state.last_request_id = id;
        state.requests.insert(id, RequestRecord {
            request: request.clone(),
            status: None,
            error: None,
            closed_at: None,
        });
        Ok(())
    }

    async fn request_close(
        &self,
        request_id: i64,
        status: i16,
        error: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let record = state
            .requests
            .get_mut(&request_id)
            .ok_or(Error::NoSuchRequest(request_id))?;
        record.status = Some(status);
        record.error = error.map(str::to_string);
        record.closed_at = Some(switchyard_common::now_ms());
        Ok(())
    }

    async fn request_get(&self, request_id: i64) -> Result<RequestRecord> {
        let state = self.state.read().await;
        state
            .requests
            .get(&request_id)
            .cloned()
            .ok_or(Error::NoSuchRequest(request_id))
    }
}

// ── Dynamic configuration ───────────────────────────────────────────────────

#[async_trait]
impl DynamicConfigurationStore for MemoryStore {
    async fn dynamic_configuration_create(&self, config: DynamicConfiguration) -> Result<()> {
        config.validate()?;
        let key = ConfigKey {
            layer: config.layer,
            bundle: config.bundle.clone(),
            owner: config.owner.clone(),
            key: config.key.clone(),
        };
        let mut state = self.state.write().await;
        if state.configs.contains_key(&key) {
            return Err(Error::ConfigurationExists(key.path()));
        }
        state.configs.insert(key, config);
        Ok(())
    }

    async fn dynamic_configuration_get(
        &self,
        layer: &str,
        bundle: &str,
        owner: &str,
        key: &str,
    ) -> Result<DynamicConfiguration> {
        let key = ConfigKey::parse(layer, bundle, owner, key)?;
        let state = self.state.read().await;
        state
            .configs
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NoSuchConfiguration(key.path()))
    }

    async fn dynamic_configuration_delete(
        &self,
        layer: &str,
        bundle: &str,
        owner: &str,
        key: &str,
    ) -> Result<()> {
        let key = ConfigKey::parse(layer, bundle, owner, key)?;
        let mut state = self.state.write().await;
        state
            .configs
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| Error::NoSuchConfiguration(key.path()))
    }

    async fn dynamic_configuration_exists(
        &self,
        layer: &str,
        bundle: &str,
        owner: &str,
        key: &str,
    ) -> Result<bool> {
        let key = ConfigKey::parse(layer, bundle, owner, key)?;
        let state = self.state.read().await;
        Ok(state.configs.contains_key(&key))
    }

    async fn dynamic_configuration_list(
        &self,
        layer: &str,
        bundle: &str,
        owner: &str,
        key: &str,
    ) -> Result<Vec<DynamicConfiguration>> {
        let layer: ConfigurationLayer = layer.parse()?;
        let state = self.state.read().await;
        Ok(state
            .configs
            .values()
            .filter(|c| {
                c.layer == layer
                    && wildcard_matches(bundle, &c.bundle)
                    && wildcard_matches(owner, &c.owner)
                    && wildcard_matches(key, &c.key)
            })
            .map(|c| {
                let mut c = c.clone();
                if c.secret {
                    c.value = "[REDACTED]".into();
                }
                c
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(name: &str, version: &str, commands: &[&str]) -> Bundle {
        commands.iter().fold(Bundle::new(name, version), |b, c| {
            b.with_command(BundleCommand::new(*c).with_rules(["allow"]))
        })
    }

    // ── bundles ──

    #[tokio::test]
    async fn create_rejects_duplicates_and_bad_input() {
        let store = MemoryStore::new();
        store.bundle_create(bundle("test", "1.0", &["cmd"])).await.unwrap();

        assert!(matches!(
            store.bundle_create(bundle("test", "1.0.0", &["cmd"])).await,
            Err(Error::BundleExists { .. })
        ));
        assert!(matches!(
            store.bundle_create(bundle("", "1", &[])).await,
            Err(Error::EmptyBundleName)
        ));
        assert!(matches!(
            store.bundle_create(bundle("x", "", &[])).await,
            Err(Error::EmptyBundleVersion)
        ));
        assert!(matches!(
            store.bundle_create(bundle("x", "one", &[])).await,
            Err(Error::InvalidBundleVersion { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_trigger_is_rejected_atomically() {
        let store = MemoryStore::new();
        let b = Bundle::new("bad", "1")
            .with_command(BundleCommand::new("cmd").with_triggers(["(unclosed"]));
        assert!(matches!(
            store.bundle_create(b).await,
            Err(Error::InvalidTrigger { .. })
        ));
        assert!(!store.bundle_exists("bad", "1").await.unwrap());
    }

    #[tokio::test]
    async fn enabling_disables_siblings() {
        let store = MemoryStore::new();
        store.bundle_create(bundle("test", "1.0", &["cmd"])).await.unwrap();
        store.bundle_create(bundle("test", "2.0", &["cmd"])).await.unwrap();

        store.bundle_enable("test", "1.0").await.unwrap();
        assert_eq!(
            store.bundle_enabled_version("test").await.unwrap().as_deref(),
            Some("1.0")
        );

        store.bundle_enable("test", "2.0").await.unwrap();
        assert_eq!(
            store.bundle_enabled_version("test").await.unwrap().as_deref(),
            Some("2.0")
        );
        let versions = store.bundle_list_versions("test").await.unwrap();
        let flags: Vec<(&str, bool)> = versions
            .iter()
            .map(|b| (b.version.as_str(), b.enabled))
            .collect();
        assert_eq!(flags, vec![("1.0", false), ("2.0", true)]);

        let entries = store.find_command_entry("test", "cmd").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bundle().version, "2.0");
    }

    #[tokio::test]
    async fn created_enabled_flag_is_honoured() {
        let store = MemoryStore::new();
        let mut first = bundle("test", "1", &["cmd"]);
        first.enabled = true;
        store.bundle_create(first).await.unwrap();
        let mut second = bundle("test", "2", &["cmd"]);
        second.enabled = true;
        store.bundle_create(second).await.unwrap();

        assert_eq!(
            store.bundle_enabled_version("test").await.unwrap().as_deref(),
            Some("2")
        );
        assert!(!store.bundle_get("test", "1").await.unwrap().enabled);
    }

    #[tokio::test]
    async fn disable_and_delete() {
        let store = MemoryStore::new();
        store.bundle_create(bundle("test", "1", &["cmd"])).await.unwrap();
        store.bundle_enable("test", "1").await.unwrap();

        // Disabling a version that is not enabled leaves the enabled one alone.
        store.bundle_create(bundle("test", "2", &["cmd"])).await.unwrap();
        store.bundle_disable("test", "2").await.unwrap();
        assert_eq!(
            store.bundle_enabled_version("test").await.unwrap().as_deref(),
            Some("1")
        );

        store.bundle_disable("test", "1").await.unwrap();
        assert!(store.bundle_enabled_version("test").await.unwrap().is_none());
        assert!(store.find_command_entry("", "cmd").await.unwrap().is_empty());

        store.bundle_delete("test", "1").await.unwrap();
        assert!(matches!(
            store.bundle_get("test", "1").await,
            Err(Error::NoSuchBundle { .. })
        ));
        assert!(matches!(
            store.bundle_enable("test", "1").await,
            Err(Error::NoSuchBundle { .. })
        ));
        assert_eq!(store.bundle_list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_with_wildcards_sees_only_enabled() {
        let store = MemoryStore::new();
        store.bundle_create(bundle("a", "1", &["cmd", "other"])).await.unwrap();
        store.bundle_create(bundle("b", "1", &["cmd"])).await.unwrap();
        store.bundle_create(bundle("c", "1", &["cmd"])).await.unwrap();
        store.bundle_enable("a", "1").await.unwrap();
        store.bundle_enable("b", "1").await.unwrap();

        let names: Vec<String> = store
            .find_command_entry("", "cmd")
            .await
            .unwrap()
            .iter()
            .map(CommandEntry::qualified_name)
            .collect();
        assert_eq!(names, vec!["a:cmd", "b:cmd"]);
        assert_eq!(store.find_command_entry("a", "").await.unwrap().len(), 2);
        assert!(store.find_command_entry("c", "cmd").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trigger_lookup_matches_raw_text() {
        let store = MemoryStore::new();
        let b = Bundle::new("ship", "1").with_command(
            BundleCommand::new("it")
                .with_triggers([r"^ship it\b"])
                .with_rules(["allow"]),
        );
        store.bundle_create(b).await.unwrap();
        assert!(
            store
                .find_command_entry_by_trigger("ship it now")
                .await
                .unwrap()
                .is_empty(),
            "disabled bundles have no live triggers"
        );

        store.bundle_enable("ship", "1").await.unwrap();
        let hits = store
            .find_command_entry_by_trigger("ship it now")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].qualified_name(), "ship:it");
        assert!(
            store
                .find_command_entry_by_trigger("please ship it")
                .await
                .unwrap()
                .is_empty()
        );
    }

    // ── users / groups / roles ──

    #[tokio::test]
    async fn user_uniqueness() {
        let store = MemoryStore::new();
        store
            .user_create(User::new("alice").with_email("alice@example.com"))
            .await
            .unwrap();
        assert!(matches!(
            store.user_create(User::new("alice")).await,
            Err(Error::UserExists(_))
        ));
        assert!(matches!(
            store
                .user_create(User::new("alice2").with_email("ALICE@example.com"))
                .await,
            Err(Error::DuplicateEmail(_))
        ));
        assert!(matches!(
            store.user_create(User::new(" ")).await,
            Err(Error::EmptyUserName)
        ));
        let found = store.user_get_by_email("Alice@Example.com").await.unwrap();
        assert_eq!(found.username, "alice");
        assert!(matches!(
            store.user_get_by_email("bob@example.com").await,
            Err(Error::NoSuchUser(_))
        ));
    }

    #[tokio::test]
    async fn update_keeps_password_hash() {
        let store = MemoryStore::new();
        let mut alice = User::new("alice");
        alice.password_hash = Some("hash".into());
        store.user_create(alice).await.unwrap();

        let mut update = User::new("alice").with_email("a@example.com");
        update.full_name = "Alice".into();
        store.user_update(update).await.unwrap();

        let stored = store.user_get("alice").await.unwrap();
        assert_eq!(stored.full_name, "Alice");
        assert_eq!(stored.password_hash.as_deref(), Some("hash"));
        assert!(matches!(
            store.user_update(User::new("ghost")).await,
            Err(Error::NoSuchUser(_))
        ));
    }

    #[tokio::test]
    async fn admin_is_protected() {
        let store = MemoryStore::new();
        store.user_create(User::new(ADMIN_USER)).await.unwrap();
        store.group_create(Group::new(ADMIN_GROUP)).await.unwrap();
        store.group_user_add(ADMIN_GROUP, ADMIN_USER).await.unwrap();

        assert!(matches!(
            store.user_delete(ADMIN_USER).await,
            Err(Error::AdminUndeletable(_))
        ));
        assert!(matches!(
            store.group_delete(ADMIN_GROUP).await,
            Err(Error::AdminUndeletable(_))
        ));
        assert!(matches!(
            store.group_user_delete(ADMIN_GROUP, ADMIN_USER).await,
            Err(Error::AdminUndeletable(_))
        ));
        assert_eq!(store.group_user_list(ADMIN_GROUP).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn edges_require_both_endpoints() {
        let store = MemoryStore::new();
        store.group_create(Group::new("ops")).await.unwrap();
        store.role_create("deployer").await.unwrap();

        assert!(matches!(
            store.group_user_add("ops", "ghost").await,
            Err(Error::NoSuchUser(_))
        ));
        assert!(matches!(
            store.group_user_add("nope", "ghost").await,
            Err(Error::NoSuchGroup(_))
        ));
        assert!(matches!(
            store.group_role_add("ops", "ghost").await,
            Err(Error::NoSuchRole(_))
        ));
        assert!(matches!(
            store.role_permission_add("ghost", "deploy", "prod").await,
            Err(Error::NoSuchRole(_))
        ));
        assert!(matches!(
            store.role_permission_add("deployer", "", "prod").await,
            Err(Error::EmptyBundleName)
        ));
        assert!(matches!(
            store.role_permission_add("deployer", "deploy", "").await,
            Err(Error::EmptyPermission)
        ));
        assert!(store.group_role_list("ops").await.unwrap().is_empty());
        assert!(store.role_permission_list("deployer").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deletes_cascade_to_edges() {
        let store = MemoryStore::new();
        store.user_create(User::new("bob")).await.unwrap();
        store.group_create(Group::new("ops")).await.unwrap();
        store.role_create("deployer").await.unwrap();
        store.group_user_add("ops", "bob").await.unwrap();
        store.group_role_add("ops", "deployer").await.unwrap();
        store
            .role_permission_add("deployer", "deploy", "prod")
            .await
            .unwrap();

        assert_eq!(store.user_group_list("bob").await.unwrap(), vec![Group::new("ops")]);

        store.role_delete("deployer").await.unwrap();
        assert!(store.group_role_list("ops").await.unwrap().is_empty());

        store.user_delete("bob").await.unwrap();
        assert!(store.group_user_list("ops").await.unwrap().is_empty());

        store.group_delete("ops").await.unwrap();
        assert!(!store.group_exists("ops").await.unwrap());
    }

    #[tokio::test]
    async fn role_permissions_deduplicate() {
        let store = MemoryStore::new();
        store.role_create("r").await.unwrap();
        store.role_permission_add("r", "deploy", "prod").await.unwrap();
        store.role_permission_add("r", "deploy", "prod").await.unwrap();
        store.role_permission_add("r", "deploy", "dev").await.unwrap();
        let listed: Vec<String> = store
            .role_permission_list("r")
            .await
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(listed, vec!["deploy:dev", "deploy:prod"]);

        store.role_permission_delete("r", "deploy", "dev").await.unwrap();
        assert_eq!(store.role_permission_list("r").await.unwrap().len(), 1);
        assert!(matches!(
            store.role_create("r").await,
            Err(Error::RoleExists(_))
        ));
    }

    // ── requests ──

    #[tokio::test]
    async fn request_ids_are_assigned_once() {
        let store = MemoryStore::new();
        let b = bundle("test", "1", &["cmd"]);
        let command = b.commands["cmd"].clone();
        let entry = CommandEntry::new(b, command);
        let mut first = CommandRequest::new(entry.clone(), "a", "C", "U", "alice", vec![]);
        let mut second = CommandRequest::new(entry, "a", "C", "U", "alice", vec![]);

        store.request_begin(&mut first).await.unwrap();
        store.request_begin(&mut second).await.unwrap();
        assert_eq!(first.request_id(), 1);
        assert_eq!(second.request_id(), 2);

        assert!(matches!(
            store.request_begin(&mut first).await,
            Err(Error::RequestAlreadyBegun(1))
        ));
        assert_eq!(first.request_id(), 1);

        store.request_close(2, 1, Some("boom")).await.unwrap();
        let record = store.request_get(2).await.unwrap();
        assert_eq!(record.status, Some(1));
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.closed_at.is_some());
        assert!(matches!(
            store.request_close(99, 0, None).await,
            Err(Error::NoSuchRequest(99))
        ));
    }

    // ── dynamic configuration ──

    fn config(layer: ConfigurationLayer, owner: &str, key: &str, secret: bool) -> DynamicConfiguration {
        DynamicConfiguration {
            layer,
            bundle: "deploy".into(),
            owner: owner.into(),
            key: key.into(),
            value: "v".into(),
            secret,
        }
    }

    #[tokio::test]
    async fn dynamic_configuration_crud() {
        let store = MemoryStore::new();
        store
            .dynamic_configuration_create(config(ConfigurationLayer::Bundle, "", "region", false))
            .await
            .unwrap();
        store
            .dynamic_configuration_create(config(ConfigurationLayer::User, "alice", "token", true))
            .await
            .unwrap();
        store
            .dynamic_configuration_create(config(ConfigurationLayer::User, "bob", "token", true))
            .await
            .unwrap();

        assert!(matches!(
            store
                .dynamic_configuration_create(config(ConfigurationLayer::Bundle, "", "region", false))
                .await,
            Err(Error::ConfigurationExists(_))
        ));

        let got = store
            .dynamic_configuration_get("USER", "deploy", "alice", "token")
            .await
            .unwrap();
        assert_eq!(got.value, "v");

        let listed = store
            .dynamic_configuration_list("user", "deploy", "*", "")
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|c| c.value == "[REDACTED]"));

        assert!(matches!(
            store.dynamic_configuration_list("planet", "*", "*", "*").await,
            Err(Error::InvalidConfigLayer(_))
        ));
        assert!(matches!(
            store
                .dynamic_configuration_get("room", "deploy", "", "k")
                .await,
            Err(Error::MissingConfigField("owner"))
        ));

        store
            .dynamic_configuration_delete("user", "deploy", "bob", "token")
            .await
            .unwrap();
        assert!(
            !store
                .dynamic_configuration_exists("user", "deploy", "bob", "token")
                .await
                .unwrap()
        );
        assert!(matches!(
            store
                .dynamic_configuration_delete("user", "deploy", "bob", "token")
                .await,
            Err(Error::NoSuchConfiguration(_))
        ));
    }
}
