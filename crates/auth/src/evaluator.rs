//! Effective permissions over the user → group → role → permission graph.
//!
//! Nothing is cached: group and role membership may change between calls, so
//! every query walks the graph again.

use std::{collections::BTreeSet, sync::Arc};

use {
    switchyard_store::{CommandEntry, DataAccess, RolePermission},
    tracing::debug,
};

use crate::{
    Error, Result,
    rules::{Decision, evaluate_rules},
};

#[derive(Clone)]
pub struct PermissionEvaluator {
    store: Arc<dyn DataAccess>,
}

impl PermissionEvaluator {
    pub fn new(store: Arc<dyn DataAccess>) -> Self {
        Self { store }
    }

    /// Union of the permissions of every role granted to `group`, sorted by
    /// `bundle:permission`.
    pub async fn group_permissions(&self, group: &str) -> Result<Vec<RolePermission>> {
        let mut granted = BTreeSet::new();
        self.collect_group(group, &mut granted).await?;
        Ok(granted.into_iter().collect())
    }

    /// Union over all of the user's groups, deduplicated and sorted.
    pub async fn user_permissions(&self, username: &str) -> Result<Vec<RolePermission>> {
        Ok(self.user_permission_set(username).await?.into_iter().collect())
    }

    pub async fn user_has_permission(
        &self,
        username: &str,
        bundle: &str,
        permission: &str,
    ) -> Result<bool> {
        let wanted = RolePermission::new(bundle, permission);
        Ok(self.user_permission_set(username).await?.contains(&wanted))
    }

    /// Apply the command's rules for `username`.
    ///
    /// Permissions are only looked up when some rule actually names one.
    pub async fn authorize(&self, username: &str, entry: &CommandEntry) -> Result<()> {
        let rules = &entry.command().rules;
        let granted = if rules.iter().all(|r| crate::rules::is_unconditional(r)) {
            BTreeSet::new()
        } else {
            self.user_permission_set(username).await?
        };
        match evaluate_rules(rules, &granted) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                debug!(user = username, command = %entry.qualified_name(), %reason, "denied");
                Err(Error::unauthorized(username, entry.qualified_name(), reason))
            },
        }
    }

    async fn user_permission_set(&self, username: &str) -> Result<BTreeSet<RolePermission>> {
        let mut granted = BTreeSet::new();
        for group in self.store.user_group_list(username).await? {
            self.collect_group(&group.name, &mut granted).await?;
        }
        Ok(granted)
    }

    async fn collect_group(
        &self,
        group: &str,
        granted: &mut BTreeSet<RolePermission>,
    ) -> Result<()> {
        for role in self.store.group_role_list(group).await? {
            granted.extend(self.store.role_permission_list(&role.name).await?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        switchyard_store::{
            Bundle, BundleCommand, Group, GroupStore, MemoryStore, RoleStore, User, UserStore,
        },
    };

    async fn graph() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.user_create(User::new("alice")).await.unwrap();
        for group in ["ops", "dev"] {
            store.group_create(Group::new(group)).await.unwrap();
            store.group_user_add(group, "alice").await.unwrap();
        }
        store.role_create("deployer").await.unwrap();
        store.role_create("reader").await.unwrap();
        store.role_permission_add("deployer", "deploy", "prod").await.unwrap();
        store.role_permission_add("deployer", "logs", "read").await.unwrap();
        store.role_permission_add("reader", "logs", "read").await.unwrap();
        store.role_permission_add("reader", "logs", "tail").await.unwrap();
        store.group_role_add("ops", "deployer").await.unwrap();
        store.group_role_add("dev", "reader").await.unwrap();
        store
    }

    fn names(perms: &[RolePermission]) -> Vec<String> {
        perms.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn union_across_groups_without_duplicates() {
        let evaluator = PermissionEvaluator::new(graph().await);
        let perms = evaluator.user_permissions("alice").await.unwrap();
        assert_eq!(names(&perms), ["deploy:prod", "logs:read", "logs:tail"]);

        assert_eq!(
            names(&evaluator.group_permissions("dev").await.unwrap()),
            ["logs:read", "logs:tail"]
        );
        assert!(evaluator.user_has_permission("alice", "deploy", "prod").await.unwrap());
        assert!(!evaluator.user_has_permission("alice", "deploy", "dev").await.unwrap());
    }

    #[tokio::test]
    async fn recomputed_after_membership_changes() {
        let store = graph().await;
        let evaluator = PermissionEvaluator::new(store.clone());
        assert!(evaluator.user_has_permission("alice", "deploy", "prod").await.unwrap());

        store.group_user_delete("ops", "alice").await.unwrap();
        assert!(!evaluator.user_has_permission("alice", "deploy", "prod").await.unwrap());

        store.role_permission_add("reader", "deploy", "prod").await.unwrap();
        assert!(evaluator.user_has_permission("alice", "deploy", "prod").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_is_an_error() {
        let evaluator = PermissionEvaluator::new(graph().await);
        assert!(matches!(
            evaluator.user_permissions("ghost").await,
            Err(Error::Store(switchyard_store::Error::NoSuchUser(_)))
        ));
    }

    fn entry(rules: &[&str]) -> CommandEntry {
        let bundle = Bundle::new("deploy", "1")
            .with_command(BundleCommand::new("ship").with_rules(rules.iter().copied()));
        let command = bundle.commands["ship"].clone();
        CommandEntry::new(bundle, command)
    }

    #[tokio::test]
    async fn authorize_applies_rules() {
        let evaluator = PermissionEvaluator::new(graph().await);
        evaluator.authorize("alice", &entry(&["allow"])).await.unwrap();
        evaluator
            .authorize("alice", &entry(&["must have deploy:prod"]))
            .await
            .unwrap();
        assert!(matches!(
            evaluator
                .authorize("alice", &entry(&["must have deploy:admin"]))
                .await,
            Err(Error::Unauthorized { .. })
        ));
        assert!(matches!(
            evaluator.authorize("alice", &entry(&[])).await,
            Err(Error::Unauthorized { .. })
        ));
        // Unconditional rules never touch the graph, so unknown users pass.
        evaluator.authorize("ghost", &entry(&["true"])).await.unwrap();
    }
}
