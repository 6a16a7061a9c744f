use {
    secrecy::{ExposeSecret, Secret},
    switchyard_store::{ADMIN_GROUP, ADMIN_ROLE, ADMIN_USER, DataAccess, Group, User, UserStore},
    tracing::info,
};

use crate::{Error, Result, credentials};

/// Bundle that owns the built-in administrative permissions.
pub const SYSTEM_BUNDLE: &str = "switchyard";

/// Permissions of [`SYSTEM_BUNDLE`] granted to the admin role.
pub const ADMIN_PERMISSIONS: &[&str] = &[
    "manage_bundles",
    "manage_commands",
    "manage_groups",
    "manage_roles",
    "manage_users",
];

/// Details for the initial admin account.
#[derive(Debug, Default)]
pub struct AdminAccount {
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// Generated when absent.
    pub password: Option<Secret<String>>,
}

/// The system is bootstrapped once an `admin` user exists.
pub async fn is_bootstrapped(store: &dyn UserStore) -> Result<bool> {
    Ok(store.user_exists(ADMIN_USER).await?)
}

/// Create the `admin` user, group and role and wire them together.
///
/// Returns the admin password, generated if none was supplied.
pub async fn bootstrap(store: &dyn DataAccess, account: AdminAccount) -> Result<Secret<String>> {
    if store.user_exists(ADMIN_USER).await? {
        return Err(Error::AlreadyBootstrapped);
    }

    let password = account.password.unwrap_or_else(credentials::generate_password);
    let mut admin = User::new(ADMIN_USER);
    admin.email = account.email;
    admin.full_name = account.full_name.unwrap_or_else(|| "Administrator".into());
    admin.password_hash = Some(credentials::hash_password(password.expose_secret())?);
    store.user_create(admin).await?;

    if !store.group_exists(ADMIN_GROUP).await? {
        store.group_create(Group::new(ADMIN_GROUP)).await?;
    }
    if !store.role_exists(ADMIN_ROLE).await? {
        store.role_create(ADMIN_ROLE).await?;
    }
    for permission in ADMIN_PERMISSIONS {
        store
            .role_permission_add(ADMIN_ROLE, SYSTEM_BUNDLE, permission)
            .await?;
    }
    store.group_role_add(ADMIN_GROUP, ADMIN_ROLE).await?;
    store.group_user_add(ADMIN_GROUP, ADMIN_USER).await?;

    info!(user = ADMIN_USER, "bootstrapped admin account");
    Ok(password)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{PermissionEvaluator, verify_password},
        std::sync::Arc,
        switchyard_store::MemoryStore,
    };

    #[tokio::test]
    async fn bootstrap_once() {
        let store = Arc::new(MemoryStore::new());
        assert!(!is_bootstrapped(store.as_ref()).await.unwrap());

        let password = bootstrap(store.as_ref(), AdminAccount::default())
            .await
            .unwrap();
        assert!(is_bootstrapped(store.as_ref()).await.unwrap());

        let admin = store.user_get(ADMIN_USER).await.unwrap();
        let hash = admin.password_hash.unwrap();
        assert!(verify_password(password.expose_secret(), &hash));

        let evaluator = PermissionEvaluator::new(store.clone());
        for permission in ADMIN_PERMISSIONS {
            assert!(
                evaluator
                    .user_has_permission(ADMIN_USER, SYSTEM_BUNDLE, permission)
                    .await
                    .unwrap()
            );
        }

        assert!(matches!(
            bootstrap(store.as_ref(), AdminAccount::default()).await,
            Err(Error::AlreadyBootstrapped)
        ));
    }

    #[tokio::test]
    async fn supplied_password_is_kept() {
        let store = MemoryStore::new();
        let account = AdminAccount {
            email: Some("ops@example.com".into()),
            password: Some(Secret::new("correct horse".into())),
            ..Default::default()
        };
        let password = bootstrap(&store, account).await.unwrap();
        assert_eq!(password.expose_secret(), "correct horse");
        let admin = store.user_get_by_email("ops@example.com").await.unwrap();
        assert_eq!(admin.username, ADMIN_USER);
    }
}
