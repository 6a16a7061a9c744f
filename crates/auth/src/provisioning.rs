//! Mapping provider identities to switchyard users.

use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    switchyard_channels::UserInfo,
    switchyard_store::{DataAccess, User},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use switchyard_metrics::{counter, labels, provisioning as prov_metrics};

use crate::{Error, Result, bootstrap::is_bootstrapped, credentials};

#[derive(Clone)]
pub struct Provisioner {
    store: Arc<dyn DataAccess>,
    allow_self_registration: bool,
}

impl Provisioner {
    pub fn new(store: Arc<dyn DataAccess>, allow_self_registration: bool) -> Self {
        Self {
            store,
            allow_self_registration,
        }
    }

    /// Find the user behind a provider identity, creating one when policy
    /// allows. The flag is `true` when the user was created by this call.
    ///
    /// Users are matched by email first, then by an existing mapping for
    /// `adapter`. Creation requires self-registration to be enabled and the
    /// system to be bootstrapped.
    pub async fn resolve_or_create_user(
        &self,
        adapter: &str,
        identity: &UserInfo,
    ) -> Result<(User, bool)> {
        if let Some(user) = self.find_existing(adapter, identity).await? {
            return Ok((user, false));
        }

        if !self.allow_self_registration {
            self.refused(adapter, "self_registration_off");
            return Err(Error::SelfRegistrationOff);
        }
        if !is_bootstrapped(self.store.as_ref()).await? {
            self.refused(adapter, "not_bootstrapped");
            return Err(Error::NotBootstrapped);
        }

        let user = new_user(adapter, identity)?;
        match self.store.user_create(user.clone()).await {
            Ok(()) => {
                info!(adapter, username = %user.username, "self-registered user");
                #[cfg(feature = "metrics")]
                counter!(prov_metrics::USERS_CREATED_TOTAL, labels::ADAPTER => adapter.to_string())
                    .increment(1);
                Ok((user, true))
            },
            // Lost a race with a concurrent registration for the same email.
            Err(switchyard_store::Error::DuplicateEmail(email)) => {
                debug!(adapter, %email, "user created concurrently");
                Ok((self.store.user_get_by_email(&email).await?, false))
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn find_existing(&self, adapter: &str, identity: &UserInfo) -> Result<Option<User>> {
        if let Some(email) = identity.email.as_deref().filter(|e| !e.is_empty()) {
            match self.store.user_get_by_email(email).await {
                Ok(user) => return Ok(Some(user)),
                Err(switchyard_store::Error::NoSuchUser(_)) => {},
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.store.user_list().await?.into_iter().find(|u| {
            u.mappings
                .get(adapter)
                .is_some_and(|id| *id == identity.id)
        }))
    }

    fn refused(&self, adapter: &str, reason: &'static str) {
        warn!(adapter, reason, "refused self-registration");
        #[cfg(feature = "metrics")]
        counter!(
            prov_metrics::REFUSED_TOTAL,
            labels::ADAPTER => adapter.to_string(),
            labels::REASON => reason
        )
        .increment(1);
    }
}

fn new_user(adapter: &str, identity: &UserInfo) -> Result<User> {
    let username = if identity.name.trim().is_empty() {
        identity.id.clone()
    } else {
        identity.name.clone()
    };
    let mut user = User::new(username);
    user.email = identity.email.clone().filter(|e| !e.is_empty());
    user.full_name = identity.preferred_name().to_string();
    user.password_hash = Some(credentials::hash_password(
        credentials::generate_password().expose_secret(),
    )?);
    user.mappings.insert(adapter.to_string(), identity.id.clone());
    Ok(user)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::bootstrap::{AdminAccount, bootstrap},
        switchyard_store::{MemoryStore, UserStore},
    };

    fn identity(id: &str, name: &str, email: Option<&str>) -> UserInfo {
        UserInfo {
            id: id.into(),
            name: name.into(),
            email: email.map(Into::into),
            ..Default::default()
        }
    }

    async fn bootstrapped() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        bootstrap(store.as_ref(), AdminAccount::default())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn self_registration_off_creates_nothing() {
        let store = bootstrapped().await;
        let provisioner = Provisioner::new(store.clone(), false);
        let err = provisioner
            .resolve_or_create_user("slack", &identity("U1", "alice", Some("alice@example.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SelfRegistrationOff));
        assert!(!store.user_exists("alice").await.unwrap());
    }

    #[tokio::test]
    async fn not_bootstrapped_refuses() {
        let store = Arc::new(MemoryStore::new());
        let provisioner = Provisioner::new(store.clone(), true);
        let err = provisioner
            .resolve_or_create_user("slack", &identity("U1", "alice", None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotBootstrapped));
        assert!(store.user_list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn creates_then_finds() {
        let store = bootstrapped().await;
        let provisioner = Provisioner::new(store.clone(), true);
        let alice = identity("U1", "alice", Some("alice@example.com"));

        let (user, created) = provisioner
            .resolve_or_create_user("slack", &alice)
            .await
            .unwrap();
        assert!(created);
        assert_eq!(user.username, "alice");
        assert_eq!(user.mappings.get("slack").map(String::as_str), Some("U1"));
        assert!(store.user_get("alice").await.unwrap().password_hash.is_some());

        let (again, created) = provisioner
            .resolve_or_create_user("slack", &alice)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again.username, "alice");
    }

    #[tokio::test]
    async fn existing_users_are_found_without_self_registration() {
        let store = bootstrapped().await;
        store
            .user_create(User::new("bob").with_email("bob@example.com"))
            .await
            .unwrap();
        let provisioner = Provisioner::new(store.clone(), false);
        let (user, created) = provisioner
            .resolve_or_create_user("slack", &identity("U2", "bobby", Some("BOB@example.com")))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(user.username, "bob");
    }

    #[tokio::test]
    async fn users_without_email_match_by_mapping() {
        let store = bootstrapped().await;
        let provisioner = Provisioner::new(store.clone(), true);
        let carol = identity("C7", "carol", None);
        let (_, created) = provisioner
            .resolve_or_create_user("console", &carol)
            .await
            .unwrap();
        assert!(created);
        let (user, created) = provisioner
            .resolve_or_create_user("console", &carol)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(user.username, "carol");
    }
}
