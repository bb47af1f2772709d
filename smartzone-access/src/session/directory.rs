//! Demo Credential Directory
//!
//! Fixed demo accounts checked entirely on this side of the network.
//! A successful login writes the bypass flags; the resolver picks them
//! up on its next pass and publishes a demo identity.

use crate::session::flags::{DEMO_ACCESS, DEMO_DEPARTMENT, DEMO_NAME, DEMO_ROLE};
use crate::{AccessError, AccessResult};
use smartzone_core::{FlagStore, Role};
use tracing::info;

/// A demo account with credentials and the identity it grants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoUser {
    pub email: String,
    password: String,
    pub display_name: String,
    pub role: Role,
    pub department: Option<String>,
}

impl DemoUser {
    fn new(
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
        department: Option<&str>,
    ) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            role,
            department: department.map(str::to_string),
        }
    }
}

/// Directory of the built-in demo accounts
pub struct DemoDirectory {
    users: Vec<DemoUser>,
}

impl Default for DemoDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoDirectory {
    pub fn new() -> Self {
        Self {
            users: vec![
                DemoUser::new(
                    "tejas@manager.com",
                    "manager123",
                    "Tejas",
                    Role::Manager,
                    None,
                ),
                DemoUser::new(
                    "dhananjay@worker.com",
                    "worker123",
                    "Dhananjay",
                    Role::Worker,
                    Some("Electronics"),
                ),
            ],
        }
    }

    /// Check credentials against the directory
    ///
    /// Unknown emails and wrong passwords produce the same error so the
    /// response does not reveal which accounts exist.
    pub fn authenticate(&self, email: &str, password: &str) -> AccessResult<&DemoUser> {
        self.users
            .iter()
            .find(|user| user.email == email && user.password == password)
            .ok_or_else(|| AccessError::authentication("Invalid email or password"))
    }

    /// Write the bypass flags for an authenticated demo user
    ///
    /// The attribute flags go first and the gate flag last; a write
    /// that fails partway must never leave the bypass enabled.
    pub async fn persist(&self, user: &DemoUser, store: &dyn FlagStore) -> AccessResult<()> {
        store.set(DEMO_ROLE, &user.role.to_string()).await?;
        store.set(DEMO_NAME, &user.display_name).await?;
        match &user.department {
            Some(department) => store.set(DEMO_DEPARTMENT, department).await?,
            None => store.remove(DEMO_DEPARTMENT).await?,
        }
        store.set(DEMO_ACCESS, "true").await?;

        info!(email = %user.email, role = %user.role, "Demo access flags persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::flags::MemoryFlagStore;
    use async_trait::async_trait;
    use smartzone_core::{ErrorContext, SmartzoneError, SmartzoneResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Flag store that refuses writes once its budget runs out
    struct FailingFlagStore {
        inner: MemoryFlagStore,
        writes_left: AtomicUsize,
    }

    impl FailingFlagStore {
        fn failing_after(writes: usize) -> Self {
            Self {
                inner: MemoryFlagStore::new(),
                writes_left: AtomicUsize::new(writes),
            }
        }
    }

    #[async_trait]
    impl FlagStore for FailingFlagStore {
        async fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> SmartzoneResult<()> {
            if self.writes_left.load(Ordering::SeqCst) == 0 {
                return Err(SmartzoneError::Storage {
                    message: format!("Write refused for flag: {}", key),
                    source: None,
                    context: ErrorContext::new("failing-flags").with_operation("set"),
                });
            }
            self.writes_left.fetch_sub(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> SmartzoneResult<()> {
            self.inner.remove(key).await
        }
    }

    #[test]
    fn valid_credentials_authenticate() {
        let directory = DemoDirectory::new();

        let manager = directory
            .authenticate("tejas@manager.com", "manager123")
            .unwrap();
        assert_eq!(manager.role, Role::Manager);
        assert_eq!(manager.display_name, "Tejas");

        let worker = directory
            .authenticate("dhananjay@worker.com", "worker123")
            .unwrap();
        assert_eq!(worker.role, Role::Worker);
        assert_eq!(worker.department.as_deref(), Some("Electronics"));
    }

    #[test]
    fn wrong_password_and_unknown_email_are_indistinguishable() {
        let directory = DemoDirectory::new();

        let wrong_password = directory
            .authenticate("tejas@manager.com", "nope")
            .unwrap_err();
        let unknown_email = directory
            .authenticate("nobody@example.com", "manager123")
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn persist_writes_all_flags_for_worker() {
        let directory = DemoDirectory::new();
        let store = MemoryFlagStore::new();

        let worker = directory
            .authenticate("dhananjay@worker.com", "worker123")
            .unwrap()
            .clone();
        directory.persist(&worker, &store).await.unwrap();

        assert_eq!(store.get(DEMO_ACCESS).await.as_deref(), Some("true"));
        assert_eq!(store.get(DEMO_ROLE).await.as_deref(), Some("worker"));
        assert_eq!(store.get(DEMO_NAME).await.as_deref(), Some("Dhananjay"));
        assert_eq!(
            store.get(DEMO_DEPARTMENT).await.as_deref(),
            Some("Electronics")
        );
    }

    #[tokio::test]
    async fn persist_clears_department_when_user_has_none() {
        let directory = DemoDirectory::new();
        let store = MemoryFlagStore::new();
        store.set(DEMO_DEPARTMENT, "Stale").await.unwrap();

        let manager = directory
            .authenticate("tejas@manager.com", "manager123")
            .unwrap()
            .clone();
        directory.persist(&manager, &store).await.unwrap();

        assert_eq!(store.get(DEMO_ACCESS).await.as_deref(), Some("true"));
        assert_eq!(store.get(DEMO_ROLE).await.as_deref(), Some("manager"));
        assert!(store.get(DEMO_DEPARTMENT).await.is_none());
    }

    #[tokio::test]
    async fn interrupted_persist_never_enables_access() {
        let directory = DemoDirectory::new();
        let store = FailingFlagStore::failing_after(2);

        let worker = directory
            .authenticate("dhananjay@worker.com", "worker123")
            .unwrap()
            .clone();
        let result = directory.persist(&worker, &store).await;

        assert!(result.is_err());
        assert_eq!(store.get(DEMO_ROLE).await.as_deref(), Some("worker"));
        assert!(store.get(DEMO_ACCESS).await.is_none());
    }
}
