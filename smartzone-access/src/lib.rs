//! SmartZone Access - Session resolution and route access control
//!
//! Application layer of the SmartZone dashboard's access kernel:
//!
//! - **Session resolution**: a background task that resolves the
//!   current identity from demo flags, the remote session and the
//!   profile store, publishing snapshots over a watch channel
//! - **Access policy**: role requirements per route plus a pure
//!   evaluator turning identity and requirement into a decision
//! - **Route guards**: per-route projections of the latest snapshot
//!   that views render directly
//! - **Demo directory**: built-in demo accounts that grant access by
//!   writing bypass flags, no backend required
//!
//! # Quick start
//!
//! ```no_run
//! use smartzone_access::{AccessManager, DashboardView};
//! use smartzone_core::SmartzoneConfig;
//!
//! # async fn run() -> Result<(), smartzone_access::AccessError> {
//! let manager = AccessManager::new(SmartzoneConfig::default()).await?;
//! manager.demo_login("tejas@manager.com", "manager123").await?;
//!
//! let mut guard = manager.guard_view(DashboardView::StoreManagement);
//! guard.settled().await;
//! assert!(guard.state().is_allowed());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod session;

// Re-export commonly used types
pub use auth::{
    evaluate, AccessDecision, AccountIdentity, DashboardView, DemoIdentity, GuardState, Identity,
    IdentityKind, RouteGuard, RouteRequirement, INSUFFICIENT_ROLE, LOGIN_ROUTE,
};
pub use session::{
    DemoDirectory, DemoUser, JsonFileFlagStore, MemoryFlagStore, MemoryProfileStore,
    MemorySessionService, Resolution, SessionResolver,
};

use smartzone_core::{FlagStore, ProfileStore, SessionService, SmartzoneConfig, SmartzoneError};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Application layer errors
#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    #[error("Core error: {0}")]
    Core(#[from] SmartzoneError),

    #[error("Authentication failed: {message}")]
    Authentication { message: String },
}

impl AccessError {
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Facade over the resolver, policy and demo directory
///
/// One instance lives for the whole process; views and route handlers
/// borrow it to mount guards and read snapshots.
pub struct AccessManager {
    resolver: SessionResolver,
    directory: DemoDirectory,
    flags: Arc<dyn FlagStore>,
    config: SmartzoneConfig,
}

impl AccessManager {
    /// Build with defaults for every collaborator
    pub async fn new(config: SmartzoneConfig) -> AccessResult<Self> {
        Self::builder(config).build().await
    }

    pub fn builder(config: SmartzoneConfig) -> AccessManagerBuilder {
        AccessManagerBuilder::new(config)
    }

    pub fn config(&self) -> &SmartzoneConfig {
        &self.config
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    /// Most recently published resolution snapshot
    pub fn latest(&self) -> Resolution {
        self.resolver.latest()
    }

    /// Follow future resolution snapshots
    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.resolver.subscribe()
    }

    /// Mount a guard for an explicit requirement
    pub fn guard(&self, requirement: RouteRequirement) -> RouteGuard {
        RouteGuard::mount(&self.resolver, requirement)
    }

    /// Mount a guard for a dashboard view's registered requirement
    pub fn guard_view(&self, view: DashboardView) -> RouteGuard {
        self.guard(view.requirement())
    }

    /// Authenticate against the demo directory and grant demo access
    ///
    /// On success the bypass flags are written and the resolver nudged;
    /// the new identity lands on subscribers within one resolution
    /// cycle.
    pub async fn demo_login(&self, email: &str, password: &str) -> AccessResult<DemoUser> {
        if !self.config.resolver.bypass_enabled {
            return Err(AccessError::authentication("Demo access is disabled"));
        }

        let user = self.directory.authenticate(email, password)?.clone();
        self.directory.persist(&user, self.flags.as_ref()).await?;
        self.resolver.refresh();

        info!(email = %user.email, "Demo login succeeded");
        Ok(user)
    }

    /// Sign out of demo and remote identity alike
    pub async fn sign_out(&self) {
        self.resolver.sign_out().await;
    }
}

/// Builder injecting alternative backends
///
/// Collaborators left unset fall back to in-memory implementations,
/// except the flag store which follows the config's persistence
/// settings.
pub struct AccessManagerBuilder {
    config: SmartzoneConfig,
    session: Option<Arc<dyn SessionService>>,
    profiles: Option<Arc<dyn ProfileStore>>,
    flags: Option<Arc<dyn FlagStore>>,
}

impl AccessManagerBuilder {
    pub fn new(config: SmartzoneConfig) -> Self {
        Self {
            config,
            session: None,
            profiles: None,
            flags: None,
        }
    }

    pub fn with_session_service(mut self, service: Arc<dyn SessionService>) -> Self {
        self.session = Some(service);
        self
    }

    pub fn with_profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(store);
        self
    }

    pub fn with_flag_store(mut self, store: Arc<dyn FlagStore>) -> Self {
        self.flags = Some(store);
        self
    }

    pub async fn build(self) -> AccessResult<AccessManager> {
        self.config.validate()?;

        let session = self
            .session
            .unwrap_or_else(|| Arc::new(MemorySessionService::new()));
        let profiles = self
            .profiles
            .unwrap_or_else(|| Arc::new(MemoryProfileStore::new()));
        let flags: Arc<dyn FlagStore> = match self.flags {
            Some(flags) => flags,
            None if self.config.flags.persist => {
                let path = self.config.flags.storage_path()?;
                Arc::new(JsonFileFlagStore::open(path)?)
            }
            None => Arc::new(MemoryFlagStore::new()),
        };

        let resolver = SessionResolver::spawn(
            session,
            profiles,
            flags.clone(),
            self.config.resolver.clone(),
        );

        info!("Access manager initialized");

        Ok(AccessManager {
            resolver,
            directory: DemoDirectory::new(),
            flags,
            config: self.config,
        })
    }
}
