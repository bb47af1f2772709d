//! Core trait definitions
//!
//! Collaborator seams the access layer is built against. Implementations
//! are injected as `Arc<dyn ...>` so deployments can swap the remote
//! backend without touching resolution logic.

use crate::error::SmartzoneResult;
use crate::types::{ProfileRecord, RemoteSession, SessionEvent};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Remote session backend
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Look up the currently established session, if any
    async fn current_session(&self) -> SmartzoneResult<Option<RemoteSession>>;

    /// Subscribe to session lifecycle notifications
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Terminate the remote session
    async fn sign_out(&self) -> SmartzoneResult<()>;
}

/// Staff profile backend
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile row for a session subject
    ///
    /// A missing row is an ordinary outcome, not an error.
    async fn fetch_profile(&self, subject_id: &str) -> SmartzoneResult<Option<ProfileRecord>>;
}

/// Locally persisted flag provider
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Read a flag value, absent when never set or removed
    async fn get(&self, key: &str) -> Option<String>;

    /// Set a flag value
    async fn set(&self, key: &str, value: &str) -> SmartzoneResult<()>;

    /// Remove a flag
    async fn remove(&self, key: &str) -> SmartzoneResult<()>;
}
