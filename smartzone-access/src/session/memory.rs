//! In-Memory Collaborators - Session service and profile store doubles
//!
//! Backends for local development and tests. Both expose small control
//! surfaces (failure injection, artificial latency) so resolver
//! degradation paths can be exercised without a real backend.

use async_trait::async_trait;
use smartzone_core::{
    ErrorContext, ProfileRecord, ProfileStore, RemoteSession, SessionEvent, SessionService,
    SmartzoneError, SmartzoneResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Session service holding at most one session in process memory
pub struct MemorySessionService {
    session: RwLock<Option<RemoteSession>>,
    events: broadcast::Sender<SessionEvent>,
    unreachable: AtomicBool,
}

impl Default for MemorySessionService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: RwLock::new(None),
            events,
            unreachable: AtomicBool::new(false),
        }
    }

    pub fn with_session(session: RemoteSession) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: RwLock::new(Some(session)),
            events,
            unreachable: AtomicBool::new(false),
        }
    }

    /// Install a session and notify subscribers
    pub async fn sign_in(&self, session: RemoteSession) {
        *self.session.write().await = Some(session);
        let _ = self.events.send(SessionEvent::SignedIn);
    }

    /// Emit an event without changing the stored session
    pub async fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Simulate the backing service being unreachable
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn unreachable_error(&self, operation: &str) -> SmartzoneError {
        SmartzoneError::Session {
            message: "Session service unreachable".to_string(),
            source: None,
            context: ErrorContext::new("memory-session").with_operation(operation),
        }
    }
}

#[async_trait]
impl SessionService for MemorySessionService {
    async fn current_session(&self) -> SmartzoneResult<Option<RemoteSession>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(self.unreachable_error("current_session"));
        }
        Ok(self.session.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> SmartzoneResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(self.unreachable_error("sign_out"));
        }
        *self.session.write().await = None;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }
}

/// Profile store backed by a map keyed on subject id
#[derive(Default)]
pub struct MemoryProfileStore {
    records: RwLock<HashMap<String, ProfileRecord>>,
    fail: AtomicBool,
    delay_ms: AtomicU64,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: ProfileRecord) {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    /// Make every fetch fail until cleared
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delay every fetch, for exercising timeouts and supersession
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch_profile(&self, subject_id: &str) -> SmartzoneResult<Option<ProfileRecord>> {
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(SmartzoneError::Profile {
                message: format!("Profile lookup failed for subject: {}", subject_id),
                source: None,
                context: ErrorContext::new("memory-profiles").with_operation("fetch_profile"),
            });
        }

        Ok(self.records.read().await.get(subject_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartzone_core::Role;

    fn profile(id: &str) -> ProfileRecord {
        ProfileRecord {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            full_name: None,
            role: Role::Worker,
            department: None,
            store_id: None,
        }
    }

    #[tokio::test]
    async fn session_service_round_trip() {
        let service = MemorySessionService::new();
        assert!(service.current_session().await.unwrap().is_none());

        service.sign_in(RemoteSession::new("u-1")).await;
        let session = service.current_session().await.unwrap();
        assert_eq!(session.map(|s| s.subject_id), Some("u-1".to_string()));

        service.sign_out().await.unwrap();
        assert!(service.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_in_notifies_subscribers() {
        let service = MemorySessionService::new();
        let mut events = service.subscribe();

        service.sign_in(RemoteSession::new("u-1")).await;
        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedIn);
    }

    #[tokio::test]
    async fn unreachable_service_errors() {
        let service = MemorySessionService::new();
        service.set_unreachable(true);

        let err = service.current_session().await.unwrap_err();
        assert!(err.is_recoverable());

        service.set_unreachable(false);
        assert!(service.current_session().await.is_ok());
    }

    #[tokio::test]
    async fn profile_store_fetch_and_failure() {
        let store = MemoryProfileStore::new();
        store.insert(profile("u-1")).await;

        let found = store.fetch_profile("u-1").await.unwrap();
        assert!(found.is_some());
        assert!(store.fetch_profile("u-2").await.unwrap().is_none());

        store.set_fail(true);
        assert!(store.fetch_profile("u-1").await.is_err());
    }
}
