//! Session Resolver - Background identity resolution
//!
//! A single background task owns the truth about who is signed in. It
//! re-resolves on every session change notification and on explicit
//! refresh nudges, publishing snapshots over a watch channel that any
//! number of guards and views can follow.
//!
//! Resolution precedence:
//! 1. Demo bypass flags (when enabled in config)
//! 2. Remote session plus profile lookup
//! 3. Anonymous
//!
//! A trigger that arrives mid-resolution supersedes the in-flight
//! attempt: the attempt is dropped, a loading snapshot is published and
//! resolution starts over under the next sequence number.

use crate::auth::identity::{AccountIdentity, DemoIdentity, Identity};
use crate::session::flags::{DEMO_ACCESS, DEMO_DEPARTMENT, DEMO_KEYS, DEMO_NAME, DEMO_ROLE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartzone_core::{
    with_timeout, FlagStore, ProfileStore, ResolverConfig, SessionEvent, SessionService,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

/// One published snapshot of the resolved identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub identity: Identity,
    /// True while a resolution is in flight for this sequence number
    pub still_loading: bool,
    /// Monotonically increasing resolution sequence number
    pub seq: u64,
    pub resolved_at: DateTime<Utc>,
}

impl Resolution {
    fn initial() -> Self {
        Self {
            identity: Identity::Anonymous,
            still_loading: true,
            seq: 0,
            resolved_at: Utc::now(),
        }
    }
}

/// Handle to the background resolution task
///
/// Dropping the handle shuts the task down; receivers obtained through
/// [`subscribe`](Self::subscribe) keep their last snapshot.
pub struct SessionResolver {
    latest: watch::Receiver<Resolution>,
    refresh_tx: mpsc::UnboundedSender<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    session: Arc<dyn SessionService>,
    flags: Arc<dyn FlagStore>,
}

impl SessionResolver {
    /// Start the resolver task and return its handle
    ///
    /// The first snapshot is a loading anonymous one; the task begins
    /// resolving immediately.
    pub fn spawn(
        session: Arc<dyn SessionService>,
        profiles: Arc<dyn ProfileStore>,
        flags: Arc<dyn FlagStore>,
        config: ResolverConfig,
    ) -> Self {
        let (publisher, latest) = watch::channel(Resolution::initial());
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = ResolverTask {
            session: session.clone(),
            profiles,
            flags: flags.clone(),
            config,
            publisher,
        };
        tokio::spawn(task.run(refresh_rx, shutdown_rx));

        Self {
            latest,
            refresh_tx,
            shutdown_tx: Some(shutdown_tx),
            session,
            flags,
        }
    }

    /// Most recently published snapshot
    pub fn latest(&self) -> Resolution {
        self.latest.borrow().clone()
    }

    /// Follow future snapshots
    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.latest.clone()
    }

    /// Nudge the task to re-resolve, for example after writing flags
    pub fn refresh(&self) {
        let _ = self.refresh_tx.send(());
    }

    /// Sign out of every identity source
    ///
    /// Local flags are cleared unconditionally. The remote session is
    /// only ended when the current identity actually came from one, so
    /// leaving demo mode never touches the backend. Individual failures
    /// are logged and do not stop the rest of the teardown.
    pub async fn sign_out(&self) {
        for key in DEMO_KEYS {
            if let Err(err) = self.flags.remove(key).await {
                err.log();
            }
        }

        if matches!(self.latest().identity, Identity::Authenticated(_)) {
            if let Err(err) = self.session.sign_out().await {
                err.log();
            }
        }

        info!("Signed out, re-resolving identity");
        self.refresh();
    }
}

impl Drop for SessionResolver {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// What woke the resolver loop
enum Wake {
    /// A trigger demanding re-resolution, tagged for the logs
    Trigger(&'static str),
    /// The session event stream closed; refresh nudges still work
    EventsClosed,
    HandleDropped,
    Shutdown,
}

struct ResolverTask {
    session: Arc<dyn SessionService>,
    profiles: Arc<dyn ProfileStore>,
    flags: Arc<dyn FlagStore>,
    config: ResolverConfig,
    publisher: watch::Sender<Resolution>,
}

impl ResolverTask {
    async fn run(self, mut refresh_rx: mpsc::UnboundedReceiver<()>, mut shutdown_rx: oneshot::Receiver<()>) {
        // Subscribe before the first resolution so nothing emitted
        // while it runs can be missed.
        let mut events = self.session.subscribe();
        let mut events_open = true;
        let mut seq: u64 = 0;

        info!(
            bypass_enabled = self.config.bypass_enabled,
            "Session resolver started"
        );

        loop {
            // Run attempt `seq`, racing it against fresh triggers.
            let settled = {
                let attempt = self.resolve_once(seq);
                tokio::pin!(attempt);

                loop {
                    tokio::select! {
                        resolution = &mut attempt => break Some(resolution),
                        wake = next_wake(&mut events, &mut events_open, &mut refresh_rx, &mut shutdown_rx) => {
                            match wake {
                                Wake::Shutdown | Wake::HandleDropped => {
                                    debug!("Session resolver stopped");
                                    return;
                                }
                                Wake::EventsClosed => continue,
                                Wake::Trigger(reason) => {
                                    debug!(seq, reason, "Resolution superseded");
                                    break None;
                                }
                            }
                        }
                    }
                }
            };

            match settled {
                Some(resolution) => self.publish(resolution),
                None => {
                    seq += 1;
                    self.publish_loading(seq);
                    continue;
                }
            }

            // Idle until the next trigger.
            loop {
                match next_wake(&mut events, &mut events_open, &mut refresh_rx, &mut shutdown_rx)
                    .await
                {
                    Wake::Shutdown | Wake::HandleDropped => {
                        debug!("Session resolver stopped");
                        return;
                    }
                    Wake::EventsClosed => continue,
                    Wake::Trigger(reason) => {
                        seq += 1;
                        self.publish_loading(seq);
                        debug!(seq, reason, "Re-resolving identity");
                        break;
                    }
                }
            }
        }
    }

    async fn resolve_once(&self, seq: u64) -> Resolution {
        let identity = self.resolve_identity().await;
        debug!(seq, kind = %identity.kind(), "Identity resolved");
        Resolution {
            identity,
            still_loading: false,
            seq,
            resolved_at: Utc::now(),
        }
    }

    /// Resolve the current identity from flags, session and profile
    ///
    /// Never fails: backend trouble degrades the identity instead of
    /// surfacing an error to subscribers.
    async fn resolve_identity(&self) -> Identity {
        if self.config.bypass_enabled {
            if let Some(value) = self.flags.get(DEMO_ACCESS).await {
                if value == "true" {
                    let role = self.flags.get(DEMO_ROLE).await;
                    let name = self.flags.get(DEMO_NAME).await;
                    let department = self.flags.get(DEMO_DEPARTMENT).await;
                    let demo = DemoIdentity::from_flags(role, name, department);
                    debug!(role = %demo.role, "Demo bypass flag set, skipping remote session");
                    return Identity::DemoBypass(demo);
                }
            }
        }

        let session = match self.session.current_session().await {
            Ok(session) => session,
            Err(err) => {
                warn!(
                    error = %err,
                    recoverable = err.is_recoverable(),
                    "Session lookup failed, treating as anonymous"
                );
                return Identity::Anonymous;
            }
        };

        let Some(session) = session else {
            return Identity::Anonymous;
        };

        match with_timeout(
            self.profiles.fetch_profile(&session.subject_id),
            self.config.profile_timeout_ms,
            "fetch_profile",
        )
        .await
        {
            Ok(Ok(Some(profile))) => Identity::Authenticated(AccountIdentity::from_profile(profile)),
            Ok(Ok(None)) => {
                debug!(subject_id = %session.subject_id, "No profile row for session subject");
                Identity::Authenticated(AccountIdentity::without_profile(session.subject_id.as_str()))
            }
            Ok(Err(err)) => {
                error!(error = %err, subject_id = %session.subject_id, "Profile fetch failed");
                Identity::Authenticated(AccountIdentity::without_profile(session.subject_id.as_str()))
            }
            Err(err) => {
                error!(error = %err, subject_id = %session.subject_id, "Profile fetch timed out");
                Identity::Authenticated(AccountIdentity::without_profile(session.subject_id.as_str()))
            }
        }
    }

    /// Publish a loading snapshot that keeps the previous identity
    fn publish_loading(&self, seq: u64) {
        let previous = self.publisher.borrow().identity.clone();
        let _ = self.publisher.send_replace(Resolution {
            identity: previous,
            still_loading: true,
            seq,
            resolved_at: Utc::now(),
        });
    }

    /// Publish a settled resolution unless a newer one already landed
    fn publish(&self, resolution: Resolution) {
        let current_seq = self.publisher.borrow().seq;
        if resolution.seq < current_seq {
            warn!(
                seq = resolution.seq,
                current_seq, "Discarding stale resolution"
            );
            return;
        }
        let _ = self.publisher.send_replace(resolution);
    }
}

async fn next_wake(
    events: &mut broadcast::Receiver<SessionEvent>,
    events_open: &mut bool,
    refresh_rx: &mut mpsc::UnboundedReceiver<()>,
    shutdown_rx: &mut oneshot::Receiver<()>,
) -> Wake {
    tokio::select! {
        _ = &mut *shutdown_rx => Wake::Shutdown,
        event = events.recv(), if *events_open => match event {
            Ok(event) => {
                debug!(event = ?event, "Session change notification");
                Wake::Trigger("session_event")
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Session event stream lagged, re-resolving");
                Wake::Trigger("event_lag")
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("Session event stream closed, refresh nudges only from here on");
                *events_open = false;
                Wake::EventsClosed
            }
        },
        nudge = refresh_rx.recv() => match nudge {
            Some(()) => Wake::Trigger("refresh"),
            None => Wake::HandleDropped,
        },
    }
}
