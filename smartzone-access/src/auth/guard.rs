//! Route Guard - Per-route projection of the resolved identity
//!
//! A guard subscribes to the resolver and folds each snapshot through
//! the access policy for one route. It always has a renderable state
//! and never raises: when the resolver goes away it simply keeps the
//! last state it had.

use crate::auth::policy::{evaluate, AccessDecision, RouteRequirement};
use crate::auth::routes::LOGIN_ROUTE;
use crate::session::resolver::{Resolution, SessionResolver};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// What a guarded route should currently render
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GuardState {
    /// Identity not settled yet, render a placeholder
    Loading,
    /// Render the protected content
    Allowed,
    /// Send the visitor to the login route
    Redirecting,
    /// Render an access denied notice
    Denied { reason: String },
}

impl GuardState {
    pub fn is_loading(&self) -> bool {
        matches!(self, GuardState::Loading)
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardState::Allowed)
    }
}

/// Guard for a single route requirement
pub struct RouteGuard {
    requirement: RouteRequirement,
    resolutions: watch::Receiver<Resolution>,
    state: GuardState,
}

impl RouteGuard {
    /// Attach a guard to the resolver and project the current snapshot
    pub fn mount(resolver: &SessionResolver, requirement: RouteRequirement) -> Self {
        let mut resolutions = resolver.subscribe();
        let state = project(&resolutions.borrow_and_update(), &requirement);
        debug!(state = ?state, "Route guard mounted");
        Self {
            requirement,
            resolutions,
            state,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn requirement(&self) -> &RouteRequirement {
        &self.requirement
    }

    /// Where to send the visitor while redirecting
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self.state {
            GuardState::Redirecting => Some(LOGIN_ROUTE),
            _ => None,
        }
    }

    /// Wait for the next snapshot and re-project
    ///
    /// If the resolver has shut down the guard keeps its last state
    /// forever, so callers can loop on this without special cases.
    pub async fn changed(&mut self) -> &GuardState {
        if self.resolutions.changed().await.is_ok() {
            let resolution = self.resolutions.borrow_and_update().clone();
            self.state = project(&resolution, &self.requirement);
        } else {
            // Resolver gone; pending() never wakes the caller again.
            std::future::pending::<()>().await;
        }
        &self.state
    }

    /// Wait until the guard leaves the loading state
    pub async fn settled(&mut self) -> &GuardState {
        while self.state.is_loading() {
            if self.resolutions.changed().await.is_err() {
                break;
            }
            let resolution = self.resolutions.borrow_and_update().clone();
            self.state = project(&resolution, &self.requirement);
        }
        &self.state
    }
}

fn project(resolution: &Resolution, requirement: &RouteRequirement) -> GuardState {
    if resolution.still_loading {
        return GuardState::Loading;
    }
    match evaluate(&resolution.identity, requirement, resolution.still_loading) {
        AccessDecision::Allow => GuardState::Allowed,
        AccessDecision::RedirectToLogin => GuardState::Redirecting,
        AccessDecision::Deny { reason } => GuardState::Denied { reason },
    }
}
