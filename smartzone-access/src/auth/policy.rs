//! Access Policy Evaluator
//!
//! A pure decision function from resolved identity and declared route
//! requirement to an access decision. All I/O and state live elsewhere;
//! this module is deliberately side-effect-free so it can be tested
//! exhaustively with tables.

use super::identity::Identity;
use serde::{Deserialize, Serialize};
use smartzone_core::Role;

/// Canonical denial reason for a role mismatch
pub const INSUFFICIENT_ROLE: &str = "insufficient role";

/// Access requirement declared by a protected view
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteRequirement {
    /// Allow anonymous visitors; when set the route is fully public
    pub anonymous_allowed: bool,
    /// Role the operator must hold; checked after authentication
    pub required_role: Option<Role>,
}

impl RouteRequirement {
    /// No requirements at all
    pub fn public() -> Self {
        Self {
            anonymous_allowed: true,
            required_role: None,
        }
    }

    /// Any signed-in operator, regardless of role
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Signed-in operators holding the manager role
    pub fn manager_only() -> Self {
        Self {
            anonymous_allowed: false,
            required_role: Some(Role::Manager),
        }
    }
}

/// Outcome of evaluating an identity against a requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render the protected view
    Allow,
    /// Send the visitor to the login route
    RedirectToLogin,
    /// Keep the visitor out and show the reason
    Deny { reason: String },
}

impl AccessDecision {
    fn insufficient_role() -> Self {
        AccessDecision::Deny {
            reason: INSUFFICIENT_ROLE.to_string(),
        }
    }
}

/// Decide whether `identity` may enter a view declaring `requirement`.
///
/// Total over every input combination, including loading snapshots:
/// callers render a placeholder while `still_loading` is set instead of
/// consulting the policy, but a mid-resolution call still judges the
/// identity it was given. Redirects take precedence over role denials so
/// an anonymous visitor is sent to login rather than shown an error.
pub fn evaluate(
    identity: &Identity,
    requirement: &RouteRequirement,
    still_loading: bool,
) -> AccessDecision {
    // The loading flag never changes the judgment; the guard gates on it
    // before calling in.
    let _ = still_loading;

    if requirement.anonymous_allowed {
        return AccessDecision::Allow;
    }

    if identity.is_anonymous() {
        return AccessDecision::RedirectToLogin;
    }

    if let Some(required) = requirement.required_role {
        if identity.role() != Some(required) {
            return AccessDecision::insufficient_role();
        }
    }

    AccessDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::{AccountIdentity, DemoIdentity};

    fn manager() -> Identity {
        Identity::DemoBypass(DemoIdentity::from_flags(
            Some("manager".to_string()),
            None,
            None,
        ))
    }

    fn worker() -> Identity {
        Identity::Authenticated(AccountIdentity {
            subject_id: "u-worker".to_string(),
            display_name: Some("Dhananjay".to_string()),
            role: Some(Role::Worker),
            department: Some("Electronics".to_string()),
            store_id: None,
        })
    }

    fn degraded() -> Identity {
        Identity::Authenticated(AccountIdentity::without_profile("u-degraded"))
    }

    #[test]
    fn decision_table() {
        let cases: Vec<(&str, Identity, RouteRequirement, bool, AccessDecision)> = vec![
            (
                "public allows anonymous",
                Identity::Anonymous,
                RouteRequirement::public(),
                false,
                AccessDecision::Allow,
            ),
            (
                "public allows anonymous even mid-load",
                Identity::Anonymous,
                RouteRequirement::public(),
                true,
                AccessDecision::Allow,
            ),
            (
                "public ignores required role",
                worker(),
                RouteRequirement {
                    anonymous_allowed: true,
                    required_role: Some(Role::Manager),
                },
                false,
                AccessDecision::Allow,
            ),
            (
                "anonymous is redirected from authenticated routes",
                Identity::Anonymous,
                RouteRequirement::authenticated(),
                false,
                AccessDecision::RedirectToLogin,
            ),
            (
                "redirect takes precedence over role denial",
                Identity::Anonymous,
                RouteRequirement::manager_only(),
                false,
                AccessDecision::RedirectToLogin,
            ),
            (
                "worker passes authenticated routes",
                worker(),
                RouteRequirement::authenticated(),
                false,
                AccessDecision::Allow,
            ),
            (
                "worker is denied manager routes",
                worker(),
                RouteRequirement::manager_only(),
                false,
                AccessDecision::Deny {
                    reason: INSUFFICIENT_ROLE.to_string(),
                },
            ),
            (
                "manager passes manager routes",
                manager(),
                RouteRequirement::manager_only(),
                false,
                AccessDecision::Allow,
            ),
            (
                "role-less account passes authenticated routes",
                degraded(),
                RouteRequirement::authenticated(),
                false,
                AccessDecision::Allow,
            ),
            (
                "role-less account fails role checks closed",
                degraded(),
                RouteRequirement::manager_only(),
                false,
                AccessDecision::Deny {
                    reason: INSUFFICIENT_ROLE.to_string(),
                },
            ),
            (
                "worker requirement admits workers",
                worker(),
                RouteRequirement {
                    anonymous_allowed: false,
                    required_role: Some(Role::Worker),
                },
                false,
                AccessDecision::Allow,
            ),
            (
                "worker requirement rejects managers",
                manager(),
                RouteRequirement {
                    anonymous_allowed: false,
                    required_role: Some(Role::Worker),
                },
                false,
                AccessDecision::Deny {
                    reason: INSUFFICIENT_ROLE.to_string(),
                },
            ),
        ];

        for (name, identity, requirement, still_loading, expected) in cases {
            let decision = evaluate(&identity, &requirement, still_loading);
            assert_eq!(decision, expected, "case failed: {}", name);
        }
    }

    #[test]
    fn evaluation_is_idempotent() {
        let identity = worker();
        let requirement = RouteRequirement::manager_only();

        let first = evaluate(&identity, &requirement, false);
        let second = evaluate(&identity, &requirement, false);
        assert_eq!(first, second);
    }

    #[test]
    fn loading_flag_does_not_change_judgment() {
        let identity = manager();
        let requirement = RouteRequirement::manager_only();

        assert_eq!(
            evaluate(&identity, &requirement, true),
            evaluate(&identity, &requirement, false)
        );
    }
}
