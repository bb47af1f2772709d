//! Access Control Module
//!
//! Identity model, route access policy and the guards that apply the
//! policy to live resolution snapshots.

pub mod guard;
pub mod identity;
pub mod policy;
pub mod routes;

pub use guard::{GuardState, RouteGuard};
pub use identity::{
    AccountIdentity, DemoIdentity, Identity, IdentityKind, DEMO_DEFAULT_NAME, DEMO_SUBJECT_ID,
};
pub use policy::{evaluate, AccessDecision, RouteRequirement, INSUFFICIENT_ROLE};
pub use routes::{DashboardView, LOGIN_ROUTE};
