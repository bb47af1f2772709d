//! Identity Model
//!
//! Defines the resolved identity a dashboard session operates under. An
//! identity is an immutable value produced by the session resolver; every
//! resolution yields a fresh one.

use serde::{Deserialize, Serialize};
use smartzone_core::{ProfileRecord, Role};
use std::str::FromStr;

/// Fixed subject id carried by every demo-bypass identity
pub const DEMO_SUBJECT_ID: &str = "demo-user";

/// Display name used when the demo name flag is absent
pub const DEMO_DEFAULT_NAME: &str = "Demo User";

/// Resolved identity of the current operator
///
/// Role presence is structural: `Anonymous` has no role field at all,
/// `DemoBypass` always carries one, and `Authenticated` loses it only
/// when the profile fetch degraded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// No session established
    Anonymous,
    /// Remotely verified account session
    Authenticated(AccountIdentity),
    /// Constructed purely from locally persisted demo flags
    DemoBypass(DemoIdentity),
}

/// Identity backed by a verified remote session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountIdentity {
    /// Subject id of the remote session
    pub subject_id: String,
    pub display_name: Option<String>,
    /// Absent only when the profile fetch failed, timed out, or found
    /// no row; role checks then fail closed
    pub role: Option<Role>,
    pub department: Option<String>,
    pub store_id: Option<String>,
}

/// Identity backed by demo-bypass flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemoIdentity {
    pub subject_id: String,
    pub display_name: String,
    pub role: Role,
    pub department: Option<String>,
}

/// Discriminant of an identity, used for logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Anonymous,
    Authenticated,
    DemoBypass,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKind::Anonymous => write!(f, "anonymous"),
            IdentityKind::Authenticated => write!(f, "authenticated"),
            IdentityKind::DemoBypass => write!(f, "demo_bypass"),
        }
    }
}

impl AccountIdentity {
    /// Build a fully populated identity from a fetched profile row
    pub fn from_profile(profile: ProfileRecord) -> Self {
        Self {
            subject_id: profile.id,
            display_name: profile.full_name,
            role: Some(profile.role),
            department: profile.department,
            store_id: profile.store_id,
        }
    }

    /// Build a degraded identity for a verified session whose profile
    /// could not be loaded
    pub fn without_profile(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: None,
            role: None,
            department: None,
            store_id: None,
        }
    }
}

impl From<ProfileRecord> for AccountIdentity {
    fn from(profile: ProfileRecord) -> Self {
        Self::from_profile(profile)
    }
}

impl DemoIdentity {
    /// Build a demo identity from raw flag values
    ///
    /// Mirrors the bypass defaults: an absent or unparseable role flag
    /// falls back to manager, an absent name flag to the stock demo name.
    pub fn from_flags(
        role: Option<String>,
        display_name: Option<String>,
        department: Option<String>,
    ) -> Self {
        let role = role
            .as_deref()
            .and_then(|value| Role::from_str(value).ok())
            .unwrap_or(Role::Manager);

        Self {
            subject_id: DEMO_SUBJECT_ID.to_string(),
            display_name: display_name.unwrap_or_else(|| DEMO_DEFAULT_NAME.to_string()),
            role,
            department,
        }
    }
}

impl Identity {
    /// Discriminant of this identity
    pub fn kind(&self) -> IdentityKind {
        match self {
            Identity::Anonymous => IdentityKind::Anonymous,
            Identity::Authenticated(_) => IdentityKind::Authenticated,
            Identity::DemoBypass(_) => IdentityKind::DemoBypass,
        }
    }

    /// Subject id, absent for anonymous identities
    pub fn subject_id(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(account) => Some(&account.subject_id),
            Identity::DemoBypass(demo) => Some(&demo.subject_id),
        }
    }

    /// Display name, when one is known
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(account) => account.display_name.as_deref(),
            Identity::DemoBypass(demo) => Some(&demo.display_name),
        }
    }

    /// Effective role, absent for anonymous and degraded identities
    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(account) => account.role,
            Identity::DemoBypass(demo) => Some(demo.role),
        }
    }

    /// Department, when the profile or flags carry one
    pub fn department(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(account) => account.department.as_deref(),
            Identity::DemoBypass(demo) => demo.department.as_deref(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn is_manager(&self) -> bool {
        self.role() == Some(Role::Manager)
    }
}

impl Default for Identity {
    fn default() -> Self {
        Identity::Anonymous
    }
}
