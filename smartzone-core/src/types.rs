//! Core data types shared across the SmartZone workspace

use serde::{Deserialize, Serialize};

/// Staff role carried by a profile record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Store manager with access to administrative screens
    Manager,
    /// Floor worker with access to operational screens
    Worker,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Manager => write!(f, "manager"),
            Role::Worker => write!(f, "worker"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manager" => Ok(Role::Manager),
            "worker" => Ok(Role::Worker),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Verified remote account session as reported by the session service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSession {
    /// Stable subject identifier of the account
    pub subject_id: String,
    /// Account email, when the session carries one
    pub email: Option<String>,
}

impl RemoteSession {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Session lifecycle notification emitted by the session service
///
/// Every kind triggers a full re-resolution; the kind itself is only
/// recorded in logs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Read model of a staff profile row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    /// Profile id, matches the session subject id
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    /// Store the staff member is assigned to
    pub store_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(Role::from_str("manager"), Ok(Role::Manager));
        assert_eq!(Role::from_str("Worker"), Ok(Role::Worker));
        assert!(Role::from_str("supervisor").is_err());
    }

    #[test]
    fn role_display_matches_wire_form() {
        assert_eq!(Role::Manager.to_string(), "manager");
        assert_eq!(Role::Worker.to_string(), "worker");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Manager).unwrap();
        assert_eq!(json, "\"manager\"");
        let back: Role = serde_json::from_str("\"worker\"").unwrap();
        assert_eq!(back, Role::Worker);
    }
}
