//! # User profile
//!
//! [`UserProfile`] mirrors a row of the BaaS `profiles` table. The server copy is
//! the source of truth; the client only ever holds a best-effort snapshot.
//!
//! [`ApprovalStatus`] tracks registration review. Providers start `pending` until
//! an admin approves them; customers are approved on sign-up.

use serde::{Deserialize, Serialize};
use store::Role;

/// Registration review status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Status a freshly registered account starts in.
    pub fn initial_for(role: Role) -> Self {
        match role {
            Role::Provider => ApprovalStatus::Pending,
            _ => ApprovalStatus::Approved,
        }
    }
}

/// Profile record from the `profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: ApprovalStatus,
}

impl UserProfile {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let mut profile = UserProfile {
            id: "u1".to_string(),
            role: Role::Customer,
            display_name: None,
            email: "ana@example.com".to_string(),
            phone: None,
            status: ApprovalStatus::Approved,
        };
        assert_eq!(profile.display_name(), "ana@example.com");

        profile.display_name = Some("Ana".to_string());
        assert_eq!(profile.display_name(), "Ana");
    }

    #[test]
    fn test_decode_row_without_optional_columns() {
        let row = r#"{"id":"u2","role":"provider","display_name":null,"email":"p@example.com"}"#;
        let profile: UserProfile = serde_json::from_str(row).unwrap();
        assert_eq!(profile.role, Role::Provider);
        assert_eq!(profile.status, ApprovalStatus::Pending);
        assert!(profile.phone.is_none());
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(ApprovalStatus::initial_for(Role::Provider), ApprovalStatus::Pending);
        assert_eq!(ApprovalStatus::initial_for(Role::Customer), ApprovalStatus::Approved);
    }
}
