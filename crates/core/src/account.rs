//! Account records and roles.
//!
//! An account is the identity behind every caller: patients, doctors, and
//! admins share one collection, distinguished by [`Role`]. Doctor accounts
//! additionally own a provider profile (see [`crate::provider`]), linked by
//! a weak id reference rather than embedding.

use chrono::{DateTime, Utc};
use medibook_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::CredentialHash;

/// The role an account acts under. Authorization gates check membership of
/// a caller's role in each handler's allowed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    /// Parses the lowercase wire form.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored account document.
///
/// The credential hash lives here but is excluded from every read model;
/// only [`AccountView`] crosses the API boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    #[serde(default)]
    pub phone: String,
    pub credential: CredentialHash,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The credential-free read model of this account.
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            name: self.name.to_string(),
            email: self.email.to_string(),
            phone: self.phone.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Read model of an account, safe to serialize to callers.
#[derive(Clone, Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_lowercase_wire_form() {
        assert_eq!(Role::parse("patient"), Some(Role::Patient));
        assert_eq!(Role::parse("doctor"), Some(Role::Doctor));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("Doctor"), None);
    }

    #[test]
    fn account_view_excludes_credential() {
        let account = Account {
            id: Uuid::new_v4(),
            name: NonEmptyText::new("Asha Rao").unwrap(),
            email: EmailAddress::parse("asha@example.com").unwrap(),
            phone: "07700900000".into(),
            credential: CredentialHash::derive("password123").unwrap(),
            role: Role::Patient,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(account.view()).expect("view should serialize");
        assert!(json.get("credential").is_none());
        assert_eq!(json["email"], "asha@example.com");
        assert_eq!(json["role"], "patient");
    }
}
