//! User roles and the organizations users belong to

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Role of a platform user.
///
/// The role decides which daily counters a wallet tracks and which side of
/// the settlement maker-checker workflow a user may act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Merchant,
    Cashier,
    /// Finance officer of a merchant organization
    Finance,
    /// Staff of the central institution
    Admin,
}

impl UserRole {
    /// Roles allowed to raise settlement requests (makers)
    pub fn can_request_settlement(&self) -> bool {
        matches!(self, UserRole::Merchant | UserRole::Finance)
    }

    /// Roles allowed to review settlement requests (checkers)
    pub fn can_review_settlement(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// A platform user as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub role: UserRole,
    pub organization_id: Option<String>,
    /// ISO 3166 alpha-2 country code
    pub country: Option<String>,
    /// Politically exposed person
    pub is_pep: bool,
}

impl User {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            role,
            organization_id: None,
            country: None,
            is_pep: false,
        }
    }

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into().to_uppercase());
        self
    }

    pub fn with_pep(mut self, is_pep: bool) -> Self {
        self.is_pep = is_pep;
        self
    }
}

/// A merchant organization that settles collections to a bank account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

/// The authenticated caller of an engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!(UserRole::from_str("cashier").unwrap(), UserRole::Cashier);
        assert_eq!(UserRole::Finance.to_string(), "finance");
        assert!(UserRole::from_str("auditor").is_err());
    }

    #[test]
    fn test_maker_checker_roles_disjoint() {
        for role in [
            UserRole::Customer,
            UserRole::Merchant,
            UserRole::Cashier,
            UserRole::Finance,
            UserRole::Admin,
        ] {
            assert!(!(role.can_request_settlement() && role.can_review_settlement()));
        }
    }
}
