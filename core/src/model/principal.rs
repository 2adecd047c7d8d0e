// storefront/src/model/principal.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a known role")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
  type Err = UnknownRole;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "user" => Ok(Role::User),
      "admin" => Ok(Role::Admin),
      _ => Err(UnknownRole(s.to_string())),
    }
  }
}

/// Authenticated caller identity, issued by the external identity provider.
/// Every controller operation receives it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub id: String,
  pub email: Option<String>,
  pub role: Role,
}

impl Principal {
  pub fn user(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      email: None,
      role: Role::User,
    }
  }

  pub fn admin(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      email: None,
      role: Role::Admin,
    }
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(email.into());
    self
  }

  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}
