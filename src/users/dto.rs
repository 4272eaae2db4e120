use serde::{Deserialize, Serialize};

use super::is_valid_email;
use crate::auth::Role;
use crate::error::FormError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    /// Whatever the backend sent; `role()` does not read it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    /// Admin iff staff or superuser.
    pub fn role(&self) -> Role {
        Role::from_flags(Some(self.is_superuser), Some(self.is_staff), None)
    }

    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(|p| p.as_deref().map(str::trim))
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

fn active() -> bool {
    true
}

/// Body for `POST /api/users/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub is_staff: bool,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.username.trim().is_empty() {
            return Err(FormError::Required("username"));
        }
        if self.email.trim().is_empty() {
            return Err(FormError::Required("email"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(FormError::InvalidEmail(self.email.clone()));
        }
        if self.password.is_empty() {
            return Err(FormError::Required("password"));
        }
        Ok(())
    }
}

/// Partial update for `PATCH /api/users/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_staff: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), FormError> {
        if let Some(username) = &self.username {
            if username.trim().is_empty() {
                return Err(FormError::Required("username"));
            }
        }
        match &self.email {
            Some(email) if !is_valid_email(email.trim()) => {
                Err(FormError::InvalidEmail(email.clone()))
            }
            _ => Ok(()),
        }
    }
}
