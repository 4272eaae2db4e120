use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::api::{id_or_object, lenient_timestamp};
use crate::error::FormError;
use crate::users::is_valid_email;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: u64,
    #[serde(default, deserialize_with = "id_or_object")]
    pub guide: Option<u64>,
    #[serde(
        default,
        deserialize_with = "id_or_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub invited_user: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

/// Body for `POST /api/invitations/` and `PUT /api/invitations/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewInvitation {
    pub guide: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_user: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_email: Option<String>,
}

impl NewInvitation {
    pub fn for_user(guide: u64, user: u64) -> Self {
        Self {
            guide,
            invited_user: Some(user),
            invited_email: None,
        }
    }

    pub fn for_email(guide: u64, email: impl Into<String>) -> Self {
        Self {
            guide,
            invited_user: None,
            invited_email: Some(email.into()),
        }
    }

    /// Needs an invitee; an email, when given, must look like one.
    pub fn validate(&self) -> Result<(), FormError> {
        let email = self
            .invited_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        match (self.invited_user, email) {
            (None, None) => Err(FormError::MissingInvitee),
            (_, Some(email)) if !is_valid_email(email) => {
                Err(FormError::InvalidEmail(email.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// What the accept action answers, e.g. `{"status": "accepted"}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AcceptOutcome {
    #[serde(default)]
    pub status: Option<String>,
}
