//! Optimistic decoding of access token payloads.
//!
//! Nothing here verifies a signature. The claims are a hint for the UI (who is
//! logged in, when the token expires, whether it looks like an admin); the
//! authoritative answer always comes from the profile endpoint.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::role::Role;

/// Payload of an access token as issued by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_staff: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn role(&self) -> Role {
        Role::from_flags(self.is_superuser, self.is_staff, self.role.as_deref())
    }

    pub fn grants_admin(&self) -> bool {
        self.role().is_admin()
    }

    /// A token without `exp` never expires on the client side.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }

    /// `user_id` is a number or a numeric string depending on the backend version.
    pub fn user_id(&self) -> Option<u64> {
        match self.extra.get("user_id")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Token segments are base64url; some issuers keep the `=` padding.
const SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes the payload segment of a compact token. The header and signature
/// are never looked at. Returns `None` for anything malformed instead of
/// failing; claims of an unexpected type are read as absent.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut segments = token.split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        debug!("token is not three dot separated segments");
        return None;
    };

    let bytes = match SEGMENT.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "token payload is not base64url");
            return None;
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(payload)) => Some(TokenClaims::from_payload(payload)),
        Ok(_) => {
            debug!("token payload is not an object");
            None
        }
        Err(e) => {
            debug!(error = %e, "token payload is not json");
            None
        }
    }
}

impl TokenClaims {
    fn from_payload(mut payload: Map<String, Value>) -> Self {
        let mut text = |key: &str| match payload.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let token_type = text("token_type");
        let username = text("username");
        let email = text("email");
        let role = text("role");

        let mut flag = |key: &str| match payload.remove(key) {
            Some(Value::Bool(b)) => Some(b),
            _ => None,
        };
        let is_staff = flag("is_staff");
        let is_superuser = flag("is_superuser");

        let exp = match payload.remove("exp") {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.floor() as i64),
            _ => None,
        };

        Self {
            token_type,
            username,
            email,
            role,
            is_staff,
            is_superuser,
            exp,
            extra: payload,
        }
    }
}
