use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("could not encode request body: {0}")]
    Encode(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Builds a `Status` error, pulling the most useful message out of the body.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        Self::Status {
            status,
            detail: extract_detail(body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Short text suitable for an inline notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status, detail } if detail.is_empty() => {
                format!("request failed with status {status}")
            }
            Self::Status { detail, .. } => detail.clone(),
            Self::Transport(_) | Self::Timeout(_) => "network error".into(),
            Self::Encode(_) => "could not prepare the request".into(),
            Self::Decode(_) => "unexpected response from server".into(),
        }
    }
}

/// Login and token refresh failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credentials rejected (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("no refresh token stored")]
    MissingRefreshToken,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { detail, .. } if !detail.is_empty() => detail.clone(),
            Self::Rejected { .. } => "invalid credentials".into(),
            Self::MissingRefreshToken => "session expired, please log in again".into(),
            Self::Api(e) => e.user_message(),
        }
    }
}

/// Client-side validation of admin forms, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("an invitation needs a user or an email")]
    MissingInvitee,
}

/// Pulls a readable message out of an error body: a JSON string, then the
/// `detail` or `message` fields, then the compact JSON, then raw text.
pub fn extract_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Null) => String::new(),
        Ok(value) => ["detail", "message"]
            .iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(str::to_owned)
            .unwrap_or_else(|| value.to_string()),
        Err(_) => body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
