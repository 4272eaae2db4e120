use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::session::Session;
use crate::transport::{authorize, ApiRequest, ApiResponse, Transport};

/// List bodies come either bare or wrapped in a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Plain(Vec<T>),
    Page(Page<T>),
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Plain(items) => items,
            Self::Page(page) => page.results,
        }
    }
}

/// Decodes a list body; any shape other than an array or an envelope
/// becomes an empty list. Records that do not fit `T` are skipped one by one.
pub fn normalize_listing<T: DeserializeOwned>(body: &[u8]) -> Vec<T> {
    match serde_json::from_slice::<Listing<Value>>(body) {
        Ok(listing) => decode_each(listing.into_items()),
        Err(e) => {
            warn!(error = %e, "unrecognized list shape; using an empty list");
            Vec::new()
        }
    }
}

fn decode_each<T: DeserializeOwned>(raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(index, error = %e, "skipping undecodable list record");
                None
            }
        })
        .collect()
}

/// Nested lists inside a record, with the same per-item leniency as
/// top-level listings. `null` reads as empty.
pub(crate) fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(decode_each(raw.unwrap_or_default()))
}

/// Foreign keys arrive as a bare id or as the nested record.
pub(crate) fn id_or_object<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reference {
        Id(u64),
        Record { id: u64 },
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Reference>::deserialize(deserializer)? {
        Some(Reference::Id(id)) | Some(Reference::Record { id }) => Some(id),
        Some(Reference::Other(_)) | None => None,
    })
}

/// RFC 3339, or a naive local timestamp (read as UTC) from backends running
/// without time zone support. Anything else reads as absent.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::String(raw)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = OffsetDateTime::parse(&raw, &Rfc3339).ok().or_else(|| {
        PrimitiveDateTime::parse(
            &raw,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
        .or_else(|_| {
            PrimitiveDateTime::parse(
                &raw,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
            )
        })
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    });
    if parsed.is_none() {
        debug!(value = %raw, "unparseable timestamp ignored");
    }
    Ok(parsed)
}

/// Shared request plumbing for the resource clients.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Session,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs the interceptor, sends the request and turns non-2xx statuses
    /// into `ApiError::Status`.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = authorize(request, &self.session);
        let method = request.method.clone();
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        if !response.status.is_success() {
            debug!(%method, %path, status = %response.status, "request rejected");
            return Err(ApiError::from_status(
                response.status.as_u16(),
                &response.body,
            ));
        }
        Ok(response)
    }

    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        decode_body(&response.body)
    }

    pub async fn list<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Vec<T>, ApiError> {
        let response = self.execute(request).await?;
        Ok(normalize_listing(&response.body))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    /// DELETE ignores whatever body comes back.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::new(Method::DELETE, path)).await?;
        Ok(())
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.fetch(ApiRequest::new(method, path).json(body)).await
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}
