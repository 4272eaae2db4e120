use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Which of the backend's activity listing shapes to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivitiesEndpoint {
    /// `/api/guides/{id}/activities/`
    #[default]
    Nested,
    /// `/api/guides/{id}/activites/`
    NestedFr,
    /// `/api/activites/?guide={id}`
    Query,
}

impl ActivitiesEndpoint {
    pub fn path(self, guide_id: u64) -> String {
        match self {
            Self::Nested => format!("/api/guides/{guide_id}/activities/"),
            Self::NestedFr => format!("/api/guides/{guide_id}/activites/"),
            Self::Query => format!("/api/activites/?guide={guide_id}"),
        }
    }
}

impl FromStr for ActivitiesEndpoint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(Self::Nested),
            "nested-fr" => Ok(Self::NestedFr),
            "query" => Ok(Self::Query),
            other => anyhow::bail!("unknown activities endpoint {other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPaths {
    pub token: String,
    pub refresh: String,
    pub profile: String,
}

impl Default for AuthPaths {
    fn default() -> Self {
        Self {
            token: "/api/token/".into(),
            refresh: "/api/token/refresh/".into(),
            profile: "/api/me/".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub auth: AuthPaths,
    pub activities: ActivitiesEndpoint,
    pub http_timeout: Option<Duration>,
    pub session_file: PathBuf,
    pub notice_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".into(),
            auth: AuthPaths::default(),
            activities: ActivitiesEndpoint::default(),
            http_timeout: None,
            session_file: PathBuf::from(".guidebook-session.json"),
            notice_ttl: Duration::from_secs(5),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let api_base = lookup("GUIDEBOOK_API_BASE")
            .map(|v| trim_base(&v))
            .unwrap_or(defaults.api_base);
        let auth = AuthPaths {
            token: lookup("GUIDEBOOK_TOKEN_PATH").unwrap_or(defaults.auth.token),
            refresh: lookup("GUIDEBOOK_TOKEN_REFRESH_PATH").unwrap_or(defaults.auth.refresh),
            profile: lookup("GUIDEBOOK_PROFILE_PATH").unwrap_or(defaults.auth.profile),
        };
        let activities = match lookup("GUIDEBOOK_ACTIVITIES_ENDPOINT") {
            Some(v) => v
                .parse::<ActivitiesEndpoint>()
                .context("GUIDEBOOK_ACTIVITIES_ENDPOINT")?,
            None => defaults.activities,
        };
        let http_timeout = lookup("GUIDEBOOK_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let session_file = lookup("GUIDEBOOK_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);
        let notice_ttl = lookup("GUIDEBOOK_NOTICE_TTL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.notice_ttl);

        Ok(Self {
            api_base,
            auth,
            activities,
            http_timeout,
            session_file,
            notice_ttl,
        })
    }
}

fn trim_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).expect("defaults");
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.auth, AuthPaths::default());
        assert_eq!(config.activities, ActivitiesEndpoint::Nested);
        assert_eq!(config.http_timeout, None);
        assert_eq!(config.notice_ttl, Duration::from_secs(5));
    }

    #[test]
    fn trailing_slashes_are_trimmed_from_base() {
        let config = config_from(&[("GUIDEBOOK_API_BASE", "https://api.example.org///")])
            .expect("config");
        assert_eq!(config.api_base, "https://api.example.org");
    }

    #[test]
    fn endpoint_overrides_are_read() {
        let config = config_from(&[
            ("GUIDEBOOK_TOKEN_PATH", "/api/auth/login/"),
            ("GUIDEBOOK_ACTIVITIES_ENDPOINT", "query"),
            ("GUIDEBOOK_HTTP_TIMEOUT_SECS", "15"),
        ])
        .expect("config");
        assert_eq!(config.auth.token, "/api/auth/login/");
        assert_eq!(config.activities, ActivitiesEndpoint::Query);
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn unknown_activities_endpoint_is_rejected() {
        let err = config_from(&[("GUIDEBOOK_ACTIVITIES_ENDPOINT", "sideways")]).unwrap_err();
        assert!(err.to_string().contains("GUIDEBOOK_ACTIVITIES_ENDPOINT"));
    }

    #[test]
    fn activity_paths_follow_each_backend_shape() {
        assert_eq!(
            ActivitiesEndpoint::Nested.path(7),
            "/api/guides/7/activities/"
        );
        assert_eq!(
            ActivitiesEndpoint::NestedFr.path(7),
            "/api/guides/7/activites/"
        );
        assert_eq!(ActivitiesEndpoint::Query.path(7), "/api/activites/?guide=7");
    }
}
