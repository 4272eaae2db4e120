use std::sync::Arc;

use reqwest::Method;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::claims::decode_claims;
use super::dto::{LoginRequest, Profile, RefreshRequest, TokenPair};
use super::role::Role;
use crate::api::ApiClient;
use crate::config::AuthPaths;
use crate::error::{ApiError, AuthError};
use crate::session::Session;
use crate::transport::ApiRequest;

/// Derives authentication and admin status from the stored session and the
/// profile endpoint, and publishes both to whoever is watching.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    paths: AuthPaths,
    logged_in: Arc<watch::Sender<bool>>,
    admin: Arc<watch::Sender<bool>>,
}

impl AuthService {
    pub fn new(api: ApiClient, paths: AuthPaths) -> Self {
        let session = api.session();
        let logged_in = has_valid_token(session, now());
        let admin = session
            .role()
            .is_some_and(|role| Role::from_cached(&role).is_admin());
        Self {
            api,
            paths,
            logged_in: Arc::new(watch::channel(logged_in).0),
            admin: Arc::new(watch::channel(admin).0),
        }
    }

    fn session(&self) -> &Session {
        self.api.session()
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let pair = match self.exchange_credentials(username, password).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "login failed; clearing session");
                self.session().clear();
                self.logged_in.send_replace(false);
                self.admin.send_replace(false);
                return Err(e);
            }
        };

        self.session()
            .store_tokens(&pair.access, pair.refresh.as_deref());
        self.session().set_username(username);
        self.logged_in.send_replace(true);
        self.compute_admin_from_token();
        if self.needs_role_refresh() {
            self.refresh_role_from_profile().await;
        }
        info!(admin = self.is_admin(), "logged in");
        Ok(())
    }

    async fn exchange_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AuthError> {
        let body = serde_json::to_value(LoginRequest { username, password })
            .map_err(|e| ApiError::Encode(e.to_string()))?;
        let request = ApiRequest::new(Method::POST, self.paths.token.as_str()).json(body);
        self.api.fetch(request).await.map_err(rejected)
    }

    /// Clears every session key; `is_authenticated` is false right after.
    pub fn logout(&self) {
        self.session().clear();
        self.logged_in.send_replace(false);
        self.admin.send_replace(false);
        info!("logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(now())
    }

    /// Token present and, when it carries `exp`, strictly in the future.
    pub fn is_authenticated_at(&self, now: i64) -> bool {
        has_valid_token(self.session(), now)
    }

    /// Cached flag only; see `refresh_role_from_profile` for the server check.
    pub fn is_admin(&self) -> bool {
        *self.admin.borrow()
    }

    pub fn auth_changes(&self) -> watch::Receiver<bool> {
        self.logged_in.subscribe()
    }

    pub fn admin_changes(&self) -> watch::Receiver<bool> {
        self.admin.subscribe()
    }

    /// No cached role yet, or the cache says "not admin".
    pub fn needs_role_refresh(&self) -> bool {
        self.session().role().is_none() || !self.is_admin()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session().access_token()
    }

    pub fn current_username(&self) -> Option<String> {
        self.session().username()
    }

    /// Asks the profile endpoint who we are. Any failure counts as non-admin
    /// and drops the cached role.
    #[instrument(skip(self))]
    pub async fn refresh_role_from_profile(&self) -> bool {
        if self.session().access_token().is_none() {
            self.session().clear_role();
            self.admin.send_replace(false);
            return false;
        }

        match self.api.get::<Profile>(&self.paths.profile).await {
            Ok(profile) => {
                let role = profile.role();
                self.session().set_role(role);
                self.admin.send_replace(role.is_admin());
                debug!(%role, username = ?profile.username, "role refreshed from profile");
                role.is_admin()
            }
            Err(e) => {
                warn!(error = %e, "profile fetch failed; treating subject as non-admin");
                self.session().clear_role();
                self.admin.send_replace(false);
                false
            }
        }
    }

    /// Trades the stored refresh token for a new access token.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Result<(), AuthError> {
        let refresh = self
            .session()
            .refresh_token()
            .ok_or(AuthError::MissingRefreshToken)?;
        let pair: TokenPair = self
            .api
            .post(&self.paths.refresh, &RefreshRequest { refresh: &refresh })
            .await
            .map_err(rejected)?;
        self.session()
            .store_tokens(&pair.access, pair.refresh.as_deref());
        self.logged_in.send_replace(true);
        debug!("access token refreshed");
        Ok(())
    }

    fn compute_admin_from_token(&self) {
        let claims = self
            .session()
            .access_token()
            .and_then(|token| decode_claims(&token));
        match claims {
            Some(claims) if claims.grants_admin() => {
                self.admin.send_replace(true);
                self.session().set_role(Role::Admin);
            }
            // leave the role unset so the profile can decide
            _ => {
                self.admin.send_replace(false);
                self.session().clear_role();
            }
        }
    }
}

fn has_valid_token(session: &Session, now: i64) -> bool {
    let Some(token) = session.access_token() else {
        return false;
    };
    match decode_claims(&token) {
        Some(claims) => !claims.is_expired_at(now),
        None => true,
    }
}

fn rejected(error: ApiError) -> AuthError {
    match error {
        ApiError::Status { status, detail } => AuthError::Rejected { status, detail },
        other => AuthError::Api(other),
    }
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
pub(crate) fn service_with(
    transport: std::sync::Arc<dyn crate::transport::Transport>,
    session: Session,
) -> AuthService {
    AuthService::new(ApiClient::new(transport, session), AuthPaths::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::tests::{mint, now as clock};
    use crate::auth::claims::TokenClaims;
    use crate::transport::fake::FakeTransport;
    use serde_json::json;

    fn token(claims: TokenClaims) -> String {
        mint(&claims)
    }

    fn expiring_in(secs: i64) -> String {
        token(TokenClaims {
            exp: Some(clock() + secs),
            ..TokenClaims::default()
        })
    }

    #[tokio::test]
    async fn login_stores_tokens_and_resolves_role_from_profile() {
        let fake = FakeTransport::new();
        fake.reply(
            Method::POST,
            "/api/token/",
            200,
            json!({ "access": expiring_in(300), "refresh": "r-1" }),
        );
        fake.reply(
            Method::GET,
            "/api/me/",
            200,
            json!({ "id": 1, "username": "alice", "role": "admin", "is_staff": true }),
        );
        let session = Session::in_memory();
        let auth = service_with(fake.clone(), session.clone());

        auth.login("alice", "pw").await.expect("login");

        assert!(auth.is_authenticated());
        assert!(auth.is_admin());
        assert_eq!(session.refresh_token().as_deref(), Some("r-1"));
        assert_eq!(session.username().as_deref(), Some("alice"));
        assert_eq!(session.role().as_deref(), Some("admin"));

        let login = fake.last(&Method::POST, "/api/token/").expect("login request");
        assert_eq!(
            login.body,
            Some(json!({ "username": "alice", "password": "pw" }))
        );
        let me = fake.last(&Method::GET, "/api/me/").expect("profile request");
        assert!(me
            .header_value("Authorization")
            .is_some_and(|v| v.starts_with("Bearer ")));
    }

    #[tokio::test]
    async fn admin_claims_skip_the_profile_round_trip() {
        let fake = FakeTransport::new();
        let access = token(TokenClaims {
            is_superuser: Some(true),
            exp: Some(clock() + 300),
            ..TokenClaims::default()
        });
        fake.reply(Method::POST, "/api/token/", 200, json!({ "access": access }));
        let auth = service_with(fake.clone(), Session::in_memory());

        auth.login("root", "pw").await.expect("login");

        assert!(auth.is_admin());
        assert_eq!(fake.count(&Method::GET, "/api/me/"), 0);
    }

    #[tokio::test]
    async fn rejected_login_clears_partial_state() {
        let fake = FakeTransport::new();
        fake.reply(
            Method::POST,
            "/api/token/",
            401,
            json!({ "detail": "No active account found with the given credentials" }),
        );
        let session = Session::in_memory();
        session.set_username("stale");
        session.set_role(Role::Admin);
        let auth = service_with(fake, session.clone());

        let err = auth.login("alice", "wrong").await.unwrap_err();

        match err {
            AuthError::Rejected { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "No active account found with the given credentials");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(session.username(), None);
        assert_eq!(session.role(), None);
        assert!(!auth.is_authenticated());
        assert!(!auth.is_admin());
    }

    #[tokio::test]
    async fn transport_failure_during_login_is_an_api_error() {
        let fake = FakeTransport::new();
        fake.fail(Method::POST, "/api/token/", "connection refused");
        let auth = service_with(fake, Session::in_memory());

        let err = auth.login("alice", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Api(ApiError::Transport(_))));
    }

    #[test]
    fn expired_token_is_not_authenticated() {
        let session = Session::in_memory();
        session.store_tokens(&expiring_in(-10), None);
        let auth = service_with(FakeTransport::new(), session);
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn token_without_expiry_or_malformed_counts_as_authenticated() {
        let session = Session::in_memory();
        session.store_tokens(&token(TokenClaims::default()), None);
        let auth = service_with(FakeTransport::new(), session.clone());
        assert!(auth.is_authenticated());

        session.store_tokens("definitely-not-a-jwt", None);
        assert!(auth.is_authenticated());
    }

    #[test]
    fn expired_tokens_with_odd_headers_or_claims_are_not_authenticated() {
        use crate::auth::claims::tests::compact;
        let session = Session::in_memory();
        let auth = service_with(FakeTransport::new(), session.clone());
        for (header, payload) in [
            (r#"{"alg":"none"}"#, r#"{"exp":1000}"#),
            (r#"{"alg":"ES512"}"#, r#"{"exp":1000}"#),
            (r#"{"alg":"HS256"}"#, r#"{"exp":1000,"role":1}"#),
        ] {
            session.store_tokens(&compact(header, payload), None);
            assert!(!auth.is_authenticated(), "{header} {payload}");
        }
    }

    #[test]
    fn expiry_is_compared_strictly() {
        let session = Session::in_memory();
        session.store_tokens(
            &token(TokenClaims {
                exp: Some(5_000),
                ..TokenClaims::default()
            }),
            None,
        );
        let auth = service_with(FakeTransport::new(), session);
        assert!(auth.is_authenticated_at(4_999));
        assert!(!auth.is_authenticated_at(5_000));
    }

    #[test]
    fn logout_is_immediate() {
        let session = Session::in_memory();
        session.store_tokens(&expiring_in(300), Some("r"));
        session.set_role(Role::Admin);
        let auth = service_with(FakeTransport::new(), session.clone());
        assert!(auth.is_authenticated());
        assert!(auth.is_admin());
        let changes = auth.auth_changes();

        auth.logout();

        assert!(!auth.is_authenticated());
        assert!(!auth.is_admin());
        assert!(!*changes.borrow());
        assert_eq!(session.refresh_token(), None);
    }

    #[test]
    fn cached_role_seeds_the_admin_flag() {
        let session = Session::in_memory();
        session.store_tokens(&expiring_in(300), None);
        session.set_role(Role::Admin);
        let auth = service_with(FakeTransport::new(), session);
        assert!(auth.is_admin());
        assert!(!auth.needs_role_refresh());
    }

    #[tokio::test]
    async fn profile_flags_grant_admin() {
        for profile in [
            json!({ "id": 1, "is_staff": true }),
            json!({ "id": 1, "is_superuser": true }),
            json!({ "id": 1, "role": "Admin" }),
        ] {
            let fake = FakeTransport::new();
            fake.reply(Method::GET, "/api/me/", 200, profile.clone());
            let session = Session::in_memory();
            session.store_tokens(&expiring_in(300), None);
            let auth = service_with(fake, session.clone());

            assert!(auth.refresh_role_from_profile().await, "profile {profile}");
            assert!(auth.is_admin());
            assert_eq!(session.role().as_deref(), Some("admin"));
        }
    }

    #[tokio::test]
    async fn plain_profile_caches_user_role() {
        let fake = FakeTransport::new();
        fake.reply(
            Method::GET,
            "/api/me/",
            200,
            json!({ "id": 2, "role": "user", "is_staff": false }),
        );
        let session = Session::in_memory();
        session.store_tokens(&expiring_in(300), None);
        let auth = service_with(fake, session.clone());

        assert!(!auth.refresh_role_from_profile().await);
        assert_eq!(session.role().as_deref(), Some("user"));
        assert!(auth.needs_role_refresh());
    }

    #[tokio::test]
    async fn profile_failure_fails_closed() {
        let fake = FakeTransport::new();
        fake.reply(Method::GET, "/api/me/", 500, json!({ "detail": "boom" }));
        let session = Session::in_memory();
        session.store_tokens(&expiring_in(300), None);
        session.set_role(Role::Admin);
        let auth = service_with(fake, session.clone());
        let mut admin = auth.admin_changes();
        assert!(*admin.borrow_and_update());

        assert!(!auth.refresh_role_from_profile().await);

        assert!(!auth.is_admin());
        assert_eq!(session.role(), None);
        assert!(admin.has_changed().expect("sender alive"));
        assert!(!*admin.borrow());
    }

    #[tokio::test]
    async fn profile_refresh_without_token_skips_the_network() {
        let fake = FakeTransport::new();
        let auth = service_with(fake.clone(), Session::in_memory());

        assert!(!auth.refresh_role_from_profile().await);
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn refresh_access_token_replaces_access_and_keeps_refresh() {
        let fake = FakeTransport::new();
        let renewed = expiring_in(600);
        fake.reply(
            Method::POST,
            "/api/token/refresh/",
            200,
            json!({ "access": renewed }),
        );
        let session = Session::in_memory();
        session.store_tokens(&expiring_in(-5), Some("r-1"));
        let auth = service_with(fake.clone(), session.clone());
        assert!(!auth.is_authenticated());

        auth.refresh_access_token().await.expect("refresh");

        assert!(auth.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some(renewed.as_str()));
        assert_eq!(session.refresh_token().as_deref(), Some("r-1"));
        let sent = fake.last(&Method::POST, "/api/token/refresh/").expect("request");
        assert_eq!(sent.body, Some(json!({ "refresh": "r-1" })));
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_fails() {
        let auth = service_with(FakeTransport::new(), Session::in_memory());
        let err = auth.refresh_access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MissingRefreshToken));
    }
}
