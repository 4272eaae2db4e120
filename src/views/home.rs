use tracing::{error, info};

use crate::auth::AuthService;
use crate::error::FormError;
use crate::guides::{Guide, GuidesClient};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.username.trim().is_empty() {
            return Err(FormError::Required("username"));
        }
        if self.password.is_empty() {
            return Err(FormError::Required("password"));
        }
        Ok(())
    }
}

/// Landing page: login form plus the list of guides once connected.
pub struct HomeView {
    auth: AuthService,
    guides_client: GuidesClient,
    pub connected: bool,
    pub login_error: Option<String>,
    pub guides: Vec<Guide>,
    pub guides_error: Option<String>,
}

impl HomeView {
    pub fn new(auth: AuthService, guides_client: GuidesClient) -> Self {
        let connected = auth.is_authenticated();
        Self {
            auth,
            guides_client,
            connected,
            login_error: None,
            guides: Vec::new(),
            guides_error: None,
        }
    }

    /// Loads guides when a valid session already exists.
    pub async fn init(&mut self) {
        self.connected = self.auth.is_authenticated();
        if self.connected {
            self.fetch_guides().await;
        }
    }

    pub fn is_admin(&self) -> bool {
        self.auth.is_admin()
    }

    pub fn username(&self) -> Option<String> {
        self.auth.current_username()
    }

    /// Returns whether the login went through. A blank field sends nothing.
    pub async fn submit(&mut self, form: &LoginForm) -> bool {
        self.login_error = None;
        if let Err(e) = form.validate() {
            self.login_error = Some(e.to_string());
            return false;
        }

        match self.auth.login(form.username.trim(), &form.password).await {
            Ok(()) => {
                self.connected = true;
                info!(username = %form.username.trim(), "home: logged in");
                self.fetch_guides().await;
                true
            }
            Err(e) => {
                error!(error = %e, "home: login failed");
                self.connected = false;
                self.login_error = Some(e.user_message());
                false
            }
        }
    }

    pub fn logout(&mut self) {
        self.auth.logout();
        self.connected = false;
        self.guides.clear();
        self.guides_error = None;
    }

    pub async fn fetch_guides(&mut self) {
        self.guides_error = None;
        match self.guides_client.list().await {
            Ok(guides) => self.guides = guides,
            Err(e) => {
                error!(error = %e, "home: guides not loaded");
                self.guides_error = Some(e.user_message());
            }
        }
    }

    pub fn guide_route(id: u64) -> String {
        format!("/guide/{id}")
    }
}
