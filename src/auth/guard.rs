use tracing::{debug, info};

use super::services::AuthService;

/// Where a refused navigation ends up.
pub const HOME_ROUTE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    fn home() -> Self {
        Self::Redirect(HOME_ROUTE.to_string())
    }
}

/// Admin-only gate in front of the admin view.
#[derive(Clone)]
pub struct AdminGuard {
    auth: AuthService,
}

impl AdminGuard {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }

    /// Anonymous subjects go home; a cached admin flag is trusted; anything
    /// else is settled by the profile endpoint.
    pub async fn can_activate(&self) -> GuardDecision {
        if !self.auth.is_authenticated() {
            debug!("guard: not authenticated");
            return GuardDecision::home();
        }
        if self.auth.is_admin() {
            return GuardDecision::Allow;
        }
        if self.auth.refresh_role_from_profile().await {
            GuardDecision::Allow
        } else {
            info!(user = ?self.auth.current_username(), "guard: admin access refused");
            GuardDecision::home()
        }
    }
}
