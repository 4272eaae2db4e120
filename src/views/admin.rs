use std::time::Duration;

use tracing::{error, info, instrument};

use super::notice::{Notice, NoticeBoard};
use crate::auth::{AdminGuard, AuthService, GuardDecision};
use crate::error::{ApiError, FormError};
use crate::guides::{Guide, GuidePatch, GuidesClient, NewGuide};
use crate::invitations::{Invitation, InvitationsClient, NewInvitation};
use crate::users::{NewUser, User, UsersClient};

pub const DATA_LOADING: &str = "data still loading, try again in a moment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Users,
    Guides,
    Invitations,
}

/// Admin console: users, guides and invitations side by side.
pub struct AdminView {
    auth: AuthService,
    guard: AdminGuard,
    users_client: UsersClient,
    guides_client: GuidesClient,
    invitations_client: InvitationsClient,
    notices: NoticeBoard,
    pub tab: AdminTab,
    pub users: Vec<User>,
    pub guides: Vec<Guide>,
    pub invitations: Vec<Invitation>,
}

impl AdminView {
    pub fn new(
        auth: AuthService,
        users_client: UsersClient,
        guides_client: GuidesClient,
        invitations_client: InvitationsClient,
        notice_ttl: Duration,
    ) -> Self {
        Self {
            guard: AdminGuard::new(auth.clone()),
            auth,
            users_client,
            guides_client,
            invitations_client,
            notices: NoticeBoard::new(notice_ttl),
            tab: AdminTab::default(),
            users: Vec::new(),
            guides: Vec::new(),
            invitations: Vec::new(),
        }
    }

    /// Runs the guard and, when let through, loads every table.
    pub async fn open(&mut self) -> GuardDecision {
        let decision = self.guard.can_activate().await;
        if decision.is_allowed() {
            self.reload_all().await;
        }
        decision
    }

    pub fn current_username(&self) -> Option<String> {
        self.auth.current_username()
    }

    pub fn set_tab(&mut self, tab: AdminTab) {
        self.tab = tab;
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    pub async fn reload_all(&mut self) {
        let (users, guides, invitations) = tokio::join!(
            self.users_client.list(),
            self.guides_client.list(),
            self.invitations_client.list(),
        );
        self.apply_users(users);
        self.apply_guides(guides);
        self.apply_invitations(invitations);
    }

    pub async fn load_users(&mut self) {
        let result = self.users_client.list().await;
        self.apply_users(result);
    }

    pub async fn load_guides(&mut self) {
        let result = self.guides_client.list().await;
        self.apply_guides(result);
    }

    pub async fn load_invitations(&mut self) {
        let result = self.invitations_client.list().await;
        self.apply_invitations(result);
    }

    fn apply_users(&mut self, result: Result<Vec<User>, ApiError>) {
        match result {
            Ok(users) => self.users = users,
            Err(e) => self.fail("could not load users", &e),
        }
    }

    fn apply_guides(&mut self, result: Result<Vec<Guide>, ApiError>) {
        match result {
            Ok(guides) => self.guides = guides,
            Err(e) => self.fail("could not load guides", &e),
        }
    }

    fn apply_invitations(&mut self, result: Result<Vec<Invitation>, ApiError>) {
        match result {
            Ok(invitations) => self.invitations = invitations,
            Err(e) => self.fail("could not load invitations", &e),
        }
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&mut self, user: &NewUser) -> bool {
        if let Err(e) = user.validate() {
            self.reject(e);
            return false;
        }
        match self.users_client.create(user).await {
            Ok(_) => {
                self.notices.success("user created");
                self.load_users().await;
                true
            }
            Err(e) => {
                self.fail("could not create user", &e);
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&mut self, id: u64) -> bool {
        match self.users_client.delete(id).await {
            Ok(()) => {
                self.notices.success("user deleted");
                self.load_users().await;
                true
            }
            Err(e) => {
                self.fail("could not delete user", &e);
                false
            }
        }
    }

    #[instrument(skip(self, guide))]
    pub async fn create_guide(&mut self, guide: &NewGuide) -> bool {
        let named = [&guide.title, &guide.name]
            .into_iter()
            .any(|n| n.as_deref().is_some_and(|n| !n.trim().is_empty()));
        if !named {
            self.reject(FormError::Required("title"));
            return false;
        }
        match self.guides_client.create(guide).await {
            Ok(_) => {
                self.notices.success("guide created");
                self.load_guides().await;
                true
            }
            Err(e) => {
                self.fail("could not create guide", &e);
                false
            }
        }
    }

    /// A blank or unchanged name sends nothing and returns false.
    #[instrument(skip(self))]
    pub async fn rename_guide(&mut self, id: u64, name: &str) -> bool {
        let name = name.trim();
        let unchanged = self
            .guides
            .iter()
            .find(|g| g.id == id)
            .is_some_and(|g| g.display_name() == name);
        if name.is_empty() || unchanged {
            info!(guide_id = id, "rename skipped");
            return false;
        }
        match self.guides_client.update(id, &GuidePatch::rename(name)).await {
            Ok(_) => {
                self.notices.success("guide updated");
                self.load_guides().await;
                true
            }
            Err(e) => {
                self.fail("could not update guide", &e);
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_guide(&mut self, id: u64) -> bool {
        match self.guides_client.delete(id).await {
            Ok(()) => {
                self.notices.success("guide deleted");
                self.load_guides().await;
                true
            }
            Err(e) => {
                self.fail("could not delete guide", &e);
                false
            }
        }
    }

    /// Refused until both guides and users are loaded.
    #[instrument(skip(self, invitation), fields(guide_id = invitation.guide))]
    pub async fn create_invitation(&mut self, invitation: &NewInvitation) -> bool {
        if self.guides.is_empty() || self.users.is_empty() {
            self.notices.error(DATA_LOADING);
            return false;
        }
        if let Err(e) = invitation.validate() {
            self.reject(e);
            return false;
        }
        match self.invitations_client.create(invitation).await {
            Ok(_) => {
                self.notices.success("invitation created");
                self.load_invitations().await;
                true
            }
            Err(e) => {
                self.fail("could not create invitation", &e);
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_invitation(&mut self, id: u64) -> bool {
        match self.invitations_client.delete(id).await {
            Ok(()) => {
                self.notices.success("invitation deleted");
                self.load_invitations().await;
                true
            }
            Err(e) => {
                self.fail("could not delete invitation", &e);
                false
            }
        }
    }

    pub fn guide_name(&self, id: u64) -> String {
        self.guides
            .iter()
            .find(|g| g.id == id)
            .map(Guide::display_name)
            .unwrap_or_else(|| format!("Guide #{id}"))
    }

    pub fn user_name(&self, id: u64) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("User #{id}"))
    }

    /// Users an invitation can go to; admins are left out.
    pub fn invitable_users(&self) -> Vec<&User> {
        self.users.iter().filter(|u| !u.role().is_admin()).collect()
    }

    fn reject(&mut self, e: FormError) {
        self.notices.error(e.to_string());
    }

    fn fail(&mut self, what: &str, e: &ApiError) {
        error!(error = %e, "{what}");
        self.notices.error(format!("{what}: {}", e.user_message()));
    }
}
