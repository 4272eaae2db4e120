use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::guides::GuidesClient;
use crate::invitations::InvitationsClient;
use crate::session::{FileStore, Session, TokenStore};
use crate::transport::{HttpTransport, Transport};
use crate::users::UsersClient;
use crate::views::{AdminView, GuideDetailView, HomeView};

/// Everything a front end needs, wired once from configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Session,
    pub auth: AuthService,
    pub guides: GuidesClient,
    pub users: UsersClient,
    pub invitations: InvitationsClient,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_config(config)
    }

    /// Real HTTP transport plus the on-disk session file.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let transport = Arc::new(
            HttpTransport::new(&config.api_base, config.http_timeout)
                .context("building http client")?,
        ) as Arc<dyn Transport>;
        let store = Arc::new(
            FileStore::open(&config.session_file)
                .with_context(|| format!("opening {}", config.session_file.display()))?,
        ) as Arc<dyn TokenStore>;
        debug!(api_base = %config.api_base, session_file = %config.session_file.display(), "state initialized");
        Ok(Self::from_parts(config, transport, store))
    }

    pub fn from_parts(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let session = Session::new(store);
        let api = ApiClient::new(transport, session.clone());
        Self {
            auth: AuthService::new(api.clone(), config.auth.clone()),
            guides: GuidesClient::new(api.clone(), config.activities),
            users: UsersClient::new(api.clone(), config.auth.profile.clone()),
            invitations: InvitationsClient::new(api),
            session,
            config: Arc::new(config),
        }
    }

    pub fn home_view(&self) -> HomeView {
        HomeView::new(self.auth.clone(), self.guides.clone())
    }

    pub fn admin_view(&self) -> AdminView {
        AdminView::new(
            self.auth.clone(),
            self.users.clone(),
            self.guides.clone(),
            self.invitations.clone(),
            self.config.notice_ttl,
        )
    }

    pub fn guide_detail_view(&self) -> GuideDetailView {
        GuideDetailView::new(self.guides.clone())
    }

    /// In-memory session over a scripted backend.
    #[cfg(test)]
    pub(crate) fn fake() -> (Self, Arc<crate::transport::fake::FakeTransport>) {
        let fake = crate::transport::fake::FakeTransport::new();
        let state = Self::from_parts(
            AppConfig::default(),
            fake.clone(),
            Arc::new(crate::session::MemoryStore::new()),
        );
        (state, fake)
    }
}
