use reqwest::Method;
use serde_json::json;
use tracing::{info, instrument};

use super::dto::{AcceptOutcome, Invitation, NewInvitation};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

pub const INVITATIONS_PATH: &str = "/api/invitations/";

fn invitation_path(id: u64) -> String {
    format!("{INVITATIONS_PATH}{id}/")
}

#[derive(Clone)]
pub struct InvitationsClient {
    api: ApiClient,
}

impl InvitationsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Invitation>, ApiError> {
        self.api
            .list(ApiRequest::new(Method::GET, INVITATIONS_PATH))
            .await
    }

    pub async fn get(&self, id: u64) -> Result<Invitation, ApiError> {
        self.api.get(&invitation_path(id)).await
    }

    #[instrument(skip(self, invitation), fields(guide_id = invitation.guide))]
    pub async fn create(&self, invitation: &NewInvitation) -> Result<Invitation, ApiError> {
        let created: Invitation = self.api.post(INVITATIONS_PATH, invitation).await?;
        info!(invitation_id = created.id, "invitation created");
        Ok(created)
    }

    /// Full replacement (PUT).
    #[instrument(skip(self, invitation))]
    pub async fn update(
        &self,
        id: u64,
        invitation: &NewInvitation,
    ) -> Result<Invitation, ApiError> {
        self.api.put(&invitation_path(id), invitation).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.api.delete(&invitation_path(id)).await?;
        info!(invitation_id = id, "invitation deleted");
        Ok(())
    }

    /// Accepts an invitation addressed to the logged-in user.
    #[instrument(skip(self))]
    pub async fn accept(&self, id: u64) -> Result<AcceptOutcome, ApiError> {
        let path = format!("{}accept/", invitation_path(id));
        let response = self
            .api
            .execute(ApiRequest::new(Method::POST, path).json(json!({})))
            .await?;
        // the action may answer 204 with nothing in it
        if response.body.is_empty() {
            return Ok(AcceptOutcome::default());
        }
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::transport::fake::FakeTransport;

    fn client(fake: &std::sync::Arc<FakeTransport>) -> InvitationsClient {
        InvitationsClient::new(ApiClient::new(fake.clone(), Session::in_memory()))
    }

    #[tokio::test]
    async fn list_null_body_is_empty() {
        let fake = FakeTransport::new();
        fake.reply_raw(Method::GET, INVITATIONS_PATH, 200, "null");
        assert!(client(&fake).list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn update_uses_put() {
        let fake = FakeTransport::new();
        fake.reply(
            Method::PUT,
            "/api/invitations/2/",
            200,
            json!({ "id": 2, "guide": 1, "invited_email": "x@y.fr" }),
        );
        let updated = client(&fake)
            .update(2, &NewInvitation::for_email(1, "x@y.fr"))
            .await
            .expect("update");
        assert_eq!(updated.invited_email.as_deref(), Some("x@y.fr"));
        let sent = fake.last(&Method::PUT, "/api/invitations/2/").expect("put");
        assert_eq!(sent.body, Some(json!({ "guide": 1, "invited_email": "x@y.fr" })));
    }

    #[tokio::test]
    async fn accept_posts_to_the_action_route() {
        let fake = FakeTransport::new();
        fake.reply(
            Method::POST,
            "/api/invitations/7/accept/",
            200,
            json!({ "status": "accepted" }),
        );
        let outcome = client(&fake).accept(7).await.expect("accept");
        assert_eq!(outcome.status.as_deref(), Some("accepted"));
    }

    #[tokio::test]
    async fn accept_with_empty_body_and_forbidden() {
        let fake = FakeTransport::new();
        fake.reply_raw(Method::POST, "/api/invitations/7/accept/", 204, "");
        fake.reply(
            Method::POST,
            "/api/invitations/8/accept/",
            403,
            json!({ "detail": "Cette invitation ne vous est pas destinée." }),
        );
        let invitations = client(&fake);

        assert_eq!(invitations.accept(7).await.expect("accept"), AcceptOutcome::default());
        let err = invitations.accept(8).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.user_message(), "Cette invitation ne vous est pas destinée.");
    }
}
