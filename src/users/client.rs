use reqwest::Method;
use tracing::{info, instrument};

use super::dto::{NewUser, User, UserPatch};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

pub const USERS_PATH: &str = "/api/users/";

fn user_path(id: u64) -> String {
    format!("{USERS_PATH}{id}/")
}

#[derive(Clone)]
pub struct UsersClient {
    api: ApiClient,
    profile_path: String,
}

impl UsersClient {
    pub fn new(api: ApiClient, profile_path: impl Into<String>) -> Self {
        Self {
            api,
            profile_path: profile_path.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.api.list(ApiRequest::new(Method::GET, USERS_PATH)).await
    }

    pub async fn get(&self, id: u64) -> Result<User, ApiError> {
        self.api.get(&user_path(id)).await
    }

    /// Callers run `NewUser::validate` first; the backend has the last word.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create(&self, user: &NewUser) -> Result<User, ApiError> {
        let created: User = self.api.post(USERS_PATH, user).await?;
        info!(user_id = created.id, "user created");
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: u64, patch: &UserPatch) -> Result<User, ApiError> {
        self.api.patch(&user_path(id), patch).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.api.delete(&user_path(id)).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    /// The logged-in user as the profile endpoint describes it.
    pub async fn current(&self) -> Result<User, ApiError> {
        self.api.get(&self.profile_path).await
    }
}
