use std::sync::Arc;

use reqwest::Method;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use super::dto::{Activity, Guide, GuidePatch, NewGuide};
use crate::api::ApiClient;
use crate::config::ActivitiesEndpoint;
use crate::error::ApiError;
use crate::transport::ApiRequest;

pub const GUIDES_PATH: &str = "/api/guides/";

fn guide_path(id: u64) -> String {
    format!("{GUIDES_PATH}{id}/")
}

/// Guides and their activities. Keeps the last list it saw (patched by its
/// own mutations) so several views can follow the same data.
#[derive(Clone)]
pub struct GuidesClient {
    api: ApiClient,
    activities: ActivitiesEndpoint,
    snapshot: Arc<watch::Sender<Vec<Guide>>>,
}

impl GuidesClient {
    pub fn new(api: ApiClient, activities: ActivitiesEndpoint) -> Self {
        Self {
            api,
            activities,
            snapshot: Arc::new(watch::channel(Vec::new()).0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Guide>> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> Vec<Guide> {
        self.snapshot.borrow().clone()
    }

    /// Always asks the server; intermediaries are told not to cache.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Guide>, ApiError> {
        let request = ApiRequest::new(Method::GET, GUIDES_PATH)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Expires", "0");
        let guides: Vec<Guide> = self.api.list(request).await?;
        debug!(count = guides.len(), "guides listed");
        self.snapshot.send_replace(guides.clone());
        Ok(guides)
    }

    pub async fn get(&self, id: u64) -> Result<Guide, ApiError> {
        self.api.get(&guide_path(id)).await
    }

    #[instrument(skip(self, guide))]
    pub async fn create(&self, guide: &NewGuide) -> Result<Guide, ApiError> {
        let created: Guide = self.api.post(GUIDES_PATH, guide).await?;
        info!(guide_id = created.id, "guide created");
        self.snapshot.send_modify(|guides| guides.push(created.clone()));
        Ok(created)
    }

    /// Partial update (PATCH).
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: u64, patch: &GuidePatch) -> Result<Guide, ApiError> {
        let updated: Guide = self.api.patch(&guide_path(id), patch).await?;
        self.store_local(&updated);
        Ok(updated)
    }

    /// Full replacement (PUT).
    #[instrument(skip(self, guide))]
    pub async fn replace(&self, id: u64, guide: &Guide) -> Result<Guide, ApiError> {
        let replaced: Guide = self.api.put(&guide_path(id), guide).await?;
        self.store_local(&replaced);
        Ok(replaced)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.api.delete(&guide_path(id)).await?;
        info!(guide_id = id, "guide deleted");
        self.snapshot.send_modify(|guides| guides.retain(|g| g.id != id));
        Ok(())
    }

    /// Activities of one guide, in whatever order the server sent them.
    #[instrument(skip(self))]
    pub async fn activities(&self, guide_id: u64) -> Result<Vec<Activity>, ApiError> {
        let request = ApiRequest::new(Method::GET, self.activities.path(guide_id));
        let mut activities: Vec<Activity> = self.api.list(request).await?;
        // the flat endpoint may ignore the filter
        activities.retain(|a| a.guide.map_or(true, |g| g == guide_id));
        Ok(activities)
    }

    fn store_local(&self, guide: &Guide) {
        self.snapshot.send_modify(|guides| {
            match guides.iter_mut().find(|g| g.id == guide.id) {
                Some(slot) => *slot = guide.clone(),
                None => guides.push(guide.clone()),
            }
        });
    }
}
