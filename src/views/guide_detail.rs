use std::collections::BTreeMap;

use tracing::{error, warn};

use crate::guides::{group_by_day, Activity, Guide, GuidesClient};

pub const GUIDE_NOT_FOUND: &str = "guide not found";

/// One guide with its activities bucketed by day.
pub struct GuideDetailView {
    guides: GuidesClient,
    pub guide: Option<Guide>,
    pub activities_by_day: BTreeMap<u32, Vec<Activity>>,
    pub error: Option<String>,
    pub loading: bool,
}

impl GuideDetailView {
    pub fn new(guides: GuidesClient) -> Self {
        Self {
            guides,
            guide: None,
            activities_by_day: BTreeMap::new(),
            error: None,
            loading: false,
        }
    }

    pub async fn load(&mut self, id: u64) {
        self.loading = true;
        self.error = None;
        self.activities_by_day.clear();

        let mut guide = match self.guides.get(id).await {
            Ok(guide) => guide,
            Err(e) if e.is_not_found() => {
                warn!(guide_id = id, "guide not found");
                self.guide = None;
                self.error = Some(GUIDE_NOT_FOUND.to_string());
                self.loading = false;
                return;
            }
            Err(e) => {
                error!(guide_id = id, error = %e, "guide detail not loaded");
                self.guide = None;
                self.error = Some(format!("could not load guide: {}", e.user_message()));
                self.loading = false;
                return;
            }
        };

        // keep whatever activities came embedded when the listing fails
        match self.guides.activities(id).await {
            Ok(activities) => guide.activities = activities,
            Err(e) => warn!(guide_id = id, error = %e, "activities not loaded"),
        }
        self.activities_by_day = group_by_day(&guide.activities);
        self.guide = Some(guide);
        self.loading = false;
    }

    /// Days that have at least one activity, ascending.
    pub fn days(&self) -> Vec<u32> {
        self.activities_by_day.keys().copied().collect()
    }

    pub fn activities_on(&self, day: u32) -> &[Activity] {
        self.activities_by_day
            .get(&day)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
