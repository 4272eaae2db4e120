mod client;
mod dto;
mod grouping;

pub use client::{GuidesClient, GUIDES_PATH};
pub use dto::{Activity, Audience, Guide, GuidePatch, Mobility, NewGuide, Season};
pub use grouping::{category_label, group_by_day};
