use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::api::{id_or_object, lenient_items, lenient_timestamp};
use crate::invitations::Invitation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mobility {
    Voiture,
    Velo,
    Pied,
    Moto,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Ete,
    Printemps,
    Automne,
    Hiver,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Famille,
    Seul,
    Groupe,
    Amis,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobility: Option<Mobility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "id_or_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_items",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub activities: Vec<Activity>,
    #[serde(
        default,
        deserialize_with = "lenient_items",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub invitations: Vec<Invitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
    /// Fields this client does not model, kept so a PUT sends them back.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Guide {
    /// `title`, else `name`, else `Guide #<id>`.
    pub fn display_name(&self) -> String {
        non_blank(&self.title)
            .or_else(|| non_blank(&self.name))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Guide #{}", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 1-based.
    #[serde(default = "first", deserialize_with = "position")]
    pub day: u32,
    #[serde(default = "first", deserialize_with = "position")]
    pub order: u32,
    #[serde(
        default,
        deserialize_with = "id_or_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub guide: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, alias = "hours", skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl Activity {
    pub fn display_name(&self) -> String {
        non_blank(&self.title)
            .or_else(|| non_blank(&self.name))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Activity #{}", self.id))
    }
}

/// Body for `POST /api/guides/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewGuide {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobility: Option<Mobility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl NewGuide {
    /// Sends the title under both field names the backend has used.
    pub fn titled(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            title: Some(title.clone()),
            name: Some(title),
            ..Self::default()
        }
    }
}

/// Partial update for `PATCH /api/guides/{id}/`; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuidePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobility: Option<Mobility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl GuidePatch {
    pub fn rename(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: Some(name.clone()),
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the set fields to a locally held copy.
    pub fn apply_to(&self, guide: &mut Guide) {
        fn set<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        set(&mut guide.title, &self.title);
        set(&mut guide.name, &self.name);
        set(&mut guide.description, &self.description);
        set(&mut guide.city, &self.city);
        set(&mut guide.days, &self.days);
        set(&mut guide.mobility, &self.mobility);
        set(&mut guide.season, &self.season);
        set(&mut guide.audience, &self.audience);
        set(&mut guide.category, &self.category);
        set(&mut guide.price, &self.price);
    }
}

fn first() -> u32 {
    1
}

/// Day or order as a number or numeric string; `null` and junk fall back to 1.
fn position<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(value
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_else(first))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Decimal fields arrive as numbers or as strings such as `"12.50"`.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guide_decodes_backend_shape() {
        let guide: Guide = serde_json::from_value(json!({
            "id": 4,
            "title": "Lyon en 3 jours",
            "description": "",
            "days": 3,
            "mobility": "velo",
            "season": "printemps",
            "audience": "amis",
            "owner": 1,
            "created_at": "2024-03-01T10:00:00.123456Z",
            "updated_at": "2024-03-02T08:30:00+01:00",
            "activities": [
                { "id": 9, "guide": 4, "title": "Fourvière", "category": "visite",
                  "opening_hours": "9h-18h", "day": 1, "order": 2 }
            ]
        }))
        .expect("guide");

        assert_eq!(guide.display_name(), "Lyon en 3 jours");
        assert_eq!(guide.mobility, Some(Mobility::Velo));
        assert_eq!(guide.season, Some(Season::Printemps));
        assert_eq!(guide.audience, Some(Audience::Amis));
        assert_eq!(guide.activities.len(), 1);
        assert_eq!(guide.activities[0].opening_hours.as_deref(), Some("9h-18h"));
        assert!(guide.created_at.is_some());
        assert!(guide.extra.is_empty());
    }

    #[test]
    fn display_name_falls_back_to_name_then_id() {
        let guide: Guide =
            serde_json::from_value(json!({ "id": 2, "title": "  ", "name": "Alpes" })).expect("guide");
        assert_eq!(guide.display_name(), "Alpes");

        let guide: Guide = serde_json::from_value(json!({ "id": 7 })).expect("guide");
        assert_eq!(guide.display_name(), "Guide #7");
    }

    #[test]
    fn unknown_values_and_fields_survive() {
        let guide: Guide = serde_json::from_value(json!({
            "id": 1,
            "mobility": "trottinette",
            "people_max": 8,
            "price": "12.50"
        }))
        .expect("guide");
        assert_eq!(guide.mobility, Some(Mobility::Unknown));
        assert_eq!(guide.price, Some(12.5));
        assert_eq!(guide.extra.get("people_max"), Some(&json!(8)));

        let back = serde_json::to_value(&guide).expect("encode");
        assert_eq!(back["people_max"], json!(8));
    }

    #[test]
    fn activity_defaults_and_aliases() {
        let activity: Activity =
            serde_json::from_value(json!({ "id": 3, "name": "Plage", "hours": "toute la journée" }))
                .expect("activity");
        assert_eq!(activity.day, 1);
        assert_eq!(activity.order, 1);
        assert_eq!(activity.display_name(), "Plage");
        assert_eq!(activity.opening_hours.as_deref(), Some("toute la journée"));
    }

    #[test]
    fn loose_backend_records_still_decode() {
        let guide: Guide = serde_json::from_value(json!({
            "id": 5,
            "owner": { "id": 2, "username": "alice" },
            "created_at": "2024-03-01T10:00:00",
            "activities": [
                { "id": 1, "guide": { "id": 5 }, "day": null, "order": "3" },
                { "title": "missing id" },
                { "id": 2, "guide": 5, "day": 2 }
            ]
        }))
        .expect("guide");

        assert_eq!(guide.owner, Some(2));
        assert!(guide.created_at.is_some());
        assert_eq!(guide.activities.len(), 2);
        assert_eq!(guide.activities[0].guide, Some(5));
        assert_eq!(guide.activities[0].day, 1);
        assert_eq!(guide.activities[0].order, 3);
        assert_eq!(guide.activities[1].day, 2);
    }

    #[test]
    fn new_guide_and_patch_send_only_set_fields() {
        let body = serde_json::to_value(NewGuide {
            city: Some("Nice".into()),
            mobility: Some(Mobility::Pied),
            ..NewGuide::titled("Côte")
        })
        .expect("encode");
        assert_eq!(
            body,
            json!({ "title": "Côte", "name": "Côte", "city": "Nice", "mobility": "pied" })
        );

        let patch = serde_json::to_value(GuidePatch::rename("Riviera")).expect("encode");
        assert_eq!(patch, json!({ "title": "Riviera", "name": "Riviera" }));
        assert!(GuidePatch::default().is_empty());
    }

    #[test]
    fn patch_applies_locally() {
        let mut guide: Guide =
            serde_json::from_value(json!({ "id": 1, "title": "Old", "days": 2 })).expect("guide");
        GuidePatch::rename("New").apply_to(&mut guide);
        assert_eq!(guide.display_name(), "New");
        assert_eq!(guide.days, Some(2));
    }
}
