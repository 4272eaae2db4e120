use std::collections::BTreeMap;

use super::dto::Activity;

/// Buckets activities by day, each bucket ordered by `order`. Ties keep
/// their input order; days without activities are absent.
pub fn group_by_day(activities: &[Activity]) -> BTreeMap<u32, Vec<Activity>> {
    let mut by_day: BTreeMap<u32, Vec<Activity>> = BTreeMap::new();
    for activity in activities {
        by_day.entry(activity.day).or_default().push(activity.clone());
    }
    for bucket in by_day.values_mut() {
        bucket.sort_by_key(|a| a.order);
    }
    by_day
}

/// Human label for an activity category.
pub fn category_label(category: Option<&str>) -> String {
    let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) else {
        return "Non spécifié".to_string();
    };
    let label = match category.to_lowercase().as_str() {
        "restaurant" => "Restaurant",
        "visite" => "Visite",
        "transport" => "Transport",
        "hotel" => "Hébergement",
        "activite" => "Activité",
        "shopping" => "Shopping",
        "musee" => "Musée",
        "chateau" => "Château",
        "activite nautique" => "Activité nautique",
        "parc" => "Parc",
        "grotte" => "Grotte",
        "plage" => "Plage",
        "festival" => "Festival",
        "zoo" => "Zoo",
        "aquarium" => "Aquarium",
        "visite guidee" => "Visite guidée",
        "vignoble" => "Vignoble",
        _ => return category.to_string(),
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn activity(id: u64, day: u32, order: u32) -> Activity {
        serde_json::from_value(json!({ "id": id, "day": day, "order": order })).expect("activity")
    }

    fn ids(bucket: &[Activity]) -> Vec<u64> {
        bucket.iter().map(|a| a.id).collect()
    }

    #[test]
    fn groups_and_orders_within_each_day() {
        let grouped = group_by_day(&[activity(1, 1, 2), activity(2, 1, 1), activity(3, 2, 5)]);

        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(ids(&grouped[&1]), vec![2, 1]);
        assert_eq!(ids(&grouped[&2]), vec![3]);
    }

    #[test]
    fn equal_orders_keep_input_order() {
        let grouped = group_by_day(&[activity(10, 3, 1), activity(11, 3, 1), activity(12, 3, 0)]);
        assert_eq!(ids(&grouped[&3]), vec![12, 10, 11]);
    }

    #[test]
    fn days_come_out_ascending_whatever_the_input() {
        let grouped = group_by_day(&[activity(1, 7, 1), activity(2, 2, 1), activity(3, 4, 1)]);
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![2, 4, 7]);
        assert!(group_by_day(&[]).is_empty());
    }

    #[rstest]
    #[case(None, "Non spécifié")]
    #[case(Some(""), "Non spécifié")]
    #[case(Some("hotel"), "Hébergement")]
    #[case(Some("Restaurant"), "Restaurant")]
    #[case(Some("ACTIVITE"), "Activité")]
    #[case(Some("musee"), "Musée")]
    #[case(Some("visite guidee"), "Visite guidée")]
    #[case(Some(" Activite Nautique "), "Activité nautique")]
    #[case(Some("randonnee"), "randonnee")]
    fn category_labels(#[case] category: Option<&str>, #[case] expected: &str) {
        assert_eq!(category_label(category), expected);
    }
}
