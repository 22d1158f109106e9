use serde::Serialize;
use serde_json::{Map, Value};

// One activity as the client knows it. Counts live in the signup control
// state; this row carries the descriptive fields and the participant list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub schedule: String,
    pub capacity: i64,
    pub participants: Vec<String>,
    // Per-activity override of the card signup endpoint.
    pub signup_url: Option<String>,
}

impl ActivityRecord {
    /// Builds a record from one entry of `GET /activities`, keyed by name.
    ///
    /// Missing or ill-typed fields are defaulted: `max_participants` to 0,
    /// `participants` to an empty list, `id` to the activity name.
    pub fn from_details(name: &str, details: &Map<String, Value>) -> Self {
        Self {
            id: string_field(details, "id").unwrap_or_else(|| name.to_string()),
            title: name.to_string(),
            description: string_field(details, "description").unwrap_or_default(),
            schedule: string_field(details, "schedule").unwrap_or_default(),
            capacity: count_field(details, "max_participants").unwrap_or(0),
            participants: participants_field(details),
            signup_url: string_field(details, "signup_url"),
        }
    }

    /// Builds a record from one element of `GET /activities.json`.
    ///
    /// Returns the record together with the server-declared `registered`
    /// count (if any) and the `signed` flag.
    pub fn from_loose(activity: &Map<String, Value>) -> (Self, Option<i64>, bool) {
        let record = Self {
            id: string_field(activity, "id").unwrap_or_default(),
            title: string_field(activity, "title").unwrap_or_else(|| "Untitled".to_string()),
            description: string_field(activity, "description").unwrap_or_default(),
            schedule: string_field(activity, "schedule").unwrap_or_default(),
            capacity: count_field(activity, "capacity").unwrap_or(0),
            participants: participants_field(activity),
            signup_url: string_field(activity, "signup_url")
                .or_else(|| string_field(activity, "signupUrl")),
        };
        let registered = count_field(activity, "registered");
        let signed = activity.get("signed").map(is_truthy).unwrap_or(false);
        (record, registered, signed)
    }

    pub fn registered(&self) -> i64 {
        self.participants.len() as i64
    }
}

// Ids may arrive as numbers once the sanitizer has coerced them.
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn count_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn participants_field(map: &Map<String, Value>) -> Vec<String> {
    let Some(Value::Array(items)) = map.get("participants") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

/// Loose truthiness for flags coming from untyped payloads.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn details_default_missing_fields() {
        let record = ActivityRecord::from_details("Chess Club", &Map::new());
        assert_eq!(record.id, "Chess Club");
        assert_eq!(record.title, "Chess Club");
        assert_eq!(record.capacity, 0);
        assert!(record.participants.is_empty());
    }

    #[test]
    fn details_read_capacity_and_participants() {
        let details = object(json!({
            "description": "Learn strategies",
            "schedule": "Fridays",
            "max_participants": 12,
            "participants": ["michael@mergington.edu", "daniel@mergington.edu"]
        }));
        let record = ActivityRecord::from_details("Chess Club", &details);
        assert_eq!(record.capacity, 12);
        assert_eq!(record.registered(), 2);
        assert_eq!(record.schedule, "Fridays");
    }

    #[test]
    fn non_array_participants_become_empty() {
        let details = object(json!({ "participants": "a@x.com" }));
        let record = ActivityRecord::from_details("Drama", &details);
        assert!(record.participants.is_empty());
    }

    #[test]
    fn loose_shape_reads_registered_and_signed() {
        let activity = object(json!({
            "id": 7,
            "capacity": 3,
            "registered": 2,
            "signed": true
        }));
        let (record, registered, signed) = ActivityRecord::from_loose(&activity);
        assert_eq!(record.id, "7");
        assert_eq!(record.title, "Untitled");
        assert_eq!(record.capacity, 3);
        assert_eq!(registered, Some(2));
        assert!(signed);
    }
}
