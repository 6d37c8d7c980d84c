//! Activity Types
//!
//! Activities are decoded leniently: missing or malformed fields fall back to
//! defaults instead of failing the whole response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of interaction logged against a lead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    #[default]
    Note,
}

impl ActivityType {
    /// Parse leniently; unknown values become [`ActivityType::Note`].
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "call" => Self::Call,
            "email" => Self::Email,
            "meeting" => Self::Meeting,
            _ => Self::Note,
        }
    }
}

/// Activity record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Activity {
    pub id: u64,
    pub lead_id: Option<u64>,
    pub user_id: Option<u64>,
    pub activity_type: ActivityType,
    pub title: String,
    pub notes: String,
    pub duration: Option<f64>,
    pub activity_date: String,
    pub created_at: String,
    pub user_name: String,
}

/// Coerce numbers and numeric strings.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn coerce_id(value: Option<&Value>) -> Option<u64> {
    value
        .and_then(coerce_number)
        .filter(|n| *n >= 0.0)
        .map(|n| n as u64)
}

fn first<'a>(object: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Activity {
    /// Decode one activity, accepting snake_case and camelCase field names.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "expected an activity object".to_string())?;

        let activity_type = text(first(object, &["activity_type", "activityType", "type"]))
            .map(|raw| ActivityType::parse_lenient(&raw))
            .unwrap_or_default();

        let title = text(first(object, &["title", "activity_title"]))
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "No Title".to_string());

        let duration = match first(object, &["duration"]) {
            Some(Value::String(s)) if s.is_empty() => Some(0.0),
            Some(value) => Some(coerce_number(value).unwrap_or(0.0)),
            None if object.contains_key("duration") => Some(0.0),
            None => None,
        };

        Ok(Self {
            id: coerce_id(first(object, &["id", "activity_id"])).unwrap_or(0),
            lead_id: coerce_id(first(object, &["lead_id", "leadId"])),
            user_id: coerce_id(first(object, &["user_id", "userId"])),
            activity_type,
            title,
            notes: text(first(object, &["notes", "note"])).unwrap_or_default(),
            duration,
            activity_date: text(first(object, &["activity_date", "activityDate", "date"]))
                .unwrap_or_default(),
            created_at: text(first(object, &["created_at", "createdAt"])).unwrap_or_default(),
            user_name: text(first(object, &["user_name", "userName"]))
                .unwrap_or_else(|| "Unknown User".to_string()),
        })
    }
}

/// Decode an array of activities.
pub fn decode_activities(value: &Value) -> Result<Vec<Activity>, String> {
    value
        .as_array()
        .ok_or_else(|| "expected an array of activities".to_string())?
        .iter()
        .map(Activity::from_value)
        .collect()
}

/// Payload for `POST /leads/{id}/activities`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivityInput {
    pub activity_type: ActivityType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub activity_date: String,
}
