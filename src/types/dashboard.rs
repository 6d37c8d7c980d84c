//! Dashboard Types
//!
//! Normalization of `GET /dashboard`. The payload is accepted with or without
//! a `{data: ...}` envelope, in snake_case or camelCase; every number is
//! coerced and missing values default to zero.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::activity::{coerce_number, Activity};

/// Normalized dashboard statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_leads: f64,
    pub new_leads: f64,
    pub contacted_leads: f64,
    pub qualified_leads: f64,
    pub closed_leads: f64,
    pub conversion_rate: f64,
    pub leads_by_source: BTreeMap<String, f64>,
    pub leads_by_status: BTreeMap<String, f64>,
    pub recent_activities: Vec<Activity>,
}

fn pick<'a>(data: &'a Value, snake: &str, camel: &str) -> Option<&'a Value> {
    data.get(snake)
        .filter(|v| !v.is_null())
        .or_else(|| data.get(camel).filter(|v| !v.is_null()))
}

fn number(data: &Value, snake: &str, camel: &str) -> f64 {
    pick(data, snake, camel)
        .and_then(coerce_number)
        .unwrap_or(0.0)
}

/// `{k: n}`, `[[k, n]]`, or `[{status: k, count: n}]` into a map.
fn counts(value: Option<&Value>) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    match value {
        Some(Value::Object(map)) => {
            for (key, v) in map {
                out.insert(key.clone(), coerce_number(v).unwrap_or(0.0));
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                let entry = match item {
                    Value::Array(pair) if pair.len() == 2 => pair[0]
                        .as_str()
                        .map(|key| (key.to_string(), coerce_number(&pair[1]))),
                    Value::Object(obj) => obj
                        .get("status")
                        .or_else(|| obj.get("source"))
                        .and_then(Value::as_str)
                        .map(|key| (key.to_string(), obj.get("count").and_then(coerce_number))),
                    _ => None,
                };
                if let Some((key, count)) = entry {
                    out.insert(key, count.unwrap_or(0.0));
                }
            }
        }
        _ => {}
    }
    out
}

impl DashboardStats {
    /// Normalize any dashboard payload. Never fails.
    pub fn from_value(raw: &Value) -> Self {
        let data = match raw.get("data") {
            Some(inner) if inner.is_object() => inner,
            _ => raw,
        };

        let recent_activities = match pick(data, "recent_activities", "recentActivities") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| Activity::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        };

        Self {
            total_leads: number(data, "total_leads", "totalLeads"),
            new_leads: number(data, "new_leads", "newLeads"),
            contacted_leads: number(data, "contacted_leads", "contactedLeads"),
            qualified_leads: number(data, "qualified_leads", "qualifiedLeads"),
            closed_leads: number(data, "closed_leads", "closedLeads"),
            conversion_rate: number(data, "conversion_rate", "conversionRate"),
            leads_by_source: counts(pick(data, "leads_by_source", "leadsBySource")),
            leads_by_status: counts(pick(data, "leads_by_status", "leadsByStatus")),
            recent_activities,
        }
    }
}
