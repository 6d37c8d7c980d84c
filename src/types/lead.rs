//! Lead Types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decode::CandidateDecoders;

/// Pipeline status of a lead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Negotiation,
    Closed,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Negotiation => "negotiation",
            Self::Closed => "closed",
            Self::Lost => "lost",
        }
    }
}

/// Lead record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: LeadStatus,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub budget_min: Option<f64>,
    #[serde(default)]
    pub budget_max: Option<f64>,
    #[serde(default)]
    pub property_interest: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub activity_count: Option<u32>,
}

impl Lead {
    pub fn check(self) -> Result<Self, String> {
        if self.id == 0 {
            return Err("lead id must be positive".to_string());
        }
        match &self.email {
            Some(email) if !email.contains('@') => Err(format!("invalid email: {}", email)),
            _ => Ok(self),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Decode a single lead.
pub fn decode_lead(value: &Value) -> Result<Lead, String> {
    Lead::deserialize(value)
        .map_err(|e| e.to_string())
        .and_then(Lead::check)
}

fn decode_leads(items: &Value) -> Result<Vec<Lead>, String> {
    items
        .as_array()
        .ok_or_else(|| "expected an array of leads".to_string())?
        .iter()
        .map(decode_lead)
        .collect()
}

/// Create/update payload. Unset fields are omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LeadInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_interest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Query parameters for `GET /leads`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadQuery {
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl LeadQuery {
    /// Query-string pairs for the set parameters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// A page of leads plus the server-side total.
#[derive(Clone, Debug, PartialEq)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub total: u64,
}

fn envelope(
    value: &Value,
    items_key: &str,
    total_key: &str,
) -> Result<LeadPage, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "expected an object".to_string())?;
    let items = object
        .get(items_key)
        .ok_or_else(|| format!("missing field `{}`", items_key))?;
    let total = object
        .get(total_key)
        .and_then(Value::as_u64)
        .ok_or_else(|| format!("missing integer field `{}`", total_key))?;
    Ok(LeadPage {
        leads: decode_leads(items)?,
        total,
    })
}

/// Decoders for the lead list envelopes the backend may return.
pub fn lead_page_decoders() -> CandidateDecoders<LeadPage> {
    CandidateDecoders::new("lead list")
        .candidate("items/total", |v| envelope(v, "items", "total"))
        .candidate("results/count", |v| envelope(v, "results", "count"))
        .candidate("leads/total", |v| envelope(v, "leads", "total"))
        .candidate("array", |v| {
            let leads = decode_leads(v)?;
            let total = leads.len() as u64;
            Ok(LeadPage { leads, total })
        })
}
