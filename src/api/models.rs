// src/api/models.rs - Payloads exchanged with the UPS calc backend

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{self, Time};

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub power: f64,
    /// Power factor
    #[serde(default)]
    pub coeff: f64,
    #[serde(default)]
    pub is_delete: bool,
}

fn default_count() -> u32 {
    1
}

/// A component attached to a bid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line id, distinct from the component id
    pub id: i64,
    #[serde(default)]
    pub component_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub coeff: f64,
    #[serde(default)]
    pub power: f64,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Runtime in hours
    #[serde(default)]
    pub battery_life: f64,
    #[serde(default)]
    pub calculated_power: f64,
}

/// Well-known status tags. The backend speaks Russian; English aliases are
/// accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Draft,
    Formed,
    Calculated,
    Completed,
    Deleted,
    Rejected,
}

impl StatusKind {
    pub const ALL: [StatusKind; 6] = [
        Self::Draft,
        Self::Formed,
        Self::Calculated,
        Self::Completed,
        Self::Deleted,
        Self::Rejected,
    ];

    /// The tag the server uses.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Draft => "черновик",
            Self::Formed => "сформирован",
            Self::Calculated => "рассчитан",
            Self::Completed => "завершена",
            Self::Deleted => "удален",
            Self::Rejected => "отклонена",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Formed => "formed",
            Self::Calculated => "calculated",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let folded = utils::fold(raw);
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == folded || kind.alias() == folded)
    }
}

pub const UNKNOWN_STATUS: &str = "неизвестен";

/// Free-form status string, compared case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BidStatus(String);

impl BidStatus {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> Option<StatusKind> {
        StatusKind::parse(&self.0)
    }

    pub fn is(&self, kind: StatusKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Exact, case-insensitive comparison with another tag.
    pub fn matches(&self, other: &str) -> bool {
        utils::fold(&self.0) == utils::fold(other)
    }

    pub fn is_draft(&self) -> bool {
        self.is(StatusKind::Draft)
    }
}

impl Default for BidStatus {
    fn default() -> Self {
        Self(UNKNOWN_STATUS.to_string())
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_creator() -> String {
    "система".to_string()
}

fn status_or_unknown<'de, D>(deserializer: D) -> Result<BidStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(s) if !s.trim().is_empty() => BidStatus::new(s),
        _ => BidStatus::default(),
    })
}

fn string_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).unwrap_or_else(default_creator))
}

/// A UPS sizing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    #[serde(default, deserialize_with = "status_or_unknown")]
    pub status: BidStatus,
    #[serde(default)]
    pub date_update: Option<String>,
    #[serde(default)]
    pub date_finish: Option<String>,
    #[serde(default)]
    pub incoming_current: Option<f64>,
    #[serde(default)]
    pub calculated_power_count: Option<f64>,
    #[serde(default = "default_creator", deserialize_with = "string_or_default")]
    pub creator_login: String,
    #[serde(default)]
    pub moderator_login: Option<String>,
    #[serde(default)]
    pub components: Vec<CartLine>,
}

impl Bid {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.date_update.as_deref().and_then(Time::parse_timestamp)
    }

    /// Day of the last update as written by the server.
    pub fn updated_on(&self) -> Option<NaiveDate> {
        self.date_update.as_deref().and_then(Time::local_date)
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.date_finish.as_deref().and_then(Time::parse_timestamp)
    }

    /// Sum of the lines' calculated power.
    pub fn total_calculated_power(&self) -> f64 {
        self.components.iter().map(|line| line.calculated_power).sum()
    }

    pub fn item_count(&self) -> usize {
        self.components.len()
    }
}

/// Draft summary returned by the cart endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartSummary {
    pub bid_id: Option<i64>,
    pub items_count: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCartSummary {
    #[serde(default)]
    bid_id: Option<i64>,
    #[serde(default)]
    items_count: Option<u32>,
    #[serde(default)]
    count_items: Option<u32>,
}

impl From<RawCartSummary> for CartSummary {
    fn from(raw: RawCartSummary) -> Self {
        let items_count = raw
            .items_count
            .filter(|count| *count > 0)
            .or(raw.count_items)
            .unwrap_or(0);
        Self {
            bid_id: raw.bid_id.filter(|id| *id > 0),
            items_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    #[serde(rename = "isModerator")]
    pub is_moderator: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    pub password: String,
    pub old_password: String,
}

/// Fields the decline endpoint reports back
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub date_finish: Option<String>,
    #[serde(default)]
    pub moderator_login: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bid_defaults() {
        let bid: Bid = serde_json::from_value(json!({ "id": 4, "status": null })).unwrap();
        assert_eq!(bid.status.as_str(), UNKNOWN_STATUS);
        assert_eq!(bid.creator_login, "система");
        assert!(bid.updated_at().is_none());
        assert!(bid.components.is_empty());
    }

    #[test]
    fn test_status_aliases() {
        let status = BidStatus::new("Сформирован");
        assert_eq!(status.kind(), Some(StatusKind::Formed));
        assert!(status.matches("сформирован"));
        assert!(!status.matches("сформ"));

        assert_eq!(StatusKind::parse("REJECTED"), Some(StatusKind::Rejected));
        assert_eq!(BidStatus::new("archived").kind(), None);
    }

    #[test]
    fn test_line_defaults_and_total_power() {
        let bid: Bid = serde_json::from_value(json!({
            "id": 9,
            "status": "завершена",
            "components": [
                { "id": 1, "component_id": 10, "calculated_power": 1.5 },
                { "id": 2, "component_id": 11, "count": 3, "calculated_power": 2.25 }
            ]
        }))
        .unwrap();

        assert_eq!(bid.components[0].count, 1);
        assert_eq!(bid.components[0].battery_life, 0.0);
        assert_eq!(bid.total_calculated_power(), 3.75);
    }

    #[test]
    fn test_cart_summary_count_aliases() {
        let raw: RawCartSummary =
            serde_json::from_value(json!({ "bid_id": 3, "count_items": 2 })).unwrap();
        assert_eq!(
            CartSummary::from(raw),
            CartSummary {
                bid_id: Some(3),
                items_count: 2
            }
        );
    }

    #[test]
    fn test_update_request_omits_unchanged_login() {
        let body = serde_json::to_value(UpdateUserRequest {
            login: None,
            password: "old".to_string(),
            old_password: "old".to_string(),
        })
        .unwrap();
        assert_eq!(body, json!({ "password": "old", "old_password": "old" }));
    }
}
