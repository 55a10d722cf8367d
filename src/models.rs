//! Data models for the fleet monitoring client.
//!
//! This module contains the wire types returned by the backend API
//! (institutions, phone banks, dashboard envelopes) and the derived
//! map-ready `Location` record produced by the normalizer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Aggregate health state of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// All devices running properly.
    Healthy,
    /// Some devices reporting problems.
    Issue,
    /// No reachable devices at all.
    Offline,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Issue => write!(f, "Issue"),
            HealthStatus::Offline => write!(f, "Offline"),
        }
    }
}

impl HealthStatus {
    /// Returns the map-marker emoji for the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "🟢",
            HealthStatus::Issue => "🟡",
            HealthStatus::Offline => "⚫",
        }
    }
}

/// A monitored device group with a liveness status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhoneBank {
    /// Backend identifier.
    #[serde(default)]
    pub id: u64,
    /// IP address, also used as a search key.
    #[serde(default)]
    pub ip: String,
    /// Reported status: "offline", "issue", anything else (or absent)
    /// counts as healthy.
    #[serde(default)]
    pub status: Option<String>,
}

/// A node in the fleet hierarchy (e.g. a regional office).
///
/// `children` and `phone_banks` may be absent or null on the wire and
/// decode as empty collections. Coordinates may arrive as numbers,
/// numeric strings, empty strings, or null; anything non-numeric
/// decodes as `None` and excludes the institution from the map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Institution {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "de_coordinate")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    /// Category label ("type" on the wire).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "de_null_vec")]
    pub children: Vec<Institution>,
    #[serde(default, deserialize_with = "de_null_vec")]
    pub phone_banks: Vec<PhoneBank>,
}

/// Active/total device counts for a location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCounts {
    pub active: usize,
    pub total: usize,
}

/// Map-ready record derived from an institution with valid coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Marker bank count: directly attached banks under the simple
    /// policy, reachable banks across self and children under the
    /// recursive one.
    pub count: usize,
    pub address: String,
    pub kind: Option<String>,
    /// Raw child institutions, retained for display.
    pub children: Vec<Institution>,
    pub children_count: usize,
    pub status: HealthStatus,
    pub status_label: String,
    pub subtext: String,
    pub devices: DeviceCounts,
    pub phone_banks: Vec<PhoneBank>,
}

/// Fleet-wide totals reported by the `/dashboard` endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub phone_bank_total: u64,
    #[serde(default)]
    pub healthy_total: u64,
    #[serde(default)]
    pub issue_total: u64,
    #[serde(default)]
    pub offline_total: u64,
}

/// Payload of a successful `/dashboard` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub summary: DashboardSummary,
    #[serde(default)]
    pub institutions: Vec<Institution>,
}

/// Envelope of the `/dashboard` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<DashboardData>,
}

/// Response of the `/auth/token` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Decode a coordinate that may be a number, a numeric string, an empty
/// string, or null. Empty and malformed values become `None`.
fn de_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    })
}

/// Decode a sequence that may be absent or explicitly null as empty.
fn de_null_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
