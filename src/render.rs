//! Terminal output rendering.
//!
//! Pure string-building functions that turn dashboard data and
//! pass-through API responses into table or JSON output.

use crate::cli::OutputFormat;
use crate::models::{DashboardSummary, Location};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Render the dashboard summary and location list.
pub fn render_dashboard(
    summary: &DashboardSummary,
    locations: &[Location],
    fetched_at: DateTime<Utc>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "fetched_at": fetched_at,
                "summary": summary,
                "locations": locations,
            });
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut output = String::new();

            output.push_str(&format!(
                "Fleet Dashboard ({})\n\n",
                fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            output.push_str(&render_summary(summary));
            output.push_str(&render_locations(locations));

            output
        }
    }
}

fn render_summary(summary: &DashboardSummary) -> String {
    let mut section = String::new();

    section.push_str("Summary:\n");
    section.push_str(&format!("  Phone banks: {}\n", summary.phone_bank_total));
    section.push_str(&format!(
        "  🟢 Healthy: {} | 🟡 Issues: {} | ⚫ Offline: {}\n\n",
        summary.healthy_total, summary.issue_total, summary.offline_total
    ));

    section
}

fn render_locations(locations: &[Location]) -> String {
    let mut section = String::new();

    if locations.is_empty() {
        section.push_str("No locations to show.\n");
        return section;
    }

    section.push_str(&format!("Locations ({}):\n", locations.len()));
    for loc in locations {
        section.push_str(&format!(
            "  {} {} - {} ({})\n",
            loc.status.emoji(),
            loc.name,
            loc.status,
            loc.status_label
        ));
        section.push_str(&format!(
            "     {} | devices {}/{} active | {} children | {}\n",
            loc.subtext, loc.devices.active, loc.devices.total, loc.children_count, loc.address
        ));
    }

    section
}

/// Render a pass-through API response. Always pretty JSON; the backend
/// shapes these bodies, not us.
pub fn render_value(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::normalize::{normalize, StatusPolicy};
    use crate::models::{Institution, PhoneBank};

    fn sample_locations() -> Vec<Location> {
        let inst = Institution {
            id: 1,
            name: "Northern Office".to_string(),
            latitude: Some(1.0),
            longitude: Some(2.0),
            address: Some("12 Main St".to_string()),
            phone_banks: vec![
                PhoneBank {
                    id: 1,
                    ip: "10.0.0.1".to_string(),
                    status: Some("offline".to_string()),
                },
                PhoneBank {
                    id: 2,
                    ip: "10.0.0.2".to_string(),
                    status: Some("online".to_string()),
                },
            ],
            ..Default::default()
        };
        normalize(&[inst], StatusPolicy::Simple)
    }

    fn sample_summary() -> DashboardSummary {
        DashboardSummary {
            phone_bank_total: 2,
            healthy_total: 1,
            issue_total: 1,
            offline_total: 0,
        }
    }

    #[test]
    fn test_table_output_contains_sections() {
        let output = render_dashboard(
            &sample_summary(),
            &sample_locations(),
            Utc::now(),
            OutputFormat::Table,
        );

        assert!(output.contains("Fleet Dashboard"));
        assert!(output.contains("Phone banks: 2"));
        assert!(output.contains("Northern Office - Issue (1 Issue)"));
        assert!(output.contains("devices 1/2 active"));
        assert!(output.contains("12 Main St"));
    }

    #[test]
    fn test_table_output_empty_locations() {
        let output = render_dashboard(&sample_summary(), &[], Utc::now(), OutputFormat::Table);
        assert!(output.contains("No locations to show."));
    }

    #[test]
    fn test_json_output_parses_back() {
        let output = render_dashboard(
            &sample_summary(),
            &sample_locations(),
            Utc::now(),
            OutputFormat::Json,
        );

        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["phone_bank_total"], 2);
        assert_eq!(value["locations"][0]["name"], "Northern Office");
        assert_eq!(value["locations"][0]["status"], "Issue");
    }

    #[test]
    fn test_render_value_pretty() {
        let value = serde_json::json!({"id": 1, "ip": "10.0.0.1"});
        let output = render_value(&value);
        assert!(output.contains("\"ip\": \"10.0.0.1\""));
    }
}
