//! Institution tree normalizer.
//!
//! Converts raw institution records into flat, map-ready `Location`
//! records with derived device counts and health status. Institutions
//! without both coordinates are excluded entirely.

use crate::models::{DeviceCounts, HealthStatus, Institution, Location, PhoneBank};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Status computation policy.
///
/// Two policies were in production use; which one applies is an
/// explicit configuration decision (`[dashboard] status_policy`), they
/// are never merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// Status from the institution's own phone banks only. No banks or
    /// none active means `Offline`; some active means `Issue`; all
    /// active means `Healthy`.
    #[default]
    Simple,
    /// Status from own plus direct children's phone banks. Any bank
    /// reporting something other than "offline" yields `Issue`; this
    /// policy never reports `Healthy`.
    Recursive,
}

/// Build the location list from an institution tree.
///
/// An institution appears in the output iff both `latitude` and
/// `longitude` are present. `devices` always reflects the
/// institution's own phone banks regardless of policy.
pub fn normalize(institutions: &[Institution], policy: StatusPolicy) -> Vec<Location> {
    institutions
        .iter()
        .filter_map(|inst| {
            let (lat, lng) = match (inst.latitude, inst.longitude) {
                (Some(lat), Some(lng)) => (lat, lng),
                _ => {
                    debug!("skipping institution {} ({}): missing coordinates", inst.id, inst.name);
                    return None;
                }
            };

            let status = compute_status(inst, policy);
            let devices = DeviceCounts {
                active: own_active_count(&inst.phone_banks),
                total: inst.phone_banks.len(),
            };

            Some(Location {
                id: inst.id,
                name: inst.name.clone(),
                lat,
                lng,
                count: marker_bank_count(inst, policy),
                address: inst
                    .address
                    .clone()
                    .unwrap_or_else(|| "No address".to_string()),
                kind: inst.kind.clone(),
                children: inst.children.clone(),
                children_count: inst.children.len(),
                status,
                status_label: status_label(status, devices),
                subtext: subtext(status, devices),
                devices,
                phone_banks: inst.phone_banks.clone(),
            })
        })
        .collect()
}

/// A bank is healthy-active unless it reports "offline" or "issue".
/// Absent status counts as healthy.
fn bank_is_healthy(bank: &PhoneBank) -> bool {
    match bank.status.as_deref() {
        Some(s) => {
            let s = s.to_lowercase();
            s != "offline" && s != "issue"
        }
        None => true,
    }
}

/// A bank counts as reachable when it reports a status other than
/// "offline". Banks without a status are not counted here.
fn bank_is_reachable(bank: &PhoneBank) -> bool {
    bank.status
        .as_deref()
        .map(|s| !s.eq_ignore_ascii_case("offline"))
        .unwrap_or(false)
}

fn own_active_count(banks: &[PhoneBank]) -> usize {
    banks.iter().filter(|b| bank_is_healthy(b)).count()
}

fn compute_status(inst: &Institution, policy: StatusPolicy) -> HealthStatus {
    match policy {
        StatusPolicy::Simple => {
            let total = inst.phone_banks.len();
            let active = own_active_count(&inst.phone_banks);
            if total == 0 || active == 0 {
                HealthStatus::Offline
            } else if active < total {
                HealthStatus::Issue
            } else {
                HealthStatus::Healthy
            }
        }
        StatusPolicy::Recursive => {
            let own_reachable = inst.phone_banks.iter().any(bank_is_reachable);
            let child_reachable = inst
                .children
                .iter()
                .any(|child| child.phone_banks.iter().any(bank_is_reachable));
            if own_reachable || child_reachable {
                HealthStatus::Issue
            } else {
                HealthStatus::Offline
            }
        }
    }
}

/// The bank count shown on the map marker: directly attached banks
/// under the simple policy, reachable banks across self and direct
/// children under the recursive one.
fn marker_bank_count(inst: &Institution, policy: StatusPolicy) -> usize {
    match policy {
        StatusPolicy::Simple => inst.phone_banks.len(),
        StatusPolicy::Recursive => {
            let own = inst.phone_banks.iter().filter(|b| bank_is_reachable(b)).count();
            let children: usize = inst
                .children
                .iter()
                .map(|c| c.phone_banks.iter().filter(|b| bank_is_reachable(b)).count())
                .sum();
            own + children
        }
    }
}

/// Plural suffix only above one; `n == 1` and `n == 0` both render
/// singular.
fn plural(n: usize) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

fn status_label(status: HealthStatus, devices: DeviceCounts) -> String {
    match status {
        HealthStatus::Offline => "Offline".to_string(),
        HealthStatus::Healthy => "Healthy".to_string(),
        HealthStatus::Issue => {
            let n = devices.total - devices.active;
            format!("{} Issue{}", n, plural(n))
        }
    }
}

fn subtext(status: HealthStatus, devices: DeviceCounts) -> String {
    match status {
        HealthStatus::Offline => "Offline".to_string(),
        HealthStatus::Healthy => "All Devices Running Properly".to_string(),
        HealthStatus::Issue => {
            let n = devices.total - devices.active;
            format!("{} device{} with issues", n, plural(n))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(ip: &str, status: Option<&str>) -> PhoneBank {
        PhoneBank {
            id: 0,
            ip: ip.to_string(),
            status: status.map(String::from),
        }
    }

    fn institution(name: &str, coords: Option<(f64, f64)>, banks: Vec<PhoneBank>) -> Institution {
        Institution {
            id: 1,
            name: name.to_string(),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            phone_banks: banks,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_coordinates_excluded() {
        let insts = vec![
            institution("Alpha", Some((1.0, 1.0)), vec![]),
            Institution {
                id: 2,
                name: "Beta".to_string(),
                latitude: None,
                longitude: Some(2.0),
                ..Default::default()
            },
            Institution {
                id: 3,
                name: "Gamma".to_string(),
                latitude: Some(3.0),
                longitude: None,
                ..Default::default()
            },
        ];

        let locations = normalize(&insts, StatusPolicy::Simple);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].name, "Alpha");
    }

    #[test]
    fn test_simple_policy_all_states() {
        // No banks at all
        let none = institution("A", Some((1.0, 1.0)), vec![]);
        // All offline
        let offline = institution(
            "B",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("offline"))],
        );
        // Mixed
        let mixed = institution(
            "C",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("offline")), bank("10.0.0.2", Some("online"))],
        );
        // All healthy
        let healthy = institution(
            "D",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("online")), bank("10.0.0.2", None)],
        );

        let locations = normalize(&[none, offline, mixed, healthy], StatusPolicy::Simple);
        assert_eq!(locations[0].status, HealthStatus::Offline);
        assert_eq!(locations[1].status, HealthStatus::Offline);
        assert_eq!(locations[2].status, HealthStatus::Issue);
        assert_eq!(locations[3].status, HealthStatus::Healthy);
        assert_eq!(locations[3].subtext, "All Devices Running Properly");
    }

    #[test]
    fn test_simple_policy_alpha_scenario() {
        let insts = vec![institution(
            "Alpha",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("offline")), bank("10.0.0.2", Some("online"))],
        )];

        let locations = normalize(&insts, StatusPolicy::Simple);
        assert_eq!(locations.len(), 1);
        let loc = &locations[0];
        assert_eq!(loc.status, HealthStatus::Issue);
        assert_eq!(loc.status_label, "1 Issue");
        assert_eq!(loc.subtext, "1 device with issues");
        assert_eq!(loc.devices, DeviceCounts { active: 1, total: 2 });
    }

    #[test]
    fn test_simple_count_is_directly_attached_total() {
        // The marker count under the simple policy is the number of
        // attached banks, not the active subset.
        let insts = vec![institution(
            "A",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("offline")), bank("10.0.0.2", Some("online"))],
        )];

        let locations = normalize(&insts, StatusPolicy::Simple);
        assert_eq!(locations[0].count, 2);
        assert_eq!(locations[0].count, locations[0].devices.total);
    }

    #[test]
    fn test_issue_label_pluralization() {
        let insts = vec![institution(
            "A",
            Some((1.0, 1.0)),
            vec![
                bank("10.0.0.1", Some("issue")),
                bank("10.0.0.2", Some("issue")),
                bank("10.0.0.3", Some("online")),
            ],
        )];

        let locations = normalize(&insts, StatusPolicy::Simple);
        assert_eq!(locations[0].status_label, "2 Issues");
        assert_eq!(locations[0].subtext, "2 devices with issues");
    }

    #[test]
    fn test_issue_status_is_case_insensitive() {
        let insts = vec![institution(
            "A",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("OFFLINE")), bank("10.0.0.2", Some("Online"))],
        )];

        let locations = normalize(&insts, StatusPolicy::Simple);
        assert_eq!(locations[0].status, HealthStatus::Issue);
        assert_eq!(locations[0].devices.active, 1);
    }

    #[test]
    fn test_recursive_policy_never_healthy() {
        let mut parent = institution(
            "P",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("online"))],
        );
        parent.children = vec![institution("C", None, vec![bank("10.0.1.1", Some("online"))])];

        let locations = normalize(&[parent], StatusPolicy::Recursive);
        assert_eq!(locations[0].status, HealthStatus::Issue);
        // Own + child reachable banks
        assert_eq!(locations[0].count, 2);
    }

    #[test]
    fn test_recursive_policy_child_banks_lift_offline_parent() {
        let mut parent = institution(
            "P",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("offline"))],
        );
        parent.children = vec![institution("C", None, vec![bank("10.0.1.1", Some("issue"))])];

        let locations = normalize(&[parent.clone()], StatusPolicy::Recursive);
        assert_eq!(locations[0].status, HealthStatus::Issue);

        parent.children = vec![institution("C", None, vec![bank("10.0.1.1", Some("offline"))])];
        let locations = normalize(&[parent], StatusPolicy::Recursive);
        assert_eq!(locations[0].status, HealthStatus::Offline);
    }

    #[test]
    fn test_recursive_policy_statusless_bank_not_reachable() {
        // A bank without a status keeps the institution offline under
        // the recursive policy, unlike the simple one.
        let inst = institution("A", Some((1.0, 1.0)), vec![bank("10.0.0.1", None)]);

        let recursive = normalize(std::slice::from_ref(&inst), StatusPolicy::Recursive);
        assert_eq!(recursive[0].status, HealthStatus::Offline);

        let simple = normalize(&[inst], StatusPolicy::Simple);
        assert_eq!(simple[0].status, HealthStatus::Healthy);
    }

    #[test]
    fn test_devices_independent_of_policy() {
        let mut inst = institution(
            "A",
            Some((1.0, 1.0)),
            vec![bank("10.0.0.1", Some("offline")), bank("10.0.0.2", Some("online"))],
        );
        inst.children = vec![institution("C", None, vec![bank("10.0.1.1", Some("online"))])];

        for policy in [StatusPolicy::Simple, StatusPolicy::Recursive] {
            let locations = normalize(std::slice::from_ref(&inst), policy);
            assert_eq!(locations[0].devices, DeviceCounts { active: 1, total: 2 });
        }
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let insts = vec![
            institution("A", Some((1.0, 2.0)), vec![bank("10.0.0.1", Some("online"))]),
            institution("B", None, vec![]),
            institution("C", Some((3.0, 4.0)), vec![]),
        ];

        let first = normalize(&insts, StatusPolicy::Simple);
        let second = normalize(&insts, StatusPolicy::Simple);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_address_default_and_children_count() {
        let mut inst = institution("A", Some((1.0, 1.0)), vec![]);
        inst.children = vec![Institution::default(), Institution::default()];

        let locations = normalize(&[inst], StatusPolicy::Simple);
        assert_eq!(locations[0].address, "No address");
        assert_eq!(locations[0].children_count, 2);
    }
}
