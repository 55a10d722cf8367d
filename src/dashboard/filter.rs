//! Hierarchical search filter over normalized locations.
//!
//! Filters a location list by a query while preserving the
//! parent-match-wins visibility rule: a matching parent with no
//! matching children keeps all of its children; once any child
//! matches, only matching children are kept.

use crate::models::{Institution, Location, PhoneBank};

/// Filter locations by a search query.
///
/// The query is lower-cased and trimmed; an empty query returns the
/// input unchanged. A location matches when its name or any attached
/// phone-bank IP contains the query (case-insensitive substring), and
/// children are matched by the same predicate. Output order follows
/// input order, and the input is never mutated.
pub fn filter_locations(locations: &[Location], query: &str) -> Vec<Location> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return locations.to_vec();
    }

    locations
        .iter()
        .filter_map(|loc| {
            let filtered_children: Vec<Institution> = loc
                .children
                .iter()
                .filter(|child| child_matches(child, &query))
                .cloned()
                .collect();

            let parent_matches =
                name_matches(&loc.name, &query) || any_bank_matches(&loc.phone_banks, &query);

            if !parent_matches && filtered_children.is_empty() {
                return None;
            }

            // A parent match only overrides the child filter when the
            // filter found nothing; matching children take precedence.
            let children = if parent_matches && filtered_children.is_empty() {
                loc.children.clone()
            } else {
                filtered_children
            };

            let children_count = children.len();
            Some(Location {
                children,
                children_count,
                ..loc.clone()
            })
        })
        .collect()
}

fn name_matches(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(query)
}

fn any_bank_matches(banks: &[PhoneBank], query: &str) -> bool {
    banks.iter().any(|b| b.ip.to_lowercase().contains(query))
}

fn child_matches(child: &Institution, query: &str) -> bool {
    name_matches(&child.name, query) || any_bank_matches(&child.phone_banks, query)
}
