//! Explicit dashboard state container.
//!
//! An ordinary struct owned by the presentation layer: derived lists
//! are recomputed on demand by the pure normalizer/filter functions,
//! and a synchronous subscription mechanism notifies listeners of
//! state changes.

use crate::dashboard::{filter_locations, normalize, StatusPolicy};
use crate::models::{DashboardData, DashboardSummary, Institution, Location};

/// Handle returned by [`DashboardStore::subscribe`].
pub type SubscriptionId = usize;

/// Snapshot of everything the dashboard presentation needs.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub summary: DashboardSummary,
    pub institutions: Vec<Institution>,
    pub search_query: String,
    pub loading: bool,
    pub error: Option<String>,
}

/// Owner of the dashboard state.
///
/// The institution tree is replaced wholesale on every fetch; derived
/// location lists are re-derivations, not cached mutable state. Single
/// threaded, no locking: every mutation notifies subscribers
/// synchronously before returning.
pub struct DashboardStore {
    state: DashboardState,
    policy: StatusPolicy,
    subscribers: Vec<(SubscriptionId, Box<dyn FnMut(&DashboardState)>)>,
    next_subscription: SubscriptionId,
}

impl DashboardStore {
    pub fn new(policy: StatusPolicy) -> Self {
        Self {
            state: DashboardState::default(),
            policy,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    #[allow(dead_code)] // Utility accessor
    pub fn status_policy(&self) -> StatusPolicy {
        self.policy
    }

    /// Register a callback invoked after every state change.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&DashboardState) + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    #[allow(dead_code)] // Subscription teardown, exercised in tests
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
        self.notify();
    }

    /// Mark a fetch as in flight. A concurrent second fetch is not
    /// guarded against; whichever `apply_fetch` runs last wins.
    pub fn begin_fetch(&mut self) {
        self.state.loading = true;
        self.notify();
    }

    /// Apply a fetch result. Success replaces summary and institutions
    /// wholesale and clears the error; failure records the error text
    /// and leaves previously fetched data in place.
    pub fn apply_fetch(&mut self, result: Result<DashboardData, String>) {
        match result {
            Ok(data) => {
                self.state.summary = data.summary;
                self.state.institutions = data.institutions;
                self.state.error = None;
            }
            Err(message) => {
                self.state.error = Some(message);
            }
        }
        self.state.loading = false;
        self.notify();
    }

    /// All map locations derived from the current institution tree.
    pub fn locations(&self) -> Vec<Location> {
        normalize(&self.state.institutions, self.policy)
    }

    /// Locations filtered by the current search query.
    pub fn filtered_locations(&self) -> Vec<Location> {
        filter_locations(&self.locations(), &self.state.search_query)
    }

    // Summary accessors for presentation code that does not want the
    // whole snapshot.

    #[allow(dead_code)]
    pub fn total_servers(&self) -> u64 {
        self.state.summary.phone_bank_total
    }

    #[allow(dead_code)]
    pub fn healthy_servers(&self) -> u64 {
        self.state.summary.healthy_total
    }

    #[allow(dead_code)]
    pub fn issue_servers(&self) -> u64 {
        self.state.summary.issue_total
    }

    #[allow(dead_code)]
    pub fn offline_servers(&self) -> u64 {
        self.state.summary.offline_total
    }

    fn notify(&mut self) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&self.state);
        }
    }
}
