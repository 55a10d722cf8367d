//! Dashboard aggregation core.
//!
//! Pure, synchronous transformations from the raw institution tree to
//! map-ready locations: normalization with derived health status, and
//! hierarchical search filtering. The state container that owns their
//! inputs lives here too, but the functions themselves take explicit
//! arguments and are callable independently of it.

pub mod filter;
pub mod normalize;
pub mod state;

pub use filter::filter_locations;
pub use normalize::{normalize, StatusPolicy};
pub use state::DashboardStore;
