//! Cache Layer y modo pickup.

mod layer;
mod mode;
pub mod pickup;

pub use layer::{CacheKey, CacheLayer, CacheLookup};
pub use mode::CacheMode;
pub use pickup::{plan_pickup, PickupNode, PickupPlan};
