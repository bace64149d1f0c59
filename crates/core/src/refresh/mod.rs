mod coordinator;
pub mod policy;
pub mod setup;

pub use coordinator::{RefreshReport, SnapshotCoordinator, SNAPSHOT_CACHE_KEY};
pub use policy::RefreshPolicy;

#[cfg(test)]
mod tests;
