pub mod contract;
pub mod dashboard;
pub mod snapshot;
