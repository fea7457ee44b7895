//! Document domain entities.

pub mod model;
pub mod request;
pub mod snapshot;
pub mod stats;

pub use model::{DEFAULT_CATEGORY, DocumentRecord};
pub use request::StoreRequest;
pub use snapshot::VersionSnapshot;
pub use stats::StorageStats;
