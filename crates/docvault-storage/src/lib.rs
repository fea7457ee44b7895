//! # docvault-storage
//!
//! Concurrent, crash-safe document storage engine. Content lives as plain
//! files under a base directory; metadata is cached in memory and mirrored
//! to a JSON index; prior versions are archived before every destructive
//! change.

pub mod archive;
pub mod atomic;
pub mod hash;
pub mod index;
pub mod lock;
pub mod query;
pub mod store;

pub use archive::{KeepAll, KeepLatest, RetentionPolicy, VersionArchive};
pub use index::{IndexBackend, JsonIndexBackend, MetadataIndex};
pub use lock::{LockGuard, LockKind, LockTable};
pub use query::{DateRange, ListOptions, SortKey};
pub use store::{DocumentStore, StoredDocument};
