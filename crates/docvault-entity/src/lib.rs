//! # docvault-entity
//!
//! Domain models for DocVault. Every struct here is either persisted in
//! the metadata index, written beside a version snapshot, or exchanged
//! with callers of the storage facade. All models derive `Debug`, `Clone`,
//! `Serialize`, and `Deserialize` and serialize in camelCase.

pub mod document;
