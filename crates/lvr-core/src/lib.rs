//! lvr-core library.
//!
//! Canonical projection records, the tolerant input normalizer that produces
//! them, and the SQLite-backed store (projection records, analytics events,
//! projection runs) that persists them.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at module seams, `anyhow::Result`
//!   for setup paths (config loading, opening the database).
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).
//!   The normalizer is pure and never logs.

pub mod config;
pub mod db;
pub mod error;
pub mod market;
pub mod model;
pub mod normalize;
pub mod slug;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::ErrorCode;
pub use model::record::ProjectionRecord;
pub use normalize::{NormalizedSubmission, ValidationErrors, normalize};
pub use store::{PutOutcome, Store, StoreError, StoredProjection};
