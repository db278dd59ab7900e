//! Revenue-projection landing page service.
//!
//! The HTTP API lives in [`http`], outbound email and CRM calls in
//! [`notify`]. Storage and normalization come from `lvr-core`.

#![forbid(unsafe_code)]

pub mod http;
pub mod notify;
pub mod validate;

pub use http::{AppState, router, setup_and_serve};
