//! `mosaic-core`: domain foundation shared by every bounded context.
//!
//! Pure domain primitives only (no bus, no IO).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ensure_id, new_id, slugify};
