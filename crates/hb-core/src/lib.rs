//! houseboard/crates/hb-core/src/lib.rs
//!
//! The central domain types and interface definitions for Houseboard.

pub mod config;
pub mod error;
pub mod models;
pub mod traits;
pub mod validate;

// Re-exporting for easier access in other crates
pub use config::*;
pub use error::*;
pub use models::*;
pub use traits::*;
