//! HTTP request handlers
//!
//! Each submodule contains the handler for one endpoint.

pub mod categorize;
pub mod health;
pub mod insights;

// Re-export all handlers for use in router
pub use categorize::*;
pub use health::*;
pub use insights::*;
