//! Unified error types for Loquat.
//!
//! This module provides a single error type covering source access, encoding
//! fallback, and table structure failures.

// Submodule declarations
pub mod types;

// Re-exports
pub use types::{Error, ParseFault, Result};
