//! ragd-core - Core types and traits for the ragd tool server
//!
//! This crate provides the foundational types, capability traits, error
//! handling, and configuration used throughout the ragd workspace.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{RagError, Result};
pub use traits::*;
pub use types::*;
