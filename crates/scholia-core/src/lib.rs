//! # scholia-core
//!
//! Core types, traits, and abstractions for scholia, the research-paper
//! insight extraction pipeline.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the inference and extraction crates depend on.

pub mod defaults;
pub mod embedding;
pub mod error;
pub mod logging;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use embedding::cosine_similarity;
pub use error::{Error, Result};
pub use models::*;
pub use tags::*;
pub use traits::*;
