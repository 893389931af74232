//! Shared foundational types used across the Anvil build core.
//!
//! This crate provides content hashing for change detection and lexical path
//! normalization for stable source identities.

#![warn(missing_docs)]

pub mod hash;
pub mod path;

pub use hash::ContentHash;
pub use path::normalize_path;
