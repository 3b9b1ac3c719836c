//! Domain models for KEYGATE.
//!
//! These are the core types shared across all crates.

pub mod delegation;
pub mod principal;
