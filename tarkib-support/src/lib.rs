//! # Tarkib Support
//!
//! Shared utilities for the Tarkib DI crates.
//!
//! This crate provides:
//! - Text rendering for error messages and plan summaries
//! - "Did you mean?" suggestions for unregistered types

pub mod rendering;
