//! Utility functions shared across the crate.

pub mod duration;

pub use duration::parse_duration;
