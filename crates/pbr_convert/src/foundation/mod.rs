//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Stable arena keys and ordered collections
//! - Logging utilities

pub mod collections;
pub mod logging;
