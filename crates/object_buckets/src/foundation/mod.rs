//! Foundation module - Core utilities and types
//!
//! - Math types shared by bounds, transforms and push blocks
//! - Logging initialization

pub mod logging;
pub mod math;
