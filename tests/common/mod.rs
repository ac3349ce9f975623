//! Shared test utilities for Lumen
//!
//! - Store wrappers that count writes
//! - Scene and panorama fixtures

pub mod fixtures;
