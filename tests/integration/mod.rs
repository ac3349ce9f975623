//! Integration tests for Lumen
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod debounce;
pub mod export_pipeline;
pub mod history_persistence;
