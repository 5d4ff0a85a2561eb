//! Test infrastructure for the repository layer.
//!
//! Provides an in-memory [`MockEngine`] implementing `EngineClient` and a
//! small order domain used across the integration tests.

#![allow(dead_code)]

pub mod engine;
pub mod fixtures;

pub use engine::*;
pub use fixtures::*;
