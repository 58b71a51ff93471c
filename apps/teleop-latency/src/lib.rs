//! # Teleop Latency Library
//!
//! This library exposes the command implementations for testing and
//! integration.
//!
//! The binary uses these modules through the `main.rs` entry point.

pub mod cli;

// Re-export the engine for convenience
pub use teleop_latency_core;
