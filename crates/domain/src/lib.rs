//! Shared types for the Lovent client: the error type, the configuration
//! model and the structured trace events every crate emits.

pub mod config;
pub mod error;
pub mod trace;
