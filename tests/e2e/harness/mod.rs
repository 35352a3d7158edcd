//! E2E test harness for the node store.
//!
//! Scenarios are built with a fluent DSL, executed step by step against a
//! filesystem store in a temp directory, then checked with declarative
//! assertions.

#![allow(dead_code)]

pub mod scenario;
pub mod steps;

// Re-export commonly used types
pub use assertions::Assertion;
pub use scenario::Scenario;
pub use workspace::TestStore;
