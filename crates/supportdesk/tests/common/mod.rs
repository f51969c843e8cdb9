//! Shared test utilities for supportdesk integration tests.
//!
//! This module provides:
//! - `TestHarness` with a temp-dir database and desk constructors
//! - `FakeMailSource` and `StubGenerationApi` standing in for the network
//! - Builders for raw and parsed messages

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
