//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Why manual mocks instead of mockall?
//! - mockall has lifetime issues with traits containing `&str` parameters
//! - Manual mocks are more explicit and easier to debug
//! - We control exactly what they return without macro magic
//!
//! Services take their ports as `Arc<dyn Trait>`, so the same mocks also back
//! the router-level tests in `integration_tests`.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
