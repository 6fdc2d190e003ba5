//! Request authentication

pub mod bearer;

pub use bearer::{optional_auth, require_auth};
