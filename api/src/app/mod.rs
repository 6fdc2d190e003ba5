//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, schemas and ports.

pub mod auth_service;
pub mod housekeeping;
pub mod password;
pub mod resource_service;
pub mod tokens;

pub use auth_service::{AuthService, CreateUser, Session, TokenPair};
pub use housekeeping::{HousekeepingService, HousekeepingSettings};
pub use resource_service::{FormData, ListPage, ListParams, Payload, ResourceService};
pub use tokens::TokenKeys;
