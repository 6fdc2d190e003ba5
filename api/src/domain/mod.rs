//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Domain models representing core business concepts
//! - `schema`: Declarative resource descriptions and field validation
//! - `ports`: Trait definitions for external dependencies

pub mod entities;
pub mod ports;
pub mod schema;
