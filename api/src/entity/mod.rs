//! SeaORM entity models

pub mod records;
pub mod users;
