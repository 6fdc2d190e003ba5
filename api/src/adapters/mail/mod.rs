//! Mail adapters

pub mod outbox;

pub use outbox::OutboxMailer;
