//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod mailer;
pub mod repositories;
pub mod uploads;

pub use mailer::{Attachment, MailMessage, Mailer};
pub use repositories::{RecordRepository, UserRepository};
pub use uploads::{extension_for, UploadStore, UploadedFile, UPLOAD_PATH_PREFIX};
