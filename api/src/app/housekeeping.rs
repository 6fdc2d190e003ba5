//! Periodic housekeeping
//!
//! Runs on a fixed interval: makes sure the console can always be reached by
//! an admin, and mails the server log to the operator.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use tokio::task::JoinHandle;

use super::auth_service::{normalize_email, validate_name};
use super::password::hash_password;
use crate::config::Config;
use crate::domain::entities::{NewUser, Role};
use crate::domain::ports::{Attachment, MailMessage, Mailer, UserRepository};
use crate::error::DomainError;

const GENERATED_PASSWORD_LEN: usize = 20;

/// Settings for the housekeeping job
#[derive(Debug, Clone)]
pub struct HousekeepingSettings {
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: Option<String>,
    pub bcrypt_cost: u32,
    pub log_file: PathBuf,
    pub mail_from: String,
    pub log_recipient: Option<String>,
}

impl HousekeepingSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_email: normalize_email(&config.default_admin_email),
            admin_name: config.default_admin_name.clone(),
            admin_password: config.default_admin_password.clone(),
            bcrypt_cost: config.bcrypt_cost,
            log_file: config.log_file(),
            mail_from: config.mail_from.clone(),
            log_recipient: config.log_recipient.clone(),
        }
    }
}

pub struct HousekeepingService {
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    settings: HousekeepingSettings,
}

impl HousekeepingService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn Mailer>,
        settings: HousekeepingSettings,
    ) -> Self {
        Self {
            users,
            mailer,
            settings,
        }
    }

    /// Run every step once. A failing step does not stop the others.
    pub async fn run_once(&self) {
        if let Err(e) = self.ensure_default_admin().await {
            tracing::error!(error = %e, "Default admin check failed");
        }
        if let Err(e) = self.ship_logs().await {
            tracing::error!(error = %e, "Log shipping failed");
        }
    }

    /// Start the job on a background task. The first run happens immediately.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracing::debug!("Running housekeeping");
                self.run_once().await;
            }
        })
    }

    /// Create the default admin when nobody can administer the site.
    ///
    /// Returns true if an account was created.
    pub async fn ensure_default_admin(&self) -> Result<bool, DomainError> {
        if self.users.count_active_by_role(Role::Admin).await? > 0 {
            return Ok(false);
        }

        let email = &self.settings.admin_email;
        if self.users.find_by_email(email).await?.is_some() {
            tracing::warn!(
                email = %email,
                "No active admin, and the default admin account exists but is disabled or demoted"
            );
            return Ok(false);
        }

        let password = match &self.settings.admin_password {
            Some(password) => password.clone(),
            None => {
                let generated = generate_password();
                tracing::warn!(
                    email = %email,
                    password = %generated,
                    "Generated a password for the default admin; change it after signing in"
                );
                generated
            }
        };

        let name = validate_name(&self.settings.admin_name)?;
        let password_hash = hash_password(&password, self.settings.bcrypt_cost).await?;
        let user = self
            .users
            .create(&NewUser {
                name,
                email: email.clone(),
                password_hash,
                role: Role::Admin,
            })
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "Default admin created");
        Ok(true)
    }

    /// Mail the server log and truncate it once delivered.
    ///
    /// Returns true if a log was shipped.
    pub async fn ship_logs(&self) -> Result<bool, DomainError> {
        let Some(recipient) = &self.settings.log_recipient else {
            return Ok(false);
        };

        let path = &self.settings.log_file;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(DomainError::Internal(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        if bytes.is_empty() {
            return Ok(false);
        }

        let now = Utc::now();
        let size = bytes.len();
        let message = MailMessage {
            from: self.settings.mail_from.clone(),
            to: recipient.clone(),
            subject: format!("Server log {}", now.format("%Y-%m-%d %H:%M UTC")),
            body: format!(
                "Server log collected at {} ({} bytes) is attached.\n",
                now.to_rfc3339(),
                size
            ),
            attachment: Some(Attachment {
                filename: format!("server-{}.log", now.format("%Y%m%d%H%M%S")),
                content_type: "text/plain".to_string(),
                bytes,
            }),
        };

        self.mailer
            .send(&message)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to send log: {}", e)))?;

        tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|e| {
                DomainError::Internal(format!("Failed to truncate {}: {}", path.display(), e))
            })?;

        tracing::info!(recipient = %recipient, bytes = size, "Server log shipped");
        Ok(true)
    }
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::password::verify_password;
    use crate::domain::entities::UserChanges;
    use crate::test_utils::{test_admin, FailingMailer, InMemoryUserRepository, RecordingMailer};
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> HousekeepingSettings {
        HousekeepingSettings {
            admin_email: "admin@school.test".to_string(),
            admin_name: "Administrator".to_string(),
            admin_password: Some("initial-password".to_string()),
            bcrypt_cost: 4,
            log_file: dir.path().join("server.log"),
            mail_from: "server@school.test".to_string(),
            log_recipient: Some("ops@school.test".to_string()),
        }
    }

    #[tokio::test]
    async fn creates_default_admin_when_none_exists() {
        let dir = TempDir::new().unwrap();
        let users = Arc::new(InMemoryUserRepository::new());
        let job = HousekeepingService::new(
            users.clone(),
            Arc::new(RecordingMailer::new()),
            settings(&dir),
        );

        assert!(job.ensure_default_admin().await.unwrap());
        let admin = users
            .find_by_email("admin@school.test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(verify_password("initial-password", &admin.password_hash)
            .await
            .unwrap());

        // Second run is a no-op
        assert!(!job.ensure_default_admin().await.unwrap());
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn existing_admin_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let users = Arc::new(InMemoryUserRepository::new().with_user(test_admin()));
        let job = HousekeepingService::new(
            users.clone(),
            Arc::new(RecordingMailer::new()),
            settings(&dir),
        );

        assert!(!job.ensure_default_admin().await.unwrap());
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disabled_default_admin_is_not_recreated() {
        let dir = TempDir::new().unwrap();
        let mut admin = test_admin();
        admin.email = "admin@school.test".to_string();
        let users = Arc::new(InMemoryUserRepository::new().with_user(admin.clone()));
        users
            .update(
                &admin.id,
                &UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let job = HousekeepingService::new(
            users.clone(),
            Arc::new(RecordingMailer::new()),
            settings(&dir),
        );
        assert!(!job.ensure_default_admin().await.unwrap());
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overlong_admin_name_is_rejected_before_insert() {
        let dir = TempDir::new().unwrap();
        let users = Arc::new(InMemoryUserRepository::new());
        let mut settings = settings(&dir);
        settings.admin_name = "a".repeat(crate::domain::entities::User::NAME_MAX + 1);
        let job =
            HousekeepingService::new(users.clone(), Arc::new(RecordingMailer::new()), settings);

        assert!(matches!(
            job.ensure_default_admin().await,
            Err(DomainError::Validation(_))
        ));
        assert!(users.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generates_password_when_unset() {
        let dir = TempDir::new().unwrap();
        let users = Arc::new(InMemoryUserRepository::new());
        let mut settings = settings(&dir);
        settings.admin_password = None;
        let job =
            HousekeepingService::new(users.clone(), Arc::new(RecordingMailer::new()), settings);

        assert!(job.ensure_default_admin().await.unwrap());
        let admin = users
            .find_by_email("admin@school.test")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.password_hash.starts_with("$2"));
    }

    #[test]
    fn generated_passwords_differ() {
        let a = generate_password();
        assert_eq!(a.len(), GENERATED_PASSWORD_LEN);
        assert_ne!(a, generate_password());
    }

    #[tokio::test]
    async fn ships_and_truncates_log() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        std::fs::write(&settings.log_file, "line one\nline two\n").unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let job = HousekeepingService::new(
            Arc::new(InMemoryUserRepository::new()),
            mailer.clone(),
            settings.clone(),
        );

        assert!(job.ship_logs().await.unwrap());

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@school.test");
        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.bytes, b"line one\nline two\n");
        assert_eq!(std::fs::metadata(&settings.log_file).unwrap().len(), 0);

        // Nothing left to send
        assert!(!job.ship_logs().await.unwrap());
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_keeps_log() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        std::fs::write(&settings.log_file, "keep me\n").unwrap();

        let job = HousekeepingService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(FailingMailer),
            settings.clone(),
        );

        assert!(job.ship_logs().await.is_err());
        assert_eq!(
            std::fs::read_to_string(&settings.log_file).unwrap(),
            "keep me\n"
        );
    }

    #[tokio::test]
    async fn shipping_is_skipped_without_recipient_or_log() {
        let dir = TempDir::new().unwrap();
        let mailer = Arc::new(RecordingMailer::new());

        // No log file yet
        let job = HousekeepingService::new(
            Arc::new(InMemoryUserRepository::new()),
            mailer.clone(),
            settings(&dir),
        );
        assert!(!job.ship_logs().await.unwrap());

        let mut no_recipient = settings(&dir);
        no_recipient.log_recipient = None;
        std::fs::write(&no_recipient.log_file, "data\n").unwrap();
        let job = HousekeepingService::new(
            Arc::new(InMemoryUserRepository::new()),
            mailer.clone(),
            no_recipient,
        );
        assert!(!job.ship_logs().await.unwrap());
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn run_once_continues_after_mail_failure() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        std::fs::write(&settings.log_file, "data\n").unwrap();
        let users = Arc::new(InMemoryUserRepository::new());

        let job = HousekeepingService::new(users.clone(), Arc::new(FailingMailer), settings);
        job.run_once().await;

        assert_eq!(users.count_active_by_role(Role::Admin).await.unwrap(), 1);
    }
}
