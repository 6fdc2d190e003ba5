//! Outbox mailer
//!
//! Writes each message as an `.eml` file into a spool directory. Delivery is
//! left to whatever MTA watches the directory. Files appear atomically: they
//! are written under a temporary name and renamed when complete.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use uuid::Uuid;

use crate::domain::ports::{MailMessage, Mailer};
use crate::error::MailError;

const LINE_WIDTH: usize = 76;

pub struct OutboxMailer {
    dir: PathBuf,
}

impl OutboxMailer {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, MailError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }
}

fn check_header(name: &str, value: &str) -> Result<(), MailError> {
    if value.is_empty() || value.contains(['\r', '\n']) {
        return Err(MailError::InvalidMessage(format!(
            "{} header is empty or spans lines",
            name
        )));
    }
    Ok(())
}

/// Render a message in RFC 5322 form with CRLF line endings
fn render(message: &MailMessage, id: &Uuid) -> Result<String, MailError> {
    check_header("From", &message.from)?;
    check_header("To", &message.to)?;
    check_header("Subject", &message.subject)?;

    let domain = message
        .from
        .rsplit_once('@')
        .map(|(_, d)| d.trim_end_matches('>'))
        .unwrap_or("localhost");

    let mut out = String::new();
    out.push_str(&format!("From: {}\r\n", message.from));
    out.push_str(&format!("To: {}\r\n", message.to));
    out.push_str(&format!("Subject: {}\r\n", message.subject));
    out.push_str(&format!("Date: {}\r\n", Utc::now().to_rfc2822()));
    out.push_str(&format!("Message-ID: <{}@{}>\r\n", id, domain));
    out.push_str("MIME-Version: 1.0\r\n");

    let body = message.body.replace("\r\n", "\n").replace('\n', "\r\n");

    let Some(attachment) = &message.attachment else {
        out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        out.push_str("Content-Transfer-Encoding: 8bit\r\n\r\n");
        out.push_str(&body);
        return Ok(out);
    };

    check_header("attachment filename", &attachment.filename)?;
    let boundary = format!("=_{}", id.simple());

    out.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
        boundary
    ));

    out.push_str(&format!("--{}\r\n", boundary));
    out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    out.push_str("Content-Transfer-Encoding: 8bit\r\n\r\n");
    out.push_str(&body);
    out.push_str("\r\n");

    out.push_str(&format!("--{}\r\n", boundary));
    out.push_str(&format!(
        "Content-Type: {}; name=\"{}\"\r\n",
        attachment.content_type, attachment.filename
    ));
    out.push_str("Content-Transfer-Encoding: base64\r\n");
    out.push_str(&format!(
        "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
        attachment.filename
    ));

    let encoded = STANDARD.encode(&attachment.bytes);
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        // base64 output is ASCII
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out.push_str(&format!("--{}--\r\n", boundary));

    Ok(out)
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let id = Uuid::new_v4();
        let contents = render(message, &id)?;

        let name = format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), id.simple());
        let partial = self.dir.join(format!("{}.tmp", name));
        let complete = self.dir.join(format!("{}.eml", name));

        tokio::fs::write(&partial, contents.as_bytes()).await?;
        tokio::fs::rename(&partial, &complete).await?;

        tracing::debug!(to = %message.to, file = %complete.display(), "Mail queued in outbox");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Attachment;
    use tempfile::TempDir;

    fn message() -> MailMessage {
        MailMessage {
            from: "server@school.test".to_string(),
            to: "ops@school.test".to_string(),
            subject: "Server log".to_string(),
            body: "Log attached.\n".to_string(),
            attachment: Some(Attachment {
                filename: "server.log".to_string(),
                content_type: "text/plain".to_string(),
                bytes: b"hello log".to_vec(),
            }),
        }
    }

    fn eml_files(dir: &TempDir) -> Vec<PathBuf> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn writes_eml_with_attachment() {
        let dir = TempDir::new().unwrap();
        let mailer = OutboxMailer::new(dir.path()).await.unwrap();

        mailer.send(&message()).await.unwrap();

        let files = eml_files(&dir);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].extension().unwrap(), "eml");

        let text = std::fs::read_to_string(&files[0]).unwrap();
        assert!(text.contains("To: ops@school.test\r\n"));
        assert!(text.contains("Subject: Server log\r\n"));
        assert!(text.contains("Content-Disposition: attachment; filename=\"server.log\""));
        assert!(text.contains(&STANDARD.encode(b"hello log")));
        assert!(text.contains("Log attached.\r\n"));
    }

    #[tokio::test]
    async fn plain_message_without_attachment() {
        let dir = TempDir::new().unwrap();
        let mailer = OutboxMailer::new(dir.path()).await.unwrap();

        let mut msg = message();
        msg.attachment = None;
        mailer.send(&msg).await.unwrap();

        let text = std::fs::read_to_string(&eml_files(&dir)[0]).unwrap();
        assert!(text.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(!text.contains("multipart"));
    }

    #[tokio::test]
    async fn header_injection_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mailer = OutboxMailer::new(dir.path()).await.unwrap();

        let mut msg = message();
        msg.subject = "Hi\r\nBcc: victim@example.test".to_string();

        assert!(matches!(
            mailer.send(&msg).await,
            Err(MailError::InvalidMessage(_))
        ));
        assert!(eml_files(&dir).is_empty());
    }

    #[test]
    fn long_attachments_are_wrapped() {
        let mut msg = message();
        if let Some(a) = msg.attachment.as_mut() {
            a.bytes = vec![b'x'; 1000];
        }
        let text = render(&msg, &Uuid::new_v4()).unwrap();
        assert!(text.lines().all(|l| l.len() <= 998));
        let encoded_lines = text
            .lines()
            .filter(|l| l.len() == LINE_WIDTH)
            .count();
        assert!(encoded_lines >= 10);
    }
}
