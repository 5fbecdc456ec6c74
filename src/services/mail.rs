// src/services/mail.rs

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::common::error::AppError;

/// Imagem embutida no HTML, referenciada por `cid:<content_id>`.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub content_id: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub html: String,
    pub inline_images: Vec<InlineImage>,
}

/// Transporte de e-mail. Produção usa SMTP; os testes gravam em memória.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, user: &str, password: &str, from: &str) -> Result<Self, AppError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| AppError::MailError(format!("SMTP inválido ({}): {}", host, e)))?
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| AppError::MailError(format!("Remetente inválido ({}): {}", from, e)))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        let address = mail
            .to
            .parse::<Address>()
            .map_err(|e| AppError::MailError(format!("Destinatário inválido ({}): {}", mail.to, e)))?;
        let to = Mailbox::new(Some(mail.to_name), address);

        // multipart/related: HTML primeiro, imagens inline depois
        let mut body = MultiPart::related().singlepart(SinglePart::html(mail.html));
        for image in mail.inline_images {
            let content_type = ContentType::parse(&image.content_type)
                .map_err(|e| AppError::MailError(format!("Content-Type inválido: {}", e)))?;
            body = body.singlepart(Attachment::new_inline(image.content_id).body(image.bytes, content_type));
        }

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .multipart(body)
            .map_err(|e| AppError::MailError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::MailError(e.to_string()))?;
        Ok(())
    }
}
