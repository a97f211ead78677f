//! Email delivery abstractions.
//!
//! Verification and reset flows render a message and await delivery through
//! an `EmailSender`; a failure surfaces to the caller as a retryable error.
//! The default sender for local dev is `LogEmailSender`, which logs the
//! message instead of delivering it. With a Resend API key configured,
//! `ResendEmailSender` posts to the Resend HTTP API.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const DEFAULT_FROM_ADDRESS: &str = "Atesti <onboarding@resend.dev>";

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub html: String,
}

/// Email delivery abstraction used by the auth handlers.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error for the caller to log.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
/// The logged body carries the verification link, so local flows stay usable
/// without a provider account.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.html,
            "email send stub"
        );
        Ok(())
    }
}

/// Sender backed by the Resend HTTP API.
pub struct ResendEmailSender {
    client: Client,
    api_key: SecretString,
    from_address: String,
    endpoint: String,
}

impl ResendEmailSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: SecretString, from_address: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("failed to build email HTTP client")?;
        Ok(Self {
            client,
            api_key,
            from_address,
            endpoint: RESEND_ENDPOINT.to_string(),
        })
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = json!({
            "from": self.from_address,
            "to": [message.to_email],
            "subject": message.subject,
            "html": message.html,
        });

        let span = info_span!(
            "email.send",
            email.provider = "resend",
            email.to = %message.to_email
        );
        async {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(self.api_key.expose_secret())
                .json(&payload)
                .send()
                .await
                .context("failed to reach email provider")?;

            let status = response.status();
            if !status.is_success() {
                // Status only; provider bodies can echo recipient addresses.
                return Err(anyhow!("email provider returned {status}"));
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    from_address: String,
    resend_api_key: Option<SecretString>,
}

impl EmailConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            resend_api_key: None,
        }
    }

    #[must_use]
    pub fn with_from_address(mut self, from_address: String) -> Self {
        self.from_address = from_address;
        self
    }

    #[must_use]
    pub fn with_resend_api_key(mut self, api_key: SecretString) -> Self {
        self.resend_api_key = Some(api_key);
        self
    }

    #[must_use]
    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub(crate) fn resend_api_key(&self) -> Option<&SecretString> {
        self.resend_api_key.as_ref()
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the sender for the configured delivery mode.
///
/// # Errors
/// Returns an error if the Resend client cannot be built.
pub fn build_sender(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    match config.resend_api_key() {
        Some(api_key) => Ok(Arc::new(ResendEmailSender::new(
            api_key.clone(),
            config.from_address().to_string(),
        )?)),
        None => Ok(Arc::new(LogEmailSender)),
    }
}
