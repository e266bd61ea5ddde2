//! Mail ingestion capabilities.
//!
//! The SMTP listener, TLS and SASL negotiation live in an external protocol
//! library. It calls into these traits; nothing here depends on a network
//! or protocol crate.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SmtpConfig;
use crate::error::{Error, Result};

/// Receives a message accepted by the transport.
#[async_trait]
pub trait MailHandler: Send + Sync {
    async fn handle(&self, origin: SocketAddr, from: &str, to: &[String], data: &[u8]) -> Result<()>;
}

/// Decides whether an SMTP AUTH attempt succeeds.
#[async_trait]
pub trait AuthHandler: Send + Sync {
    async fn authenticate(
        &self,
        remote: SocketAddr,
        mechanism: &str,
        username: &[u8],
        password: &[u8],
    ) -> Result<bool>;
}

/// Logs the envelope of every received message.
#[derive(Debug, Clone, Default)]
pub struct LoggingMailHandler;

#[async_trait]
impl MailHandler for LoggingMailHandler {
    async fn handle(&self, origin: SocketAddr, from: &str, to: &[String], data: &[u8]) -> Result<()> {
        info!(
            origin = %origin,
            from,
            to = to.first().map(String::as_str).unwrap_or(""),
            recipients = to.len(),
            bytes = data.len(),
            "Received mail"
        );
        Ok(())
    }
}

/// Accepts a single configured credential pair over PLAIN.
#[derive(Debug, Clone)]
pub struct StaticAuthHandler {
    username: String,
    password: String,
}

impl StaticAuthHandler {
    pub const MECHANISM: &'static str = "PLAIN";

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl AuthHandler for StaticAuthHandler {
    async fn authenticate(
        &self,
        remote: SocketAddr,
        mechanism: &str,
        username: &[u8],
        password: &[u8],
    ) -> Result<bool> {
        if !mechanism.eq_ignore_ascii_case(Self::MECHANISM) {
            warn!(remote = %remote, mechanism, "Unsupported auth mechanism");
            return Ok(false);
        }
        Ok(username == self.username.as_bytes() && password == self.password.as_bytes())
    }
}

/// Rejects every auth attempt. Used when no credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct DenyAllAuthHandler;

#[async_trait]
impl AuthHandler for DenyAllAuthHandler {
    async fn authenticate(&self, _: SocketAddr, _: &str, _: &[u8], _: &[u8]) -> Result<bool> {
        Ok(false)
    }
}

/// Capabilities handed to the mail transport.
#[derive(Clone)]
pub struct MailIngest {
    handler: Arc<dyn MailHandler>,
    auth: Arc<dyn AuthHandler>,
}

impl MailIngest {
    pub fn new(handler: Arc<dyn MailHandler>, auth: Arc<dyn AuthHandler>) -> Self {
        Self { handler, auth }
    }

    /// Logging handler plus static credentials when both are configured.
    pub fn from_config(config: &SmtpConfig) -> Self {
        let auth: Arc<dyn AuthHandler> = match (&config.auth_username, &config.auth_password) {
            (Some(user), Some(pass)) => Arc::new(StaticAuthHandler::new(user.clone(), pass.clone())),
            _ => Arc::new(DenyAllAuthHandler),
        };
        Self::new(Arc::new(LoggingMailHandler), auth)
    }

    /// Hand a received message to the handler.
    pub async fn deliver(&self, origin: SocketAddr, from: &str, to: &[String], data: &[u8]) -> Result<()> {
        if to.is_empty() {
            return Err(Error::InvalidInput("Message has no recipients".to_string()));
        }
        self.handler.handle(origin, from, to, data).await
    }

    pub async fn authenticate(
        &self,
        remote: SocketAddr,
        mechanism: &str,
        username: &[u8],
        password: &[u8],
    ) -> Result<bool> {
        self.auth.authenticate(remote, mechanism, username, password).await
    }
}
