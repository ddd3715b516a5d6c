// src/api/session.rs
//! Explicit session-handle threading.
//!
//! The handle owns the current token and the means to replace it, so an
//! expired session can be renewed transparently mid-extraction without
//! any ambient client state. Two extractions for different users each
//! carry their own handle and can never cross-contaminate cookies.

use super::Authenticator;
use crate::error::AppError;
use crate::types::{Credentials, SessionToken};
use parking_lot::RwLock;
use std::sync::Arc;

/// An authenticated upstream session plus the ability to renew it.
pub struct SessionHandle {
    authenticator: Arc<dyn Authenticator>,
    credentials: Credentials,
    token: RwLock<SessionToken>,
}

impl SessionHandle {
    /// Signs in and wraps the resulting token.
    pub async fn sign_in(
        authenticator: Arc<dyn Authenticator>,
        credentials: Credentials,
    ) -> Result<Self, AppError> {
        let token = authenticator.authenticate(&credentials).await?;
        log::info!("Authenticated upstream session for {}", credentials.username);
        Ok(Self {
            authenticator,
            credentials,
            token: RwLock::new(token),
        })
    }

    /// Snapshot of the current token, to be passed with one request.
    pub fn current(&self) -> SessionToken {
        self.token.read().clone()
    }

    /// Re-authenticates with the held credentials and installs the fresh
    /// token. Called when the upstream rejects the current cookies.
    pub async fn renew(&self) -> Result<SessionToken, AppError> {
        log::warn!(
            "Renewing expired upstream session for {}",
            self.credentials.username
        );
        let fresh = self.authenticator.authenticate(&self.credentials).await?;
        *self.token.write() = fresh.clone();
        Ok(fresh)
    }

    /// Ends the upstream session.
    pub async fn logout(&self) -> Result<(), AppError> {
        let token = self.current();
        self.authenticator.logout(&token).await?;
        *self.token.write() = SessionToken::default();
        Ok(())
    }
}
