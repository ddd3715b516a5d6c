// src/types/domain_types.rs
//! Scope, identity, and session values.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The application user an extraction runs on behalf of.
///
/// Every stored record is partitioned by this value, so it is validated
/// once at the boundary and passed by reference everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation("username must not be empty".to_string()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The (domain, project) pair that qualifies every upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub domain: String,
    pub project: String,
}

impl Scope {
    pub fn new(domain: impl Into<String>, project: impl Into<String>) -> Result<Self, AppError> {
        let domain = domain.into();
        let project = project.into();
        if domain.trim().is_empty() || project.trim().is_empty() {
            return Err(AppError::Validation(
                "scope requires both a domain and a project".to_string(),
            ));
        }
        Ok(Self { domain, project })
    }

    /// Key prefix for records partitioned per scope (the attachment cache).
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.domain, self.project)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.project)
    }
}

/// Upstream sign-in credentials.
///
/// Held by the session handle for transparent renewal; the password never
/// appears in Debug output or logs.
#[derive(Clone)]
pub struct Credentials {
    pub username: Username,
    password: String,
}

impl Credentials {
    pub fn new(username: Username, password: impl Into<String>) -> Self {
        Self {
            username,
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated upstream session: the cookie set the server expects
/// echoed back on every call.
///
/// This is a plain value threaded explicitly through each request, never
/// ambient client state, so concurrent extractions for different users
/// cannot cross-contaminate sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionToken {
    pub lwsso: Option<String>,
    pub qc_session: Option<String>,
    pub alm_user: Option<String>,
    pub xsrf_token: Option<String>,
}

impl SessionToken {
    /// Renders the `Cookie` header value, or `None` when no cookie is held.
    pub fn cookie_header(&self) -> Option<String> {
        let mut cookies = Vec::new();
        if let Some(v) = &self.lwsso {
            cookies.push(format!("LWSSO_COOKIE_KEY={}", v));
        }
        if let Some(v) = &self.qc_session {
            cookies.push(format!("QCSession={}", v));
        }
        if let Some(v) = &self.alm_user {
            cookies.push(format!("ALM_USER={}", v));
        }
        if let Some(v) = &self.xsrf_token {
            cookies.push(format!("XSRF-TOKEN={}", v));
        }
        if cookies.is_empty() {
            None
        } else {
            Some(cookies.join("; "))
        }
    }

    /// Folds freshly received `Set-Cookie` values into the token. The
    /// upstream rotates individual cookies mid-session; absent names keep
    /// their current value.
    pub fn absorb(&mut self, name: &str, value: &str) {
        match name {
            "LWSSO_COOKIE_KEY" => self.lwsso = Some(value.to_string()),
            "QCSession" => self.qc_session = Some(value.to_string()),
            "ALM_USER" => self.alm_user = Some(value.to_string()),
            "XSRF-TOKEN" => self.xsrf_token = Some(value.to_string()),
            _ => {}
        }
    }
}
