// src/extract/attachments.rs
//! Attachment content materialization.
//!
//! Whenever attachment metadata is discovered, the materializer downloads
//! the binary and caches it keyed by (scope, attachment id). A failed
//! download never aborts the surrounding expansion or walk: the metadata
//! record is already stored, so a display layer can still show that the
//! attachment exists, and the job counters surface the gap between
//! discovered and downloaded.

use crate::api::{AlmApi, SessionHandle};
use crate::error_recovery::{retry_standard, with_session_renewal};
use crate::catalog::Collection;
use crate::constants::ATTACHMENT_NAME_MAX_LEN;
use crate::model::EntityRecord;
use crate::store::DocumentStore;
use crate::types::{AttachmentId, Scope, Username};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static ILLEGAL_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("static filename pattern"));

/// Trims a display name into a safe cache filename.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = ILLEGAL_FILENAME_CHARS.replace_all(name, "_");
    let trimmed = cleaned.trim_matches(['.', ' ']);
    let bounded: String = trimmed.chars().take(ATTACHMENT_NAME_MAX_LEN).collect();
    if bounded.is_empty() {
        "unnamed".to_string()
    } else {
        bounded
    }
}

/// Downloads attachment binaries and fills the content cache.
#[derive(Clone)]
pub struct AttachmentMaterializer {
    api: Arc<dyn AlmApi>,
    store: Arc<dyn DocumentStore>,
    session: Arc<SessionHandle>,
    scope: Scope,
    owner: Username,
}

impl AttachmentMaterializer {
    pub fn new(
        api: Arc<dyn AlmApi>,
        store: Arc<dyn DocumentStore>,
        session: Arc<SessionHandle>,
        scope: Scope,
        owner: Username,
    ) -> Self {
        Self {
            api,
            store,
            session,
            scope,
            owner,
        }
    }

    /// Downloads and caches the content for one stored attachment record.
    ///
    /// Returns whether the binary made it into the cache. Failures are
    /// logged and swallowed here; recoverability at attachment
    /// granularity is this component's contract.
    pub async fn materialize(&self, record: &EntityRecord) -> bool {
        let attachment_id = AttachmentId::from(&record.id);

        let content = retry_standard(|| {
            with_session_renewal(self.session.as_ref(), |token| {
                let api = Arc::clone(&self.api);
                let scope = self.scope.clone();
                let id = attachment_id.clone();
                async move { api.download_attachment(&token, &scope, &id).await }
            })
        })
        .await;

        let content = match content {
            Ok(content) => content,
            Err(e) => {
                log::warn!(
                    "Download failed for attachment {} '{}': {} (metadata kept)",
                    attachment_id,
                    record.name,
                    e
                );
                return false;
            }
        };

        let entry = crate::model::AttachmentCacheEntry {
            user: self.owner.clone(),
            scope_id: self.scope.cache_key(),
            attachment_id: attachment_id.clone(),
            filename: sanitize_filename(&record.name),
            content_type: content.content_type.clone(),
            size: content.bytes.len() as u64,
            content: BASE64.encode(&content.bytes),
            downloaded_at: Utc::now(),
        };
        let key = format!("{}::{}", entry.scope_id, attachment_id);

        let document = match serde_json::to_value(&entry) {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Could not encode cache entry for {}: {}", attachment_id, e);
                return false;
            }
        };
        match self
            .store
            .upsert(Collection::AttachmentFiles, &key, document)
            .await
        {
            Ok(()) => {
                log::debug!(
                    "Cached attachment {} ({} bytes) as '{}'",
                    attachment_id,
                    entry.size,
                    entry.filename
                );
                true
            }
            Err(e) => {
                log::warn!("Could not cache attachment {}: {}", attachment_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_illegal_characters() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?.png"), "a_b_c_d_e_.png");
        assert_eq!(sanitize_filename("report<v2>.pdf"), "report_v2_.pdf");
    }

    #[test]
    fn sanitize_trims_and_bounds() {
        assert_eq!(sanitize_filename("  . "), "unnamed");
        assert_eq!(sanitize_filename(""), "unnamed");
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).len(), ATTACHMENT_NAME_MAX_LEN);
    }
}
