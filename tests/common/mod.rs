// tests/common/mod.rs
//! Shared test fixtures: a scripted in-memory upstream and helpers for
//! wiring an extractor against it.

// not every test crate touches every helper
#![allow(dead_code)]

use alm2store::{
    AlmApi, AlmErrorCode, AppError, AttachmentContent, AttachmentId, Authenticator, Credentials,
    EntityId, EntityKind, EntityPage, Extractor, ListFilter, MemoryStore, RawEntity, Scope,
    SessionHandle, SessionToken, Username,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// One upstream entity in the scripted fixture tree.
#[derive(Debug, Clone)]
pub struct FixtureEntity {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    /// Upstream parent-type filter value, for attachments.
    pub parent_type: Option<String>,
    pub extra: Vec<(String, Value)>,
}

impl FixtureEntity {
    pub fn new(kind: EntityKind, id: &str, name: &str, parent_id: Option<&str>) -> Self {
        Self {
            kind,
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent_id.map(|p| p.to_string()),
            parent_type: None,
            extra: Vec::new(),
        }
    }

    pub fn attachment(id: &str, name: &str, parent_id: &str, parent_kind: EntityKind) -> Self {
        let mut entity = Self::new(EntityKind::Attachment, id, name, Some(parent_id));
        entity.parent_type = parent_kind.upstream_parent_type().map(|t| t.to_string());
        entity.extra.push(("file-size".to_string(), json!("2048")));
        entity
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.extra.push((name.to_string(), value));
        self
    }

    fn to_raw(&self) -> RawEntity {
        let mut pairs: Vec<(String, Value)> = vec![
            ("id".to_string(), json!(self.id)),
            ("name".to_string(), json!(self.name)),
        ];
        if let Some(parent) = &self.parent_id {
            pairs.push(("parent-id".to_string(), json!(parent)));
        }
        if let Some(parent_type) = &self.parent_type {
            pairs.push(("parent-type".to_string(), json!(parent_type)));
        }
        pairs.extend(self.extra.iter().cloned());
        RawEntity::from_pairs(self.kind.storage_tag(), pairs)
    }
}

/// Instruction to fail list calls that match a kind and parent filter.
#[derive(Debug, Clone)]
pub struct FailRule {
    pub kind: EntityKind,
    pub parent_id: String,
}

/// Scripted upstream double: serves a fixed fixture tree with real
/// pagination semantics, session cookies, and injectable failures.
pub struct MockAlm {
    entities: Vec<FixtureEntity>,
    domains: Vec<Value>,
    projects: HashMap<String, Vec<Value>>,
    contents: HashMap<String, Vec<u8>>,
    fail_rule: Mutex<Option<FailRule>>,
    valid_sessions: Mutex<HashSet<String>>,
    auth_calls: AtomicU32,
    list_calls: AtomicU32,
    download_calls: AtomicU32,
}

impl MockAlm {
    pub fn new(entities: Vec<FixtureEntity>) -> Self {
        Self {
            entities,
            domains: Vec::new(),
            projects: HashMap::new(),
            contents: HashMap::new(),
            fail_rule: Mutex::new(None),
            valid_sessions: Mutex::new(HashSet::new()),
            auth_calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
            download_calls: AtomicU32::new(0),
        }
    }

    pub fn with_content(mut self, attachment_id: &str, bytes: &[u8]) -> Self {
        self.contents.insert(attachment_id.to_string(), bytes.to_vec());
        self
    }

    pub fn with_domains(mut self, domains: &[&str]) -> Self {
        self.domains = domains.iter().map(|d| json!({"name": d})).collect();
        self
    }

    pub fn with_projects(mut self, domain: &str, projects: &[&str]) -> Self {
        self.projects.insert(
            domain.to_string(),
            projects.iter().map(|p| json!({"name": p})).collect(),
        );
        self
    }

    /// Makes list calls for `kind` children of `parent_id` fail fatally.
    pub fn fail_children_of(&self, kind: EntityKind, parent_id: &str) {
        *self.fail_rule.lock() = Some(FailRule {
            kind,
            parent_id: parent_id.to_string(),
        });
    }

    /// Invalidates every outstanding session; the next call fails with a
    /// session-expired error until re-authentication.
    pub fn expire_sessions(&self) {
        self.valid_sessions.lock().clear();
    }

    pub fn auth_calls(&self) -> u32 {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> u32 {
        self.download_calls.load(Ordering::SeqCst)
    }

    fn check_session(&self, session: &SessionToken) -> Result<(), AppError> {
        let valid = session
            .lwsso
            .as_ref()
            .is_some_and(|cookie| self.valid_sessions.lock().contains(cookie));
        if valid {
            Ok(())
        } else {
            Err(AppError::AlmService {
                code: AlmErrorCode::SessionExpired,
                message: "session cookie rejected".to_string(),
            })
        }
    }

    fn matches(&self, entity: &FixtureEntity, kind: EntityKind, filter: &ListFilter) -> bool {
        if entity.kind != kind {
            return false;
        }
        match filter {
            ListFilter::All => true,
            ListFilter::ById(id) => entity.id == id.as_str(),
            ListFilter::ByParent(parent) => {
                entity.parent_id.as_deref() == Some(parent.as_str())
            }
            ListFilter::AttachmentsOf {
                parent_id,
                parent_kind,
            } => {
                entity.parent_id.as_deref() == Some(parent_id.as_str())
                    && entity.parent_type.as_deref() == parent_kind.upstream_parent_type()
            }
        }
    }
}

#[async_trait::async_trait]
impl Authenticator for MockAlm {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, AppError> {
        let n = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let cookie = format!("sso-{}-{}", credentials.username, n);
        self.valid_sessions.lock().insert(cookie.clone());
        let mut token = SessionToken::default();
        token.absorb("LWSSO_COOKIE_KEY", &cookie);
        token.absorb("QCSession", "qc");
        Ok(token)
    }

    async fn logout(&self, session: &SessionToken) -> Result<(), AppError> {
        if let Some(cookie) = &session.lwsso {
            self.valid_sessions.lock().remove(cookie);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AlmApi for MockAlm {
    async fn list_page(
        &self,
        session: &SessionToken,
        _scope: &Scope,
        kind: EntityKind,
        filter: &ListFilter,
        start_index: u32,
        page_size: u32,
    ) -> Result<EntityPage, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_session(session)?;

        if let Some(rule) = self.fail_rule.lock().clone() {
            if rule.kind == kind
                && matches!(filter, ListFilter::ByParent(p) if p.as_str() == rule.parent_id)
            {
                return Err(AppError::AlmService {
                    code: AlmErrorCode::BadRequest,
                    message: format!("scripted failure for children of {}", rule.parent_id),
                });
            }
        }

        let matching: Vec<RawEntity> = self
            .entities
            .iter()
            .filter(|e| self.matches(e, kind, filter))
            .map(FixtureEntity::to_raw)
            .collect();

        let from = (start_index.saturating_sub(1)) as usize;
        let to = (from + page_size as usize).min(matching.len());
        let page = matching.get(from..to).unwrap_or(&[]).to_vec();

        Ok(EntityPage {
            total_results: matching.len() as u64,
            entities: page,
        })
    }

    async fn list_flat(
        &self,
        session: &SessionToken,
        kind: EntityKind,
        domain: Option<&str>,
    ) -> Result<Vec<Value>, AppError> {
        self.check_session(session)?;
        match kind {
            EntityKind::Domain => Ok(self.domains.clone()),
            EntityKind::Project => Ok(domain
                .and_then(|d| self.projects.get(d))
                .cloned()
                .unwrap_or_default()),
            other => Err(AppError::InternalError {
                message: format!("{} is not flat", other),
                source: None,
            }),
        }
    }

    async fn download_attachment(
        &self,
        session: &SessionToken,
        _scope: &Scope,
        id: &AttachmentId,
    ) -> Result<AttachmentContent, AppError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.check_session(session)?;
        match self.contents.get(id.as_str()) {
            Some(bytes) => Ok(AttachmentContent {
                bytes: bytes.clone(),
                content_type: Some("application/octet-stream".to_string()),
            }),
            None => Err(AppError::AlmService {
                code: AlmErrorCode::NotFound,
                message: format!("no content for attachment {}", id),
            }),
        }
    }
}

/// A fully wired extractor over a mock upstream and an in-memory store.
pub struct Harness {
    pub alm: Arc<MockAlm>,
    pub store: Arc<MemoryStore>,
    pub extractor: Extractor,
    pub owner: Username,
}

pub async fn harness(alm: MockAlm) -> Harness {
    let alm = Arc::new(alm);
    let store = Arc::new(MemoryStore::new());
    let owner = Username::new("tester").expect("valid test user");
    let credentials = Credentials::new(owner.clone(), "secret");
    let session = Arc::new(
        SessionHandle::sign_in(alm.clone() as Arc<dyn Authenticator>, credentials)
            .await
            .expect("mock sign-in succeeds"),
    );
    let scope = Scope::new("DEFAULT", "Demo").expect("valid test scope");
    let extractor = Extractor::new(
        alm.clone() as Arc<dyn AlmApi>,
        store.clone(),
        session,
        scope,
        owner.clone(),
    );
    Harness {
        alm,
        store,
        extractor,
        owner,
    }
}

pub fn entity_id(id: &str) -> EntityId {
    EntityId::new(id).expect("valid test entity id")
}

/// The baseline tree: root folder F1 with subfolders F2/F3 and test T1
/// carrying two design steps and one attachment.
pub fn baseline_tree() -> Vec<FixtureEntity> {
    vec![
        FixtureEntity::new(EntityKind::Folder, "1", "F1", None),
        FixtureEntity::new(EntityKind::Folder, "2", "F2", Some("1")),
        FixtureEntity::new(EntityKind::Folder, "3", "F3", Some("1")),
        FixtureEntity::new(EntityKind::Test, "100", "T1", Some("1"))
            .with_field("status", json!("Ready")),
        FixtureEntity::new(EntityKind::DesignStep, "1001", "Step 1", Some("100"))
            .with_field("step-order", json!("1")),
        FixtureEntity::new(EntityKind::DesignStep, "1002", "Step 2", Some("100"))
            .with_field("step-order", json!("2")),
        FixtureEntity::attachment("5001", "evidence.png", "100", EntityKind::Test),
    ]
}

/// A single chain of folders `d0 → d1 → ... → d{depth}`.
pub fn folder_chain(depth: usize) -> Vec<FixtureEntity> {
    let mut entities = vec![FixtureEntity::new(EntityKind::Folder, "d0", "Level 0", None)];
    for level in 1..=depth {
        entities.push(FixtureEntity::new(
            EntityKind::Folder,
            &format!("d{}", level),
            &format!("Level {}", level),
            Some(&format!("d{}", level - 1)),
        ));
    }
    entities
}
