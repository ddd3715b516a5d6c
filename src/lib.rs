// src/lib.rs
//! alm2store library — mirrors ALM/Quality Center test data into a
//! document store through a recursive, job-tracked extraction engine.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `AlmErrorCode`
//! - **Configuration** — `ExtractionConfig`
//! - **Domain model** — `EntityKind`, `EntityRecord`, `RawEntity`, ...
//! - **Domain types** — `EntityId`, `JobId`, `Username`, `Scope`, ...
//! - **Upstream API** — `AlmApi`, `Authenticator`, `AlmHttpClient`
//! - **Storage** — `DocumentStore`, `MemoryStore`, `Collection`
//! - **Extraction** — `Extractor`, `Counters`, `ExtractionJob`

mod api;
mod catalog;
mod config;
mod constants;
mod error;
mod error_recovery;
mod extract;
mod model;
mod normalize;
mod store;
mod types;

// --- Error Handling ---
pub use crate::error::{AlmErrorCode, AppError};
pub use crate::error_recovery::{retry_standard, retry_with_backoff, with_session_renewal};

// --- Configuration ---
pub use crate::config::{CommandLineInput, ExtractionConfig};
pub use crate::constants::{ALM_PAGE_SIZE, MAX_WALK_DEPTH, RETRY_MAX_ATTEMPTS};

// --- Domain Model ---
pub use crate::model::{
    AttachmentCacheEntry, AttachmentContent, EntityKind, EntityPage, EntityRecord, FieldValue,
    RawEntity, RawField, RawValue,
};
pub use crate::normalize::{normalize, normalize_flat};

// --- Domain Types ---
pub use crate::types::{
    AttachmentId, Credentials, EntityId, JobId, Scope, SessionToken, Username,
};

// --- Upstream API ---
pub use crate::api::{
    fetch_all_pages, AlmApi, AlmHttpClient, Authenticator, ListFilter, SessionHandle,
};

// --- Storage ---
pub use crate::catalog::{field_config, Collection, FieldSpec};
pub use crate::store::{record_key, Document, DocumentStore, Filter, MemoryStore};

// --- Extraction ---
pub use crate::extract::{
    assemble_tree, sanitize_filename, Counters, ExtractedNode, ExtractionJob, Extractor,
    JobStatus, JobTracker, LevelExpander, RecursiveExtractor,
};
