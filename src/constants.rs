// src/constants.rs
//! Domain constants that define the operational boundaries of the engine.
//!
//! Each constant is named for the domain concept it constrains. Reading
//! these should tell you the story of how an extraction runs: how big a
//! page is, how deep a walk may go, how often a failed call is retried.

// ---------------------------------------------------------------------------
// Upstream API boundaries
// ---------------------------------------------------------------------------

/// How many entities the upstream returns per page of results.
///
/// The ALM REST interface caps pages at 100 records. We always request the
/// maximum to minimize round trips during recursive extraction.
pub const ALM_PAGE_SIZE: u32 = 100;

/// First value of the `start-index` pagination cursor (the upstream counts
/// records from 1, not 0).
pub const ALM_FIRST_INDEX: u32 = 1;

/// Maximum nesting depth for a recursive extraction walk.
///
/// Test-plan folders self-reference, so a corrupted parent chain could
/// otherwise recurse forever. Real projects stay well under this.
pub const MAX_WALK_DEPTH: u8 = 20;

/// Timeout for a single upstream list or metadata request.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for an attachment content download.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Bounded attempts for a transiently failing upstream call.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Initial backoff delay between retry attempts, in milliseconds.
pub const RETRY_INITIAL_DELAY_MS: u64 = 100;

/// Upper bound on the backoff delay, in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 5_000;

// ---------------------------------------------------------------------------
// Attachment cache
// ---------------------------------------------------------------------------

/// Longest filename kept for a cached attachment; the remainder is trimmed.
pub const ATTACHMENT_NAME_MAX_LEN: usize = 200;
