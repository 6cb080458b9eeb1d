//! Shared crate-wide constants for Drivestage.
//!
//! Centralizes magic values used across modules. Adjusting these here will
//! propagate through the crate.

/// MIME type the remote store uses for folders.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Default MIME type recorded in the virtual view for uploaded files until
/// the store assigns a real one.
pub const UPLOAD_MIME: &str = "application/octet-stream";

/// MIME prefix of store-native document types that have no direct binary
/// representation. Downloading these requires an export pipeline, which is
/// out of scope; download requests for them are rejected at queue time.
pub const EXPORT_ONLY_MIME_PREFIX: &str = "application/vnd.google-apps.";

/// UUIDv5 namespace tag for deterministic plan/operation IDs.
/// Two plans with identical operation sequences get identical IDs.
pub const NS_TAG: &str = "https://drivestage/plan";

/// Schema version stamped on every emitted fact.
pub const FACTS_SCHEMA_VERSION: i64 = 1;
