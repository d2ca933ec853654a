//! Storage key names
//!
//! Shared with data written by earlier builds of the explorer, so these
//! must not change.

/// Configuration snapshot list
pub const CONFIGS: &str = "configs";

/// Annotation map, owner to notes
pub const USER_NOTES: &str = "user_notes";

/// Consent record
pub const COOKIE_CONSENT: &str = "cookieConsent";

/// Attachment payload cache, owner to reference to entry
pub const FILE_CACHE: &str = "file_cache";
