//! # Attachment Policy
//!
//! Validation of uploaded files before they are attached to a note. Type
//! is checked before size, matching the order users see rejections in.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default ceiling for one attachment: 5 MiB, inclusive
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Attachment kinds shown next to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    Image,
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "CSV")]
    Csv,
    #[serde(rename = "DOCX")]
    Docx,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "Image",
            AttachmentKind::Pdf => "PDF",
            AttachmentKind::Csv => "CSV",
            AttachmentKind::Docx => "DOCX",
        }
    }
}

/// One accepted MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedType {
    pub mime_type: String,
    pub kind: AttachmentKind,
    /// Used when the file name has no extension
    pub extension: String,
}

impl AllowedType {
    fn new(mime_type: &str, kind: AttachmentKind, extension: &str) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            kind,
            extension: extension.to_string(),
        }
    }
}

/// A file as received from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl AttachmentUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Why a file was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    UnsupportedType,
    TooLarge,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::UnsupportedType => "unsupported_type",
            RejectionReason::TooLarge => "too_large",
        }
    }
}

/// Structured rejection, reported rather than raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRejection {
    pub name: String,
    pub reason: RejectionReason,
    pub message: String,
}

/// Stored attachment metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub kind: AttachmentKind,
    pub mime_type: String,
    pub size_bytes: u64,
    /// `{owner}/{epoch_millis}.{ext}`, key of the cached payload
    pub reference: String,
    /// Hex SHA-256 of the payload
    pub checksum: String,
}

impl Attachment {
    /// Calculate checksum for data
    pub fn calculate_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }
}

/// Allowed types and size ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    allowed: Vec<AllowedType>,
    max_bytes: u64,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            allowed: vec![
                AllowedType::new("image/jpeg", AttachmentKind::Image, "jpg"),
                AllowedType::new("image/png", AttachmentKind::Image, "png"),
                AllowedType::new("image/gif", AttachmentKind::Image, "gif"),
                AllowedType::new("application/pdf", AttachmentKind::Pdf, "pdf"),
                AllowedType::new("text/csv", AttachmentKind::Csv, "csv"),
                AllowedType::new(
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    AttachmentKind::Docx,
                    "docx",
                ),
            ],
            max_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

impl AttachmentPolicy {
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Entry for an allowed MIME type
    pub fn allowed_type(&self, mime_type: &str) -> Option<&AllowedType> {
        self.allowed.iter().find(|t| t.mime_type == mime_type)
    }

    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        self.allowed_type(mime_type).is_some()
    }

    /// Validates an upload, returning its allowed-type entry
    pub fn check(&self, upload: &AttachmentUpload) -> Result<&AllowedType, AttachmentRejection> {
        let Some(allowed) = self.allowed_type(&upload.mime_type) else {
            return Err(AttachmentRejection {
                name: upload.name.clone(),
                reason: RejectionReason::UnsupportedType,
                message: format!("File type {} not supported", upload.mime_type),
            });
        };

        if upload.size() > self.max_bytes {
            return Err(AttachmentRejection {
                name: upload.name.clone(),
                reason: RejectionReason::TooLarge,
                message: format!(
                    "File {} is too large (max {})",
                    upload.name,
                    format_limit(self.max_bytes)
                ),
            });
        }

        Ok(allowed)
    }

    /// Extension for a stored reference: the file's own, else the type's
    pub fn extension_for(&self, upload: &AttachmentUpload, allowed: &AllowedType) -> String {
        Path::new(&upload.name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| allowed.extension.clone())
    }
}

fn format_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    const KIB: u64 = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: &str, size: usize) -> AttachmentUpload {
        AttachmentUpload::new(name, mime, vec![0u8; size])
    }

    #[test]
    fn test_exactly_at_ceiling_accepted() {
        let policy = AttachmentPolicy::default();
        let file = upload("scan.pdf", "application/pdf", DEFAULT_MAX_ATTACHMENT_BYTES as usize);
        assert_eq!(policy.check(&file).unwrap().kind, AttachmentKind::Pdf);
    }

    #[test]
    fn test_one_byte_over_rejected() {
        let policy = AttachmentPolicy::default();
        let file = upload("scan.pdf", "application/pdf", DEFAULT_MAX_ATTACHMENT_BYTES as usize + 1);
        let rejection = policy.check(&file).unwrap_err();
        assert_eq!(rejection.reason, RejectionReason::TooLarge);
        assert_eq!(rejection.message, "File scan.pdf is too large (max 5MB)");
    }

    #[test]
    fn test_type_checked_before_size() {
        let policy = AttachmentPolicy::default();
        let file = upload("huge.exe", "application/x-msdownload", 10 * 1024 * 1024);
        let rejection = policy.check(&file).unwrap_err();
        assert_eq!(rejection.reason, RejectionReason::UnsupportedType);
        assert_eq!(rejection.message, "File type application/x-msdownload not supported");
    }

    #[test]
    fn test_extension_falls_back_to_type() {
        let policy = AttachmentPolicy::default();
        let named = upload("Photo.JPEG", "image/jpeg", 1);
        let bare = upload("photo", "image/jpeg", 1);
        let allowed = policy.allowed_type("image/jpeg").unwrap();

        assert_eq!(policy.extension_for(&named, allowed), "jpeg");
        assert_eq!(policy.extension_for(&bare, allowed), "jpg");
    }

    #[test]
    fn test_custom_limit_message() {
        let policy = AttachmentPolicy::default().with_max_bytes(512 * 1024);
        let rejection = policy.check(&upload("a.csv", "text/csv", 600 * 1024)).unwrap_err();
        assert_eq!(rejection.message, "File a.csv is too large (max 512KB)");
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            Attachment::calculate_checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_kind_serializes_as_label() {
        assert_eq!(serde_json::to_string(&AttachmentKind::Docx).unwrap(), r#""DOCX""#);
        assert_eq!(serde_json::to_string(&AttachmentKind::Image).unwrap(), r#""Image""#);
    }
}
