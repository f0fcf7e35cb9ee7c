use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;

const MIB: u64 = 1024 * 1024;

/// MIME types refused at upload.
///
/// This is a deny-list, so anything not named here is accepted. It only
/// stops the most obvious executable uploads and is weak by design.
pub const BLOCKED_MIME_TYPES: [&str; 4] = [
    "application/x-msdownload",
    "application/x-executable",
    "application/x-sh",
    "application/x-bat",
];

const UNSAFE_CHARS: [char; 7] = ['<', '>', ':', '"', '|', '?', '*'];

/// True iff `0 < size <= max_mb` MiB.
pub fn validate_file_size(size: u64, max_mb: u64) -> bool {
    size > 0 && size <= max_mb.saturating_mul(MIB)
}

pub fn validate_file_type(mime_type: &str) -> bool {
    !BLOCKED_MIME_TYPES.contains(&mime_type)
}

/// Strip path separators, `..` sequences and filesystem-unsafe characters.
///
/// Returns an empty string when nothing usable remains; callers must treat
/// that as an invalid name.
pub fn sanitize_filename(name: &str) -> String {
    let mut out: String = name
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && !UNSAFE_CHARS.contains(c))
        .collect();
    while out.contains("..") {
        out = out.replace("..", "");
    }
    out.trim().to_string()
}

/// Upload metadata that has passed server-side validation.
///
/// Built once where client-declared values enter the system. Everything
/// downstream takes an `UploadClaims` instead of re-reading raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadClaims {
    file_name: String,
    file_type: String,
    file_size: u64,
}

impl UploadClaims {
    /// Validate declared metadata: size, then type, then name.
    pub fn new(
        declared_name: &str,
        declared_type: &str,
        declared_size: u64,
        max_mb: u64,
    ) -> Result<Self, ValidationError> {
        if declared_size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if !validate_file_size(declared_size, max_mb) {
            return Err(ValidationError::FileTooLarge { max_mb });
        }
        if !validate_file_type(declared_type) {
            return Err(ValidationError::BlockedFileType);
        }
        let file_name = sanitize_filename(declared_name);
        if file_name.is_empty() {
            return Err(ValidationError::InvalidFileName);
        }
        Ok(Self {
            file_name,
            file_type: declared_type.to_string(),
            file_size: declared_size,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}
