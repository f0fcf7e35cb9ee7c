use thiserror::Error;

/// Reasons an upload is refused before any bytes are stored.
///
/// The `Display` text is what callers see in per-file results, so keep it
/// short and free of internals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No files provided")]
    NoFiles,

    #[error("File is empty")]
    EmptyFile,

    #[error("File size exceeds {max_mb}MB limit")]
    FileTooLarge { max_mb: u64 },

    #[error("File type not allowed for security reasons")]
    BlockedFileType,

    #[error("Invalid filename")]
    InvalidFileName,

    #[error("Access ID is required")]
    MissingAccessId,
}
