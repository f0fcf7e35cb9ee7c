pub mod access_id;
pub mod error;
pub mod expiry;
pub mod file;
pub mod format;
pub mod validation;

pub use access_id::generate_access_id;
pub use error::ValidationError;
pub use expiry::{calculate_expiration_date, is_expired};
pub use file::{FileInfo, FileRecord, NewFileRecord, StoragePointer};
pub use format::{format_file_size, format_time_remaining};
pub use validation::{sanitize_filename, validate_file_size, validate_file_type, UploadClaims};
