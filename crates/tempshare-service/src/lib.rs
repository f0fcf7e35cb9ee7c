mod error;
mod files;
pub mod retrieval;
pub mod storage;
pub mod sweep;
pub mod upload;

pub use error::ServiceError;
pub use files::{FileService, ServiceConfig};
pub use retrieval::Download;
pub use storage::Storage;
pub use sweep::SweepReport;
pub use upload::{DeclaredUpload, UploadFile, UploadOutcome, UploadToken};

#[cfg(test)]
pub(crate) mod test_support;
