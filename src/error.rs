//! Error handling and custom error types
//!
//! `Error` covers infrastructure failures across the application. The product
//! write and delete paths surface their own outcome types, [`WriteError`] and
//! [`DeleteError`], so callers can map each case to a response.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("S3/storage error: {0}")]
    S3(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Product {0} not found")]
    NotFound(Uuid),

    #[error("Failed to upload {failed} of {total} images")]
    ImageUploadFailed { failed: usize, total: usize },

    #[error("Failed to persist product: {0}")]
    PersistenceFailed(String),
}

#[derive(Error, Debug)]
pub enum DeleteError {
    #[error("Product {0} not found")]
    NotFound(Uuid),

    #[error("Failed to delete product: {0}")]
    PersistenceFailed(String),
}

/// A remote image that could not be removed while deleting its product.
///
/// Never fatal: the product delete has already succeeded when one of these is
/// recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupFailure {
    pub provider_id: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_the_field() {
        assert_eq!(
            WriteError::MissingField("price").to_string(),
            "price is required"
        );
    }

    #[test]
    fn test_upload_failure_message_counts_failures() {
        let err = WriteError::ImageUploadFailed {
            failed: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "Failed to upload 1 of 3 images");
    }
}
