//! Proof storage errors.

use thiserror::Error;

/// Reasons a proof could not be stored or read.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload carried no bytes.
    #[error("uploaded file is empty")]
    EmptyFile,

    /// Upload is over the size limit.
    #[error("file is {size} bytes; the limit is {max} bytes")]
    FileTooLarge {
        /// Upload size.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// Content type is not one of the accepted proof formats.
    #[error("content type '{content_type}' is not accepted for proofs")]
    UnsupportedType {
        /// Rejected content type.
        content_type: String,
    },

    /// No file under the key.
    #[error("no stored file at {key}")]
    NotFound {
        /// Requested key.
        key: String,
    },

    /// Backend could not be built or refused the operation.
    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl StorageError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyFile => "EMPTY_FILE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::UnsupportedType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Backend(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::EmptyFile => 400,
            Self::NotFound { .. } => 404,
            Self::FileTooLarge { .. } => 413,
            Self::UnsupportedType { .. } => 415,
            Self::Backend(_) => 500,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        if err.kind() == opendal::ErrorKind::NotFound {
            Self::NotFound {
                key: err.to_string(),
            }
        } else {
            Self::Backend(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_rejections_are_client_errors() {
        let cases = [
            (StorageError::EmptyFile, 400, "EMPTY_FILE"),
            (StorageError::FileTooLarge { size: 9, max: 4 }, 413, "FILE_TOO_LARGE"),
            (
                StorageError::UnsupportedType {
                    content_type: "text/html".into(),
                },
                415,
                "UNSUPPORTED_MEDIA_TYPE",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.http_status_code(), status);
            assert_eq!(err.error_code(), code);
        }
        assert_eq!(StorageError::Backend("disk full".into()).http_status_code(), 500);
    }
}
