use thiserror::Error;

use crate::decoder::reed_solomon::ReedSolomonError;

/// Why a decode attempt failed.
///
/// `NotFound`, `Format` and `Checksum` are the three recoverable failures a
/// frame-by-frame scanner expects on most frames. `InvalidArgument` marks a
/// precondition the caller violated and will not go away by retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QrError {
    /// No symbol could be located in the image
    #[error("no QR code found")]
    NotFound,
    /// A symbol was located but its structure could not be parsed
    #[error("malformed QR code: {0}")]
    Format(String),
    /// Error correction could not recover the codewords
    #[error("checksum failure: {0}")]
    Checksum(String),
    /// The caller passed inconsistent input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl QrError {
    /// Shorthand for a [`QrError::Format`] error
    pub fn format(msg: impl Into<String>) -> Self {
        QrError::Format(msg.into())
    }

    /// Whether a later frame could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, QrError::InvalidArgument(_))
    }
}

impl From<ReedSolomonError> for QrError {
    fn from(err: ReedSolomonError) -> Self {
        QrError::Checksum(err.to_string())
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, QrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(QrError::NotFound.is_recoverable());
        assert!(QrError::format("bad").is_recoverable());
        assert!(!QrError::InvalidArgument("x".into()).is_recoverable());
    }

    #[test]
    fn test_rs_error_maps_to_checksum() {
        let err: QrError = ReedSolomonError::TooManyErrors.into();
        assert!(matches!(err, QrError::Checksum(_)));
    }
}
