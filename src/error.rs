use crate::cache::key::NameError;
use crate::decode::DecodeError;
use thiserror::Error;

/// Unified error type for the texture cache.
///
/// Most failures never reach the embedder as `Err`: the preview layer
/// absorbs them into status values so the redraw loop always has something
/// safe to render. This enum is what the fallible setup and store-write
/// paths return.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed cache entry name: {0}")]
    Name(#[from] NameError),

    #[error("transfer failed: {message}")]
    Transfer { message: String },

    #[error("image decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_display() {
        let err = Error::transfer("connection reset");
        assert_eq!(err.to_string(), "transfer failed: connection reset");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
