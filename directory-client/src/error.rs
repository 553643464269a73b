//! Client error types

use thiserror::Error;
use tonic::Code;

/// Errors surfaced by the directory client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach or talk to the gRPC endpoint
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The server answered with a non-OK status
    #[error("{:?} - {}", .0.code(), .0.message())]
    Status(Box<tonic::Status>),

    /// Fetching a token over HTTP failed
    #[error("Token request failed: {0}")]
    Token(#[from] reqwest::Error),

    /// The token could not be carried as metadata
    #[error("Invalid metadata value: {0}")]
    InvalidMetadata(#[from] tonic::metadata::errors::InvalidMetadataValue),

    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        ClientError::Status(Box::new(status))
    }
}

impl ClientError {
    /// Status code reported for this failure
    ///
    /// Failures that never reached the RPC layer are reported as
    /// `Unavailable` (connectivity, token endpoint) or `Internal`.
    pub fn code(&self) -> Code {
        match self {
            ClientError::Status(status) => status.code(),
            ClientError::Transport(_) | ClientError::Token(_) => Code::Unavailable,
            ClientError::InvalidMetadata(_) | ClientError::Io(_) => Code::Internal,
        }
    }

    /// Message reported for this failure
    pub fn message(&self) -> String {
        match self {
            ClientError::Status(status) => status.message().to_string(),
            other => other.to_string(),
        }
    }

    /// `"{Code:?} - {message}"` line printed by the session
    pub fn report(&self) -> String {
        format!("{:?} - {}", self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_report() {
        let err = ClientError::from(tonic::Status::not_found("User with ID 11 could not be found"));
        assert_eq!(err.code(), Code::NotFound);
        assert_eq!(err.report(), "NotFound - User with ID 11 could not be found");
        assert_eq!(err.to_string(), err.report());
    }

    #[test]
    fn test_io_report() {
        let err = ClientError::from(std::io::Error::other("stdin closed"));
        assert_eq!(err.code(), Code::Internal);
        assert!(err.report().starts_with("Internal - I/O error"));
    }
}
