//! The seam between a conversation and whatever carries requests to the endpoint

use crate::credentials::Credential;
use crate::wire::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use std::error::Error;
use std::io;
use thiserror::Error;

/// Everything that can go wrong while getting a completion
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("credential is empty")]
    EmptyCredential,
    #[error("no credential has been saved")]
    MissingCredential,
    #[error("could not access the credential store: {0}")]
    CredentialStore(#[from] io::Error),
    #[error("transport failed: {0}")]
    Transport(#[source] Box<dyn Error + Send + Sync>),
    #[error("endpoint answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has no choices")]
    NoChoices,
}

impl FetchError {
    /// Creates a transport error from any error
    pub fn transport<E: Into<Box<dyn Error + Send + Sync>>>(error: E) -> Self {
        Self::Transport(error.into())
    }

    /// Whether this error was caused by what the user typed, rather than the endpoint
    pub fn is_input_error(&self) -> bool {
        matches!(self, FetchError::EmptyMessage | FetchError::EmptyCredential)
    }
}

/// Carries a request to the chat completion endpoint.
///
/// Implementations report every failure. They must never substitute a reply of their own.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatRequest,
    ) -> Result<ChatResponse, FetchError>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Box<T> {
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatRequest,
    ) -> Result<ChatResponse, FetchError> {
        (**self).complete(credential, request).await
    }
}

/// Decodes a raw endpoint answer, for transports that work with status codes and bodies
pub fn decode_response(status: u16, body: &[u8]) -> Result<ChatResponse, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }
    let response: ChatResponse = serde_json::from_slice(body)?;
    if response.choices.is_empty() {
        return Err(FetchError::NoChoices);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let body = br#"{"choices":[{"message":{"content":"@v1.0{#c1}"}}],"usage":{"total_tokens":12}}"#;
        let response = decode_response(200, body).expect("decodable");
        assert_eq!(response.content(), Some("@v1.0{#c1}"));
        assert_eq!(response.usage.total_tokens, 12);
    }

    #[test]
    fn test_decode_status() {
        let err = decode_response(401, b"bad key").expect_err("unauthorized");
        assert!(matches!(err, FetchError::Status { status: 401, ref body } if body == "bad key"));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_response(200, b"<html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_no_choices() {
        assert!(matches!(
            decode_response(200, br#"{"choices":[]}"#),
            Err(FetchError::NoChoices)
        ));
    }

    #[test]
    fn test_input_errors() {
        assert!(FetchError::EmptyMessage.is_input_error());
        assert!(!FetchError::MissingCredential.is_input_error());
        assert!(!FetchError::transport("connection reset").is_input_error());
    }
}
