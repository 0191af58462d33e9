//! Remote collaborators: the resume store and the auth service.
//!
//! Everything above this module talks to the traits. `http` provides the
//! reqwest-backed implementations.

#[cfg(feature = "http")]
pub mod http;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::record::{NewResume, ResumePatch, StoredResume, UploadedImage};
use crate::models::user::{AuthGrant, LoginRequest, RegisterRequest, UserProfile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// The server rejected the bearer token. The session has already been expired.
    #[error("session expired")]
    AuthExpired,

    #[error("not found")]
    NotFound,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// The text shown to the user, when it differs from the generic failure message.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            GatewayError::AuthExpired => Some("Your session has expired. Please sign in again."),
            GatewayError::Timeout => Some("The server took too long to respond"),
            GatewayError::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn create(&self, request: NewResume) -> Result<StoredResume, GatewayError>;

    async fn list(&self) -> Result<Vec<StoredResume>, GatewayError>;

    async fn get(&self, id: Uuid) -> Result<StoredResume, GatewayError>;

    async fn update(&self, id: Uuid, patch: ResumePatch) -> Result<StoredResume, GatewayError>;

    async fn delete(&self, id: Uuid) -> Result<(), GatewayError>;

    /// Uploads a PNG and returns the reference the store will serve it from.
    async fn upload_image(&self, png: Vec<u8>) -> Result<UploadedImage, GatewayError>;
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> Result<AuthGrant, GatewayError>;

    async fn login(&self, request: LoginRequest) -> Result<AuthGrant, GatewayError>;

    async fn profile(&self) -> Result<UserProfile, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert!(GatewayError::AuthExpired.user_message().is_some());
        assert_eq!(
            GatewayError::Api {
                status: 400,
                message: "Title too long".into()
            }
            .user_message(),
            Some("Title too long")
        );
        assert_eq!(GatewayError::NotFound.user_message(), None);
    }
}
