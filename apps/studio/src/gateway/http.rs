//! reqwest-backed gateway clients.
//!
//! One `HttpGateway` serves both the resume store and the auth routes. Any 401
//! on a request that carried a bearer token expires the shared `Session`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StudioConfig;
use crate::gateway::{AuthGateway, GatewayError, PersistenceGateway};
use crate::models::record::{NewResume, ResumePatch, StoredResume, UploadedImage};
use crate::models::user::{AuthGrant, LoginRequest, RegisterRequest, UserProfile};
use crate::session::Session;

/// `{"error": {"code": …, "message": …}}` or the bare `{"message": …}` form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Envelope { error: ErrorDetail },
    Bare { message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}

fn error_for_status(status: StatusCode, body: &str) -> GatewayError {
    if status == StatusCode::NOT_FOUND {
        return GatewayError::NotFound;
    }
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Envelope { error }) => error.message,
        Ok(ErrorBody::Bare { message }) => message,
        Err(_) => body.trim().to_string(),
    };
    GatewayError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: Session,
}

impl HttpGateway {
    pub fn new(config: &StudioConfig, session: Session) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.api_timeout)
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    async fn send(&self, request: RequestBuilder, authenticated: bool) -> Result<Response, GatewayError> {
        let token = if authenticated { self.session.token() } else { None };
        let request = match &token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && authenticated {
            warn!("gateway returned 401, expiring session");
            self.session.expire();
            return Err(GatewayError::AuthExpired);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%status, "gateway request failed");
        Err(error_for_status(status, &body))
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<T, GatewayError> {
        let response = self.send(request, authenticated).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn create(&self, request: NewResume) -> Result<StoredResume, GatewayError> {
        self.json(self.request(Method::POST, "/api/resume").json(&request), true)
            .await
    }

    async fn list(&self) -> Result<Vec<StoredResume>, GatewayError> {
        self.json(self.request(Method::GET, "/api/resume"), true).await
    }

    async fn get(&self, id: Uuid) -> Result<StoredResume, GatewayError> {
        self.json(self.request(Method::GET, &format!("/api/resume/{id}")), true)
            .await
    }

    async fn update(&self, id: Uuid, patch: ResumePatch) -> Result<StoredResume, GatewayError> {
        self.json(
            self.request(Method::PUT, &format!("/api/resume/{id}"))
                .json(&patch),
            true,
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), GatewayError> {
        self.send(self.request(Method::DELETE, &format!("/api/resume/{id}")), true)
            .await
            .map(|_| ())
    }

    async fn upload_image(&self, png: Vec<u8>) -> Result<UploadedImage, GatewayError> {
        let size = png.len();
        let part = Part::bytes(png)
            .file_name("thumbnail.png")
            .mime_str("image/png")?;
        let form = Form::new().part("image", part);
        let uploaded: UploadedImage = self
            .json(
                self.request(Method::POST, "/api/resume/upload-image")
                    .multipart(form),
                true,
            )
            .await?;
        debug!(bytes = size, url = %uploaded.url, "uploaded image");
        Ok(uploaded)
    }
}

#[async_trait]
impl AuthGateway for HttpGateway {
    async fn register(&self, request: RegisterRequest) -> Result<AuthGrant, GatewayError> {
        let grant: AuthGrant = self
            .json(
                self.request(Method::POST, "/api/auth/register").json(&request),
                false,
            )
            .await?;
        self.session.sign_in(grant.clone());
        Ok(grant)
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthGrant, GatewayError> {
        let grant: AuthGrant = self
            .json(
                self.request(Method::POST, "/api/auth/login").json(&request),
                false,
            )
            .await?;
        self.session.sign_in(grant.clone());
        Ok(grant)
    }

    async fn profile(&self) -> Result<UserProfile, GatewayError> {
        let user: UserProfile = self
            .json(self.request(Method::GET, "/api/auth/profile"), true)
            .await?;
        self.session.set_user(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::models::user::StoredCredential;
    use crate::session::SessionStatus;

    /// Serves one connection with `response` and hands back the raw request head.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&head).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_error_envelope_message_is_used() {
        let err = error_for_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":"VALIDATION_ERROR","message":"No image uploaded"}}"#,
        );
        assert_eq!(
            err,
            GatewayError::Api {
                status: 400,
                message: "No image uploaded".into()
            }
        );
    }

    #[test]
    fn test_bare_message_and_plain_text_bodies() {
        let err = error_for_status(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"boom"}"#);
        assert!(matches!(err, GatewayError::Api { status: 500, ref message } if message == "boom"));

        let err = error_for_status(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert!(matches!(err, GatewayError::Api { ref message, .. } if message == "upstream down"));
    }

    #[test]
    fn test_not_found_maps_to_variant() {
        assert_eq!(
            error_for_status(StatusCode::NOT_FOUND, "{}"),
            GatewayError::NotFound
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let config = StudioConfig {
            api_url: "http://127.0.0.1:1".into(),
            api_timeout: Duration::from_secs(2),
            ..StudioConfig::default()
        };
        let gateway = HttpGateway::new(&config, Session::new()).unwrap();
        let err = gateway.list().await.unwrap_err();
        assert!(matches!(err, GatewayError::Network(_) | GatewayError::Timeout));
    }

    #[tokio::test]
    async fn test_rejected_token_expires_session() {
        let (api_url, server) =
            serve_once("HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        let config = StudioConfig {
            api_url,
            api_timeout: Duration::from_secs(5),
            ..StudioConfig::default()
        };
        let session = Session::restore(Some(StoredCredential {
            token: "stale-token".into(),
            user: None,
        }));
        assert_eq!(session.status(), SessionStatus::Active);
        let mut status = session.subscribe();

        let gateway = HttpGateway::new(&config, session.clone()).unwrap();
        let err = gateway.list().await.unwrap_err();

        assert_eq!(err, GatewayError::AuthExpired);
        assert_eq!(session.status(), SessionStatus::Expired);
        assert!(session.token().is_none());
        assert!(status.has_changed().unwrap());

        let head = server.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /api/resume "));
        assert!(head.contains("authorization: bearer stale-token"));
    }
}
