//! # REST backend
//!
//! [`RestBackend`] implements [`Backend`] against the BaaS HTTP surface:
//!
//! | Call | Endpoint |
//! |------|----------|
//! | `sign_in` | `POST /auth/v1/token?grant_type=password` |
//! | `sign_up` | `POST /auth/v1/signup`, then `POST /rest/v1/profiles` |
//! | `sign_out` | `POST /auth/v1/logout` |
//! | `current_session` | `GET /auth/v1/user` |
//! | `fetch_profile` | `GET /rest/v1/profiles?id=eq.<id>` |
//!
//! Every request carries the project's `apikey` header. Authenticated requests add
//! `Authorization: Bearer <access token>`; anonymous ones use the anon key.
//!
//! The access token is persisted in the same [`Storage`] as the session record,
//! under [`AUTH_TOKEN_KEY`], so a page reload keeps the BaaS session alive. A
//! `401`/`403` on an authenticated read means the token expired or was revoked:
//! the token is forgotten and the call reports [`ApiError::Unauthorized`]
//! (`current_session` reports `None`).

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use store::Storage;

use crate::backend::{AuthSession, Backend, SignUp};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::models::{ApprovalStatus, UserProfile};

/// Storage key for the persisted BaaS token.
pub const AUTH_TOKEN_KEY: &str = "marketplace.auth_token";

const PROFILE_COLUMNS: &str = "id,role,display_name,email,phone,status";

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    user_id: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    user: Option<AuthUser>,
}

#[derive(Debug, Serialize)]
struct ProfileInsert<'a> {
    id: &'a str,
    role: store::Role,
    display_name: &'a str,
    email: &'a str,
    status: ApprovalStatus,
}

/// HTTP client for the hosted backend.
#[derive(Clone, Debug)]
pub struct RestBackend<S> {
    config: ClientConfig,
    http: Client,
    tokens: S,
}

impl<S: Storage> RestBackend<S> {
    pub fn new(config: ClientConfig, tokens: S) -> Self {
        Self {
            config,
            http: Client::new(),
            tokens,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn stored_token(&self) -> Option<StoredToken> {
        let raw = self.tokens.get_item(AUTH_TOKEN_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    fn store_token(&self, session: &AuthSession) {
        let token = StoredToken {
            user_id: session.user_id.clone(),
            access_token: session.access_token.clone(),
        };
        if let Ok(raw) = serde_json::to_string(&token) {
            self.tokens.set_item(AUTH_TOKEN_KEY, &raw);
        }
    }

    fn forget_token(&self) {
        self.tokens.remove_item(AUTH_TOKEN_KEY);
    }

    fn bearer(&self) -> String {
        let token = self
            .stored_token()
            .map(|t| t.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone());
        format!("Bearer {token}")
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.config.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", self.bearer())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.config.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", self.bearer())
    }

    fn session_from(response: TokenResponse) -> Result<AuthSession> {
        let user = response
            .user
            .ok_or_else(|| ApiError::Validation("auth response carried no user".to_string()))?;
        let access_token = response.access_token.ok_or_else(|| {
            ApiError::Validation("Check your inbox to confirm the account, then sign in".to_string())
        })?;
        Ok(AuthSession {
            user_id: user.id,
            access_token,
        })
    }
}

fn rejected(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

impl<S: Storage> Backend for RestBackend<S> {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let response = self
            .get("/rest/v1/profiles")
            .query(&[("id", format!("eq.{user_id}")), ("select", PROFILE_COLUMNS.to_string())])
            .send()
            .await?;
        if rejected(response.status()) {
            tracing::info!("Access token rejected while reading profile {user_id}");
            self.forget_token();
            return Err(ApiError::Unauthorized);
        }
        let rows: Vec<UserProfile> = check(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn current_session(&self) -> Result<Option<AuthSession>> {
        let Some(token) = self.stored_token() else {
            return Ok(None);
        };

        let response = self.get("/auth/v1/user").send().await?;
        if rejected(response.status()) {
            self.forget_token();
            return Ok(None);
        }
        let user: AuthUser = check(response).await?.json().await?;

        Ok(Some(AuthSession {
            user_id: user.id,
            access_token: token.access_token,
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .http
            .post(self.config.endpoint("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if matches!(response.status(), StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Err(ApiError::InvalidCredentials);
        }
        let body: TokenResponse = check(response).await?.json().await?;
        let session = Self::session_from(body)?;
        self.store_token(&session);
        Ok(session)
    }

    async fn sign_up(&self, account: &SignUp) -> Result<AuthSession> {
        let response = self
            .http
            .post(self.config.endpoint("/auth/v1/signup"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({
                "email": account.email,
                "password": account.password,
                "data": { "display_name": account.display_name, "role": account.role },
            }))
            .send()
            .await?;
        let body: TokenResponse = check(response).await?.json().await?;
        let session = Self::session_from(body)?;
        self.store_token(&session);

        let row = ProfileInsert {
            id: &session.user_id,
            role: account.role,
            display_name: &account.display_name,
            email: &account.email,
            status: ApprovalStatus::initial_for(account.role),
        };
        let response = self
            .post("/rest/v1/profiles")
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        check(response).await?;

        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.stored_token().is_none() {
            return Ok(());
        }
        let result = self.post("/auth/v1/logout").send().await;
        self.forget_token();
        check(result?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Duration;

    use store::{MemoryStorage, Role, SessionRecord};

    use crate::validator::{InvalidReason, SessionValidator, Validation};

    /// Answer a single request on a local port, returning the base URL.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = [0u8; 8192];
            let _ = stream.read(&mut request);
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });
        format!("http://{addr}")
    }

    fn signed_in_backend(url: String) -> (RestBackend<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let backend = RestBackend::new(ClientConfig::new(url, "anon-key"), storage.clone());
        backend.store_token(&AuthSession {
            user_id: "u1".to_string(),
            access_token: "expired-jwt".to_string(),
        });
        (backend, storage)
    }

    fn backend() -> (RestBackend<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let config = ClientConfig::new("https://project.example.co", "anon-key");
        (RestBackend::new(config, storage.clone()), storage)
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let (backend, _) = backend();
        assert_eq!(backend.bearer(), "Bearer anon-key");
    }

    #[test]
    fn test_token_persisted_in_storage() {
        let (backend, storage) = backend();
        backend.store_token(&AuthSession {
            user_id: "u1".to_string(),
            access_token: "jwt".to_string(),
        });
        assert!(storage.get_item(AUTH_TOKEN_KEY).is_some());
        assert_eq!(backend.bearer(), "Bearer jwt");

        backend.forget_token();
        assert!(storage.get_item(AUTH_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_current_session_without_token_skips_network() {
        let (backend, _) = backend();
        assert_eq!(backend.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_out_without_token_is_noop() {
        let (backend, _) = backend();
        assert!(backend.sign_out().await.is_ok());
    }

    #[tokio::test]
    async fn test_rejected_token_on_profile_read() {
        let url = serve_once("401 Unauthorized", r#"{"message":"JWT expired"}"#);
        let (backend, storage) = signed_in_backend(url);

        let err = backend.fetch_profile("u1").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(storage.get_item(AUTH_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_expired_token_invalidates_stale_session() {
        let url = serve_once("401 Unauthorized", r#"{"message":"JWT expired"}"#);
        let (backend, _) = signed_in_backend(url);
        let validator = SessionValidator::new(backend, Duration::from_secs(300));

        let hour = 60 * 60 * 1000;
        let record = SessionRecord::new("u1", Role::Admin, "s1", 0);
        let verdict = validator.validate(Some(&record), hour).await;
        assert_eq!(verdict, Validation::Invalid(InvalidReason::SessionExpired));
    }

    #[tokio::test]
    async fn test_server_error_is_not_unauthorized() {
        let url = serve_once("500 Internal Server Error", r#"{"message":"boom"}"#);
        let (backend, storage) = signed_in_backend(url);

        let err = backend.fetch_profile("u1").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert!(storage.get_item(AUTH_TOKEN_KEY).is_some());
    }

    #[test]
    fn test_unconfirmed_sign_up_is_reported() {
        let body = TokenResponse {
            access_token: None,
            user: Some(AuthUser { id: "u1".to_string() }),
        };
        let err = RestBackend::<MemoryStorage>::session_from(body).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
