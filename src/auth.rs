//! Identity service client.
//!
//! Thin REST client for an identitytoolkit-style endpoint: password sign-in,
//! sign-up, and anonymous sessions. The service is an opaque collaborator —
//! this client only maps its error codes onto our `AuthError` classes.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// An authenticated user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub anonymous: bool,
}

/// Identity service REST client.
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl AuthClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Sign in with an email/password pair.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let payload = self.post("accounts:signInWithPassword", &body).await?;
        let identity = parse_identity(&payload, false)?;
        info!(uid = %identity.uid, "User signed in");
        Ok(identity)
    }

    /// Create a new account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, AuthError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let payload = self.post("accounts:signUp", &body).await?;
        let identity = parse_identity(&payload, false)?;
        info!(uid = %identity.uid, "User signed up");
        Ok(identity)
    }

    /// Start an anonymous session.
    pub async fn sign_in_anonymous(&self) -> Result<UserIdentity, AuthError> {
        let body = serde_json::json!({ "returnSecureToken": true });
        let payload = self.post("accounts:signUp", &body).await?;
        let identity = parse_identity(&payload, true)?;
        info!(uid = %identity.uid, "Anonymous session started");
        Ok(identity)
    }

    async fn post(&self, method: &str, body: &Value) -> Result<Value, AuthError> {
        let url = format!(
            "{}/v1/{method}?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| AuthError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            let code = payload
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN")
                .to_string();
            warn!(status = status.as_u16(), code = %code, "Auth request rejected");
            return Err(map_error_code(status.as_u16(), &code));
        }

        Ok(payload)
    }
}

/// Map identity-service error codes onto typed errors.
fn map_error_code(status: u16, code: &str) -> AuthError {
    // Weak-password codes carry a detail suffix ("WEAK_PASSWORD : ...").
    let head = code.split(':').next().unwrap_or(code).trim();
    match head {
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" => AuthError::InvalidCredentials,
        "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
        "EMAIL_EXISTS" => AuthError::EmailTaken,
        "WEAK_PASSWORD" => {
            let detail = code
                .split_once(':')
                .map(|(_, d)| d.trim().to_string())
                .unwrap_or_else(|| "password rejected".to_string());
            AuthError::WeakPassword(detail)
        }
        _ => AuthError::Http {
            status,
            code: code.to_string(),
        },
    }
}

fn parse_identity(payload: &Value, anonymous: bool) -> Result<UserIdentity, AuthError> {
    let uid = payload
        .get("localId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::RequestFailed("missing localId in response".to_string()))?;
    let id_token = payload
        .get("idToken")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AuthError::RequestFailed("missing idToken in response".to_string()))?;

    Ok(UserIdentity {
        uid: uid.to_string(),
        email: payload
            .get("email")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from),
        id_token: id_token.to_string(),
        anonymous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_mapping() {
        assert!(matches!(
            map_error_code(400, "EMAIL_NOT_FOUND"),
            AuthError::UserNotFound
        ));
        assert!(matches!(
            map_error_code(400, "INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            map_error_code(400, "EMAIL_EXISTS"),
            AuthError::EmailTaken
        ));
        match map_error_code(400, "WEAK_PASSWORD : Password should be at least 6 characters") {
            AuthError::WeakPassword(detail) => {
                assert!(detail.contains("6 characters"));
            }
            other => panic!("expected WeakPassword, got {other:?}"),
        }
        assert!(matches!(
            map_error_code(500, "INTERNAL"),
            AuthError::Http { status: 500, .. }
        ));
    }

    #[test]
    fn parse_identity_with_email() {
        let payload = serde_json::json!({
            "localId": "u1",
            "email": "farmer@example.com",
            "idToken": "tok",
        });
        let identity = parse_identity(&payload, false).unwrap();
        assert_eq!(identity.uid, "u1");
        assert_eq!(identity.email.as_deref(), Some("farmer@example.com"));
        assert!(!identity.anonymous);
    }

    #[test]
    fn parse_identity_anonymous_has_no_email() {
        let payload = serde_json::json!({ "localId": "anon1", "idToken": "tok" });
        let identity = parse_identity(&payload, true).unwrap();
        assert!(identity.anonymous);
        assert!(identity.email.is_none());
    }
}
