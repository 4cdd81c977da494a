use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::application::ports::identity_provider::{
    Identity, IdentityProvider, ProviderError, Session, codes,
};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1/";

/// Email/password identity backend spoken to over its REST API
/// (`accounts:signUp`, `accounts:signInWithPassword`, `accounts:update`).
///
/// The signed-in session lives in this process only; signing out just
/// forgets it.
pub struct IdentityToolkitClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    session: RwLock<Option<ToolkitSession>>,
}

struct ToolkitSession {
    user_id: String,
    email: String,
    id_token: SecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordReq<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileReq<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityToolkitClient {
    pub fn new(mut base_url: Url, api_key: SecretString) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client: Client::new(),
            base_url,
            api_key,
            session: RwLock::new(None),
        }
    }

    fn endpoint(&self, method: &str) -> Result<Url, ProviderError> {
        let mut url = self
            .base_url
            .join(&format!("./accounts:{}", method))
            .map_err(|e| ProviderError::new(codes::INTERNAL_ERROR, e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .post(self.endpoint(method)?)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::new(codes::NETWORK_REQUEST_FAILED, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::new(codes::NETWORK_REQUEST_FAILED, e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|r| r.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            tracing::warn!(status = %status, method, message = %message, "Identity backend rejected request");
            return Err(provider_error_from_message(&message));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(method, error = %e, "Failed to parse identity backend response");
            ProviderError::new(codes::INTERNAL_ERROR, format!("malformed response: {}", e))
        })
    }

    fn start_session(&self, auth: AuthResponse, fallback_email: &str) -> Identity {
        let email = auth
            .email
            .unwrap_or_else(|| fallback_email.to_lowercase());
        let identity = Identity {
            user_id: auth.local_id.clone(),
            email: email.clone(),
            display_name: auth.display_name,
        };
        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(ToolkitSession {
            user_id: auth.local_id,
            email,
            id_token: SecretString::new(auth.id_token.into()),
        });
        identity
    }

    fn id_token_for(&self, user_id: &str) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.id_token.expose_secret().to_string())
    }
}

/// Maps a backend error message such as `EMAIL_EXISTS` or
/// `WEAK_PASSWORD : Password should be at least 6 characters` to a provider
/// code in the `auth/` namespace.
pub fn provider_error_from_message(message: &str) -> ProviderError {
    let (reason, detail) = match message.split_once(" : ") {
        Some((reason, detail)) => (reason.trim(), detail.trim()),
        None => (message.trim(), message.trim()),
    };

    let code = match reason {
        "EMAIL_EXISTS" => codes::EMAIL_ALREADY_IN_USE.to_string(),
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
            codes::INVALID_CREDENTIAL.to_string()
        }
        "WEAK_PASSWORD" => codes::WEAK_PASSWORD.to_string(),
        "INVALID_EMAIL" => codes::INVALID_EMAIL.to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => codes::TOO_MANY_REQUESTS.to_string(),
        "USER_DISABLED" => codes::USER_DISABLED.to_string(),
        other => format!("auth/{}", other.to_lowercase().replace('_', "-")),
    };

    ProviderError {
        code,
        message: detail.to_string(),
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitClient {
    async fn register(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let body = PasswordReq {
            email,
            password,
            return_secure_token: true,
        };
        let auth: AuthResponse = self.call("signUp", &body).await?;
        Ok(self.start_session(auth, email))
    }

    async fn set_display_name(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<(), ProviderError> {
        let id_token = self.id_token_for(&identity.user_id).ok_or_else(|| {
            ProviderError::new(codes::NO_CURRENT_USER, "no session for this identity")
        })?;
        let body = UpdateProfileReq {
            id_token: &id_token,
            display_name: name,
            return_secure_token: false,
        };
        let _: serde_json::Value = self.call("update", &body).await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let body = PasswordReq {
            email,
            password,
            return_secure_token: true,
        };
        let auth: AuthResponse = self.call("signInWithPassword", &body).await?;
        Ok(self.start_session(auth, email))
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| Session {
                user_id: s.user_id.clone(),
                email: s.email.clone(),
            })
    }
}
