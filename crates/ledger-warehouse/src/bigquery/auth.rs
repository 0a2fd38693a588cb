//! Access tokens for the BigQuery REST API.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LoadError, Result};

/// Default OAuth token endpoint for user credentials.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Supplies bearer tokens for API calls.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Result<String>;
}

/// A fixed, externally obtained access token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct CredentialsKind {
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Deserialize)]
struct AuthorizedUser {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'static str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Credentials loaded from a `GOOGLE_APPLICATION_CREDENTIALS` JSON file.
///
/// Only `authorized_user` files (as written by `gcloud auth
/// application-default login`) are understood; their refresh token is
/// exchanged for an access token, cached until shortly before expiry.
pub struct CredentialsFile {
    path: PathBuf,
    user: AuthorizedUser,
    client: Client,
    cache: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for CredentialsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsFile")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CredentialsFile {
    /// Read and check a credentials file.
    pub fn load(path: &Path, client: Client) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoadError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        let user = parse_authorized_user(&text)
            .map_err(|e| annotate_credentials_error(e, path))?;
        debug!(path = %path.display(), "loaded user credentials");
        Ok(Self {
            path: path.to_path_buf(),
            user,
            client,
            cache: Mutex::new(None),
        })
    }

    fn refresh(&self) -> Result<CachedToken> {
        let url = self.user.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URL);
        let response = self
            .client
            .post(url)
            .json(&RefreshRequest {
                client_id: &self.user.client_id,
                client_secret: &self.user.client_secret,
                refresh_token: &self.user.refresh_token,
                grant_type: "refresh_token",
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            // 5xx from the token endpoint is transient; the rest is a bad credential
            if status.is_server_error() {
                return Err(LoadError::from_response(status.as_u16(), &body));
            }
            return Err(LoadError::Credentials(format!(
                "token refresh rejected (HTTP {}): {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let token: TokenResponse = response.json()?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        debug!(expires_in = lifetime.as_secs(), "refreshed access token");
        Ok(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

impl TokenSource for CredentialsFile {
    fn access_token(&self) -> Result<String> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref().filter(|c| c.expires_at > Instant::now()) {
            return Ok(cached.token.clone());
        }
        let fresh = self.refresh()?;
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }
}

fn parse_authorized_user(text: &str) -> Result<AuthorizedUser> {
    let kind: CredentialsKind = serde_json::from_str(text)
        .map_err(|e| LoadError::Credentials(format!("not a credentials file: {e}")))?;
    if kind.kind != "authorized_user" {
        return Err(LoadError::UnsupportedCredentials {
            kind: if kind.kind.is_empty() {
                "<missing>".to_string()
            } else {
                kind.kind
            },
        });
    }
    serde_json::from_str(text)
        .map_err(|e| LoadError::Credentials(format!("incomplete user credentials: {e}")))
}

fn annotate_credentials_error(err: LoadError, path: &Path) -> LoadError {
    match err {
        LoadError::Credentials(message) => {
            LoadError::Credentials(format!("{}: {message}", path.display()))
        }
        other => other,
    }
}
