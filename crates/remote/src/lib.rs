//! HTTP client for a Supabase-compatible backend.
//!
//! Auth calls go to `/auth/v1/*`, table calls to `/rest/v1/*`. The client is
//! cheap to clone: clones share the signed-in session and the change channel.

use std::sync::{Arc, RwLock};

use api_types::auth::Session;
use engine::{AuthChange, RemoteError};
use reqwest::{
    Method, RequestBuilder, Response, Url,
    header::{HeaderMap, HeaderValue},
};
use tokio::sync::broadcast;

pub use error::BuildError;

mod auth;
mod error;
mod tables;

const AUTH_CHANGES_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
    session: Arc<RwLock<Option<Session>>>,
    changes: broadcast::Sender<AuthChange>,
}

impl SupabaseClient {
    /// Builds a client for the project at `base_url` using its public API key.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, BuildError> {
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base_url =
            Url::parse(&normalized).map_err(|err| BuildError::InvalidUrl(err.to_string()))?;

        let mut key = HeaderValue::from_str(api_key).map_err(|_| BuildError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        let (changes, _) = broadcast::channel(AUTH_CHANGES_CAPACITY);

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            http,
            session: Arc::new(RwLock::new(None)),
            changes,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn current_session(&self) -> Option<Session> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace_session(&self, session: Option<Session>) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    fn access_token(&self) -> Option<String> {
        self.current_session().map(|session| session.access_token)
    }

    /// Starts a request to `path`, authenticated with the session token when
    /// signed in and with the API key otherwise.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| RemoteError::Transport(format!("invalid endpoint {path}: {err}")))?;
        let token = self.access_token().unwrap_or_else(|| self.api_key.clone());
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Sends the request and maps non-success statuses to [`RemoteError`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let res = request.send().await.map_err(error::transport)?;
        tracing::debug!("{} {}", res.status(), res.url().path());
        if res.status().is_success() {
            return Ok(res);
        }
        Err(error::from_response(res).await)
    }
}
