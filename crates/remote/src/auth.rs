use api_types::auth::{Session, User};
use chrono::Utc;
use engine::{AuthChange, AuthEvent, AuthService, AuthSubscription, RemoteError};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{SupabaseClient, error};

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl From<TokenResponse> for Session {
    fn from(value: TokenResponse) -> Self {
        let expires_at = value
            .expires_at
            .or_else(|| value.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Self {
            access_token: value.access_token,
            refresh_token: value.refresh_token,
            expires_at,
            user: value.user,
        }
    }
}

impl SupabaseClient {
    /// Signs in with email and password and makes the session current.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, RemoteError> {
        let request = self
            .request(Method::POST, "auth/v1/token")?
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password });
        let res = self.send(request).await?;
        let session: Session = res.json::<TokenResponse>().await.map_err(error::decode)?.into();

        tracing::info!("signed in as {}", session.user.id);
        self.replace_session(Some(session.clone()));
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Ends the session. The local session is dropped even when the server
    /// call fails.
    pub async fn sign_out(&self) {
        if self.access_token().is_some() {
            let result = match self.request(Method::POST, "auth/v1/logout") {
                Ok(request) => self.send(request).await.map(drop),
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                tracing::warn!("sign out request failed: {err}");
            }
        }
        self.replace_session(None);
        self.emit(AuthEvent::SignedOut, None);
    }

    /// Asks the auth service who owns the current token.
    pub(crate) async fn fetch_user(&self) -> Result<Option<User>, RemoteError> {
        if self.access_token().is_none() {
            return Ok(None);
        }
        let request = self.request(Method::GET, "auth/v1/user")?;
        match self.send(request).await {
            Ok(res) => Ok(Some(res.json::<User>().await.map_err(error::decode)?)),
            Err(RemoteError::Unauthorized) => Ok(None),
            Err(RemoteError::Service { status, .. })
                if status == Some(StatusCode::FORBIDDEN.as_u16()) =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn emit(&self, event: AuthEvent, session: Option<Session>) {
        // Nobody listening is not an error.
        let _ = self.changes.send(AuthChange { event, session });
    }
}

impl AuthService for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, RemoteError> {
        Ok(self.current_session())
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        AuthSubscription::new(self.changes.subscribe())
    }
}
