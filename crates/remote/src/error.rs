use engine::RemoteError;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while constructing a [`SupabaseClient`].
///
///  [`SupabaseClient`]: crate::SupabaseClient
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid base_url: {0}")]
    InvalidUrl(String),
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Union of the error shapes returned by the REST and auth endpoints.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    code: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        [&self.message, &self.msg, &self.error_description, &self.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
            .cloned()
    }

    fn code(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::String(code) => Some(code.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

pub(crate) fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

pub(crate) fn decode(err: reqwest::Error) -> RemoteError {
    RemoteError::Decode(err.to_string())
}

/// Turns a non-success response into a [`RemoteError`].
pub(crate) async fn from_response(res: Response) -> RemoteError {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    from_parts(status, &text)
}

pub(crate) fn from_parts(status: StatusCode, text: &str) -> RemoteError {
    if status == StatusCode::UNAUTHORIZED {
        return RemoteError::Unauthorized;
    }

    let body: ErrorBody = serde_json::from_str(text).unwrap_or_default();
    let message = body.message().unwrap_or_else(|| text.trim().to_string());
    RemoteError::Service {
        status: Some(status.as_u16()),
        code: body.code(),
        message,
    }
}
