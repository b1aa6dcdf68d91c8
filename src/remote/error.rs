//! Remote resolution errors.

use thiserror::Error;

use crate::types::Host;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{host}: {message}")]
    Configuration { host: Host, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("local file error: {0}")]
    Local(String),
}

// Local file reads report through anyhow
impl From<anyhow::Error> for RemoteError {
    fn from(err: anyhow::Error) -> Self {
        RemoteError::Local(format!("{:#}", err))
    }
}

impl RemoteError {
    pub fn missing_token(host: Host, enterprise: bool) -> Self {
        let which = if enterprise { "enterprise" } else { "public" };
        RemoteError::Configuration {
            host,
            message: format!(
                "no {which} access token configured; run `gitup config set-token {host}{}`",
                if enterprise { " --enterprise" } else { "" }
            ),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, RemoteError::Configuration { .. })
    }
}
