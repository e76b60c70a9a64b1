use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Network failure or a non-success HTTP status. `url` is `None` when
    /// the HTTP client could not be set up and no request was made.
    #[error("{}", transport_message(.url.as_deref(), .message))]
    Transport {
        url: Option<String>,
        status: Option<u16>,
        message: String,
    },

    /// The body is not a feature collection we can decode.
    #[error("malformed feature collection: {0}")]
    MalformedPayload(String),

    #[error("unrecognized projection: {0}")]
    UnrecognizedProjection(String),

    #[error("invalid projection identifier: {0:?}")]
    InvalidProjectionIdentifier(String),
}

impl Error {
    pub(crate) fn transport(url: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Transport {
            url: Some(url.to_string()),
            status,
            message: message.into(),
        }
    }

    pub(crate) fn client(message: impl Into<String>) -> Self {
        Error::Transport {
            url: None,
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status of a failed request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

fn transport_message(url: Option<&str>, message: &str) -> String {
    match url {
        Some(url) => format!("request to {} failed: {}", url, message),
        None => format!("cannot set up HTTP client: {}", message),
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedPayload(err.to_string())
    }
}
