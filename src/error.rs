use crate::lifecycle::ApprovalState;
use crate::models::UserType;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the marketplace
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {}", message.as_deref().unwrap_or("no details"))]
    Server { status: u16, message: Option<String> },

    #[error("{0}")]
    Validation(String),

    #[error("invalid reservation transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ApprovalState,
        to: ApprovalState,
    },

    #[error("not logged in")]
    NotLoggedIn,

    #[error("this view requires a {expected} account")]
    WrongRole { expected: UserType },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Text to show the user: the server's own message when it sent one,
    /// local validation text as is, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Server {
                message: Some(message),
                ..
            } => message.clone(),
            Error::Validation(message) => message.clone(),
            Error::InvalidTransition { .. } | Error::NotLoggedIn | Error::WrongRole { .. } => {
                self.to_string()
            }
            _ => fallback.to_string(),
        }
    }
}
