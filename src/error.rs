use thiserror::Error;

/// Failures talking to the setlist/playlist backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced a usable HTTP response.
    #[error("network error: {0}")]
    Transport(String),
    /// The backend answered without a success indicator.
    #[error("{0}")]
    Rejected(String),
    #[error("login required: {0}")]
    Unauthorized(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl BackendError {
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            BackendError::Transport(_) => {
                "Couldn't reach the server. Check your connection and try again.".to_string()
            }
            BackendError::Rejected(msg) if !msg.trim().is_empty() => msg.clone(),
            BackendError::Unauthorized(_) => "Login required. Log in again and retry.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The flow reported success but the backend still has no session.
    #[error("login required")]
    LoginRequired,
    #[error("authorization failed: {0}")]
    Denied(String),
    #[error("authorization window closed before completing")]
    Abandoned,
    #[error("timed out waiting for authorization")]
    TimedOut,
    #[error("could not open authorization window: {0}")]
    Surface(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::LoginRequired => "Login required. Log in again and retry.".to_string(),
            AuthError::Denied(msg) => format!("Login failed: {msg}"),
            AuthError::Abandoned | AuthError::TimedOut => "Login was not completed.".to_string(),
            AuthError::Surface(msg) => format!("Couldn't open the login page: {msg}"),
            AuthError::Backend(e) => e.user_message(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("no songs selected")]
    NothingSelected,
}

impl ExportError {
    pub fn user_message(&self) -> String {
        match self {
            ExportError::Auth(e) => e.user_message(),
            ExportError::Backend(BackendError::Rejected(msg)) if msg.trim().is_empty() => {
                "Couldn't create the playlist.".to_string()
            }
            ExportError::Backend(e) => e.user_message(),
            ExportError::NothingSelected => "Select at least one song.".to_string(),
        }
    }
}
