use std::fmt;

// Fatal bootstrap failures. The core never retries these; a restart is required.
#[derive(Debug)]
pub enum InitError {
    IdentityUnavailable(String),
    SessionCreationFailed(String),
    AlreadyBootstrapped,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::IdentityUnavailable(reason) => write!(f, "identity unavailable: {reason}"),
            InitError::SessionCreationFailed(reason) => {
                write!(f, "session creation failed: {reason}")
            }
            InitError::AlreadyBootstrapped => write!(f, "bootstrap already ran"),
        }
    }
}

impl std::error::Error for InitError {}

// History could not be loaded; bootstrap continues with an inline notice.
#[derive(Debug)]
pub struct HistoryLoadFailed(pub String);

impl fmt::Display for HistoryLoadFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "history load failed: {}", self.0)
    }
}

impl std::error::Error for HistoryLoadFailed {}

// A single message exchange failed in transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailed(pub String);

impl fmt::Display for SendFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "send failed: {}", self.0)
    }
}

impl std::error::Error for SendFailed {}

// Every reservation attempt in the budget failed.
#[derive(Debug)]
pub struct ExhaustedRetries {
    pub attempts: u32,
    pub last_error: String,
}

impl fmt::Display for ExhaustedRetries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reservations unavailable after {} attempts: {}",
            self.attempts, self.last_error
        )
    }
}

impl std::error::Error for ExhaustedRetries {}
