use std::fmt;
use std::sync::Arc;

/// Errors raised by the configuration and file-storage layers.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Json(err) => write!(f, "json error: {err}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

/// Failure of a session `get`, shared verbatim by every caller joined to the
/// epoch in which it happened.
///
/// Collaborator errors are held behind an `Arc` so a single failure can be
/// handed to any number of waiters without being cloned or translated.
#[derive(Debug)]
pub enum SessionError<SE, RE> {
    /// Storage has never been populated.
    NoStoredData,
    /// The refresh credential itself is expired; re-authentication is required.
    RefreshExpired,
    Storage(Arc<SE>),
    Refresher(Arc<RE>),
    /// The epoch was cancelled, either by the calling task or by the task
    /// that started the epoch this call joined.
    Cancelled,
}

impl<SE, RE> SessionError<SE, RE> {
    pub(crate) fn storage(err: SE) -> Self {
        SessionError::Storage(Arc::new(err))
    }

    pub(crate) fn refresher(err: RE) -> Self {
        SessionError::Refresher(Arc::new(err))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }

    /// True for failures no amount of retrying will fix.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, SessionError::NoStoredData | SessionError::RefreshExpired)
    }
}

impl<SE, RE> Clone for SessionError<SE, RE> {
    fn clone(&self) -> Self {
        match self {
            SessionError::NoStoredData => SessionError::NoStoredData,
            SessionError::RefreshExpired => SessionError::RefreshExpired,
            SessionError::Storage(err) => SessionError::Storage(Arc::clone(err)),
            SessionError::Refresher(err) => SessionError::Refresher(Arc::clone(err)),
            SessionError::Cancelled => SessionError::Cancelled,
        }
    }
}

impl<SE: fmt::Display, RE: fmt::Display> fmt::Display for SessionError<SE, RE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoStoredData => write!(f, "no token pair has been stored"),
            SessionError::RefreshExpired => write!(f, "refresh token is expired"),
            SessionError::Storage(err) => write!(f, "storage error: {err}"),
            SessionError::Refresher(err) => write!(f, "refresher error: {err}"),
            SessionError::Cancelled => write!(f, "session operation cancelled"),
        }
    }
}

impl<SE, RE> std::error::Error for SessionError<SE, RE>
where
    SE: std::error::Error + 'static,
    RE: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Storage(err) => Some(err.as_ref()),
            SessionError::Refresher(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
