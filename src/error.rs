use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Status(u16),
    Decode(serde_json::Error),
    Protocol(String),
    UnknownField(String),
    NotReady,
    InvalidMode(String),
    Config(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Status(code) => write!(f, "unexpected HTTP status: {code}"),
            Error::Decode(e) => write!(f, "JSON decode error: {e}"),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::UnknownField(name) => write!(f, "unknown parameter: {name}"),
            Error::NotReady => write!(f, "parameters not fetched yet"),
            Error::InvalidMode(mode) => write!(f, "invalid mode: {mode}"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    /// True for failures that happened before or while talking to the device
    /// (unreachable, timeout, bad status).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Status(_))
    }

    /// True when the device answered but the reply could not be understood.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::Protocol(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
