use std::fmt;

use common::lookup::LookupError;
use reqwest::StatusCode;

/// Failure of a single request to the card database.
#[derive(Debug)]
pub enum RequestError {
    NotFound,
    Status(StatusCode, Option<String>),
    Http(reqwest::Error),
    InvalidUrl(String),
}

impl RequestError {
    /// Convert into the lookup error for the card identified by `what`.
    #[must_use]
    pub fn into_lookup_error(self, what: &str) -> LookupError {
        match self {
            Self::NotFound => LookupError::NotFound(what.to_owned()),
            other => LookupError::Transport(other.to_string()),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not found"),
            Self::Status(status, Some(details)) => write!(f, "{status}: {details}"),
            Self::Status(status, None) => write!(f, "{status}"),
            Self::Http(err) => write!(f, "{err}"),
            Self::InvalidUrl(url) => write!(f, "Invalid URL: \"{url}\""),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_errors() {
        assert_eq!(
            RequestError::NotFound.into_lookup_error("Black Lotus"),
            LookupError::NotFound("Black Lotus".to_owned())
        );
        assert_eq!(
            RequestError::Status(StatusCode::TOO_MANY_REQUESTS, Some("Slow down".to_owned()))
                .into_lookup_error("Black Lotus"),
            LookupError::Transport("429 Too Many Requests: Slow down".to_owned())
        );
    }
}
