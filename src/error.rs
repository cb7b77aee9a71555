use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classification reported in `ScrapingResult::error_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    /// Login-stage classification. Reserved; the login flow reports
    /// `General` today.
    #[serde(rename = "LoginError")]
    Login,
    /// The post-login redirect never arrived, or connectivity was lost
    /// while waiting for it.
    #[serde(rename = "NetworkError")]
    Network,
    /// Everything else: discovery, fetch, or an unexpected failure
    /// mid-scrape.
    #[serde(rename = "GeneralError")]
    General,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Login => "LoginError",
            ErrorType::Network => "NetworkError",
            ErrorType::General => "GeneralError",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified scrape failure. Stages produce these at their boundary;
/// the orchestrator turns them into the error-shaped `ScrapingResult`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScrapeError {
    pub kind: ErrorType,
    pub message: String,
}

impl ScrapeError {
    pub fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn login(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Login, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Network, message)
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorType::General, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_serializes_under_wire_names() {
        assert_eq!(
            serde_json::to_string(&ErrorType::Login).unwrap(),
            "\"LoginError\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorType::Network).unwrap(),
            "\"NetworkError\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorType::General).unwrap(),
            "\"GeneralError\""
        );
    }

    #[test]
    fn scrape_error_displays_message_only() {
        let err = ScrapeError::general("account discovery failed");
        assert_eq!(err.to_string(), "account discovery failed");
        assert_eq!(err.kind, ErrorType::General);
    }
}
