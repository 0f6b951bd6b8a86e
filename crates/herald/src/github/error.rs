//! Error types for notifications API operations.

use thiserror::Error;

/// Errors that can occur when talking to the notifications API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request never produced a response (connect failure, timeout).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The body of a 2xx response could not be decoded.
    #[error("JSON error (status {status}): {source}")]
    Json {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// Refused to send credentials to a host other than the API root.
    #[error("refusing to send credentials to {0}")]
    UntrustedUrl(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GitHubError {
    /// HTTP status of the failed exchange, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } | GitHubError::Json { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the credentials were rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, GitHubError::Api { status: 401 | 403, .. })
    }
}

/// Get a short error message suitable for logs and run summaries.
pub fn short_error_message(err: &GitHubError) -> String {
    match err {
        GitHubError::Http(message) => {
            let first = message.lines().next().unwrap_or(message);
            format!("Network error: {first}")
        }
        GitHubError::Api { status, message } => {
            if message.chars().count() > 50 {
                let truncated: String = message.chars().take(47).collect();
                format!("HTTP {}: {}...", status, truncated)
            } else if message.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, message)
            }
        }
        GitHubError::Json { .. } => "JSON parse error".to_string(),
        GitHubError::UntrustedUrl(url) => format!("Untrusted URL: {url}"),
        GitHubError::Config(msg) => format!("Config: {msg}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<Vec<u8>>("{").expect_err("invalid json")
    }

    #[test]
    fn test_status_is_known_only_when_a_response_arrived() {
        let api = GitHubError::Api {
            status: 401,
            message: "Bad credentials".to_string(),
        };
        assert_eq!(api.status(), Some(401));
        assert!(api.is_auth_error());

        let json = GitHubError::Json {
            status: 200,
            source: json_error(),
        };
        assert_eq!(json.status(), Some(200));
        assert!(!json.is_auth_error());

        assert_eq!(GitHubError::Http("timed out".to_string()).status(), None);
    }

    #[test]
    fn test_short_error_message() {
        let err = GitHubError::Api {
            status: 404,
            message: String::new(),
        };
        assert_eq!(short_error_message(&err), "HTTP 404");

        let err = GitHubError::Api {
            status: 500,
            message: "x".repeat(80),
        };
        let short = short_error_message(&err);
        assert!(short.starts_with("HTTP 500: xxx"));
        assert!(short.ends_with("..."));

        let err = GitHubError::Http("connect failed\ncaused by: refused".to_string());
        assert_eq!(short_error_message(&err), "Network error: connect failed");

        let err = GitHubError::Json {
            status: 200,
            source: json_error(),
        };
        assert_eq!(short_error_message(&err), "JSON parse error");
    }
}
