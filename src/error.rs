use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid HTTP request: {0}")]
    HttpRequest(#[from] hyper::http::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Console API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Principal group {principal} (host {host}) has no ACLs to create")]
    EmptyAclSet { principal: String, host: String },
}

impl ConsoleError {
    /// True for failures that came back from the console API rather than from
    /// this process.
    pub fn is_server_side(&self) -> bool {
        matches!(
            self,
            ConsoleError::Api { .. }
                | ConsoleError::AuthenticationFailed(_)
                | ConsoleError::AuthorizationFailed(_)
                | ConsoleError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_is_shown_as_is() {
        let err = ConsoleError::Api {
            status: 400,
            message: "principal must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Console API error (400): principal must not be empty"
        );
        assert!(err.is_server_side());
    }

    #[test]
    fn test_local_errors_are_not_server_side() {
        assert!(!ConsoleError::Validation("bad".to_string()).is_server_side());
        assert!(!ConsoleError::Timeout("slow".to_string()).is_server_side());
        let empty = ConsoleError::EmptyAclSet {
            principal: "User:alice".to_string(),
            host: "*".to_string(),
        };
        assert!(!empty.is_server_side());
        assert!(empty.to_string().contains("User:alice"));
    }
}
