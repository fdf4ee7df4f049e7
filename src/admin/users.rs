//! Service account requests and the checks run before they are sent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConsoleError, Result};

pub const MAX_USERNAME_LENGTH: usize = 128;
pub const MIN_PASSWORD_LENGTH: usize = 4;
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// SASL/SCRAM mechanism the credential is stored for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScramMechanism {
    #[default]
    #[serde(rename = "SCRAM-SHA-256")]
    ScramSha256,
    #[serde(rename = "SCRAM-SHA-512")]
    ScramSha512,
}

impl FromStr for ScramMechanism {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SCRAM-SHA-256" => Ok(ScramMechanism::ScramSha256),
            "SCRAM-SHA-512" => Ok(ScramMechanism::ScramSha512),
            _ => Err(format!(
                "Invalid mechanism: {}. Valid mechanisms: SCRAM-SHA-256, SCRAM-SHA-512",
                s
            )),
        }
    }
}

impl fmt::Display for ScramMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScramMechanism::ScramSha256 => write!(f, "SCRAM-SHA-256"),
            ScramMechanism::ScramSha512 => write!(f, "SCRAM-SHA-512"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub mechanism: ScramMechanism,
}

impl CreateUserRequest {
    /// Build a request, rejecting it locally if the server would.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        mechanism: ScramMechanism,
    ) -> Result<Self> {
        let request = Self {
            username: username.into(),
            password: password.into(),
            mechanism,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_password(&self.password)
    }
}

pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(ConsoleError::Validation(
            "Username cannot be empty".to_string(),
        ));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ConsoleError::Validation(format!(
            "Username cannot exceed {} characters",
            MAX_USERNAME_LENGTH
        )));
    }

    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-')))
    {
        return Err(ConsoleError::Validation(format!(
            "Username contains invalid character '{}'; allowed are letters, digits and . _ @ -",
            c
        )));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(ConsoleError::Validation(format!(
            "Password must be between {} and {} characters",
            MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("svc.billing-01@prod_eu").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("colon:name").is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LENGTH)).is_ok());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("abc").is_err());
        assert!(validate_password("abcd").is_ok());
        assert!(validate_password(&"p".repeat(64)).is_ok());
        assert!(validate_password(&"p".repeat(65)).is_err());
    }

    #[test]
    fn test_create_request_validation() {
        assert!(CreateUserRequest::new("alice", "secret", ScramMechanism::default()).is_ok());
        assert!(matches!(
            CreateUserRequest::new("alice", "no", ScramMechanism::ScramSha512),
            Err(ConsoleError::Validation(_))
        ));
    }

    #[test]
    fn test_mechanism_parsing_and_wire_format() {
        assert_eq!(
            "scram-sha-512".parse::<ScramMechanism>().unwrap(),
            ScramMechanism::ScramSha512
        );
        assert!("PLAIN".parse::<ScramMechanism>().is_err());

        let request = CreateUserRequest::new("alice", "secret", ScramMechanism::ScramSha256).unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["mechanism"], "SCRAM-SHA-256");
    }
}
