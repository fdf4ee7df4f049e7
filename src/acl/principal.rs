//! Principal parsing and formatting
//!
//! Principals travel over the wire with a type prefix (`User:alice`,
//! `RedpandaRole:ops`). The principal-group model keeps the type separately
//! and shows the bare name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of identity a principal refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum PrincipalType {
    #[default]
    User,

    /// Role-based principal; ACLs apply to every member of the role
    RedpandaRole,

    /// Prefix this client does not know about, preserved verbatim
    Other(String),
}

impl PrincipalType {
    pub fn as_str(&self) -> &str {
        match self {
            PrincipalType::User => "User",
            PrincipalType::RedpandaRole => "RedpandaRole",
            PrincipalType::Other(prefix) => prefix,
        }
    }
}

impl From<String> for PrincipalType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "User" => PrincipalType::User,
            "RedpandaRole" => PrincipalType::RedpandaRole,
            _ => PrincipalType::Other(value),
        }
    }
}

impl From<PrincipalType> for String {
    fn from(value: PrincipalType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a wire principal at its first `:`. A principal without a separator
/// is a user.
pub fn parse_principal(principal: &str) -> (PrincipalType, String) {
    match principal.split_once(':') {
        Some((prefix, name)) => (PrincipalType::from(prefix.to_string()), name.to_string()),
        None => (PrincipalType::User, principal.to_string()),
    }
}

/// Re-add the type prefix for the wire.
pub fn format_principal(principal_type: &PrincipalType, name: &str) -> String {
    format!("{}:{}", principal_type, name)
}
