use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::users::CreateUserRequest;
use crate::acl::{AclFlat, AclOverview, Operation, PatternType, PermissionType, ResourceType};
use crate::error::Result;

/// Filter for deleting ACLs. `None` fields match anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclFilter {
    pub resource_type: ResourceType,
    pub resource_name: Option<String>,
    pub resource_pattern_type: PatternType,
    pub principal: Option<String>,
    pub host: Option<String>,
    pub operation: Operation,
    pub permission_type: PermissionType,
}

impl AclFilter {
    /// Every ACL of one wire principal on one host
    pub fn for_principal(principal: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            resource_type: ResourceType::Any,
            resource_name: None,
            resource_pattern_type: PatternType::Any,
            principal: Some(principal.into()),
            host: Some(host.into()),
            operation: Operation::Any,
            permission_type: PermissionType::Any,
        }
    }

    /// Query parameters in a stable order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("resourceType", self.resource_type.to_string()),
            ("resourcePatternType", self.resource_pattern_type.to_string()),
            ("operation", self.operation.to_string()),
            ("permissionType", self.permission_type.to_string()),
        ];
        if let Some(name) = &self.resource_name {
            pairs.push(("resourceName", name.clone()));
        }
        if let Some(principal) = &self.principal {
            pairs.push(("principal", principal.clone()));
        }
        if let Some(host) = &self.host {
            pairs.push(("host", host.clone()));
        }
        pairs
    }

    pub fn matches(&self, acl: &AclFlat) -> bool {
        (self.resource_type == ResourceType::Any || self.resource_type == acl.resource_type)
            && self.resource_name.as_ref().map_or(true, |n| *n == acl.resource_name)
            && (self.resource_pattern_type == PatternType::Any
                || self.resource_pattern_type == acl.resource_pattern_type)
            && self.principal.as_ref().map_or(true, |p| *p == acl.principal)
            && self.host.as_ref().map_or(true, |h| *h == acl.host)
            && (self.operation == Operation::Any || self.operation == acl.operation)
            && (self.permission_type == PermissionType::Any
                || self.permission_type == acl.permission_type)
    }
}

/// Operations the console backend exposes for ACL and service-account
/// management
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    /// Resource-centric overview of every ACL
    async fn list_acls(&self) -> Result<AclOverview>;

    async fn create_acl(&self, acl: &AclFlat) -> Result<()>;

    /// Delete every ACL matching the filter, returning what was deleted
    async fn delete_acls(&self, filter: &AclFilter) -> Result<Vec<AclFlat>>;

    async fn list_service_accounts(&self) -> Result<Vec<String>>;

    async fn create_service_account(&self, request: &CreateUserRequest) -> Result<()>;

    async fn delete_service_account(&self, username: &str) -> Result<()>;

    async fn list_roles(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acl(principal: &str, host: &str) -> AclFlat {
        AclFlat {
            resource_type: ResourceType::Topic,
            resource_name: "orders".to_string(),
            resource_pattern_type: PatternType::Literal,
            principal: principal.to_string(),
            host: host.to_string(),
            operation: Operation::Read,
            permission_type: PermissionType::Allow,
        }
    }

    #[test]
    fn test_principal_filter_matching() {
        let filter = AclFilter::for_principal("User:alice", "*");
        assert!(filter.matches(&acl("User:alice", "*")));
        assert!(!filter.matches(&acl("User:alice", "10.0.0.1")));
        assert!(!filter.matches(&acl("User:bob", "*")));
    }

    #[test]
    fn test_query_pairs() {
        let filter = AclFilter::for_principal("User:alice", "*");
        let pairs = filter.query_pairs();
        assert_eq!(pairs[0], ("resourceType", "Any".to_string()));
        assert!(pairs.contains(&("principal", "User:alice".to_string())));
        assert!(pairs.contains(&("host", "*".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "resourceName"));
    }
}
