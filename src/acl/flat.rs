//! Flat ACL entries and the resource-centric overview they are unpacked from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of resource an ACL applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// In a filter, matches any resource type
    Any,

    Topic,

    /// Consumer group
    #[serde(alias = "ConsumerGroup")]
    Group,

    Cluster,

    #[serde(rename = "TransactionalID", alias = "TransactionalId")]
    TransactionalId,

    DelegationToken,

    /// Anything this client does not understand
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Any => "Any",
            ResourceType::Topic => "Topic",
            ResourceType::Group => "Group",
            ResourceType::Cluster => "Cluster",
            ResourceType::TransactionalId => "TransactionalID",
            ResourceType::DelegationToken => "DelegationToken",
            ResourceType::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// How a resource name is matched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PatternType {
    /// In a filter, matches any pattern type
    Any,

    /// In a filter, matches every pattern that would apply to a literal name
    Match,

    #[default]
    Literal,

    Prefixed,

    #[serde(other)]
    Unknown,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternType::Any => "Any",
            PatternType::Match => "Match",
            PatternType::Literal => "Literal",
            PatternType::Prefixed => "Prefixed",
            PatternType::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Operation an ACL grants or denies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// In a filter, matches any operation
    Any,

    /// Every operation on the resource
    All,

    Read,
    Write,
    Create,
    Delete,
    Alter,
    Describe,
    ClusterAction,
    DescribeConfigs,
    AlterConfigs,
    IdempotentWrite,
    CreateTokens,
    DescribeTokens,

    #[serde(other)]
    Unknown,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Any => "Any",
            Operation::All => "All",
            Operation::Read => "Read",
            Operation::Write => "Write",
            Operation::Create => "Create",
            Operation::Delete => "Delete",
            Operation::Alter => "Alter",
            Operation::Describe => "Describe",
            Operation::ClusterAction => "ClusterAction",
            Operation::DescribeConfigs => "DescribeConfigs",
            Operation::AlterConfigs => "AlterConfigs",
            Operation::IdempotentWrite => "IdempotentWrite",
            Operation::CreateTokens => "CreateTokens",
            Operation::DescribeTokens => "DescribeTokens",
            Operation::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Whether an ACL grants or denies. `Any` doubles as "no opinion" in the
/// principal-group model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PermissionType {
    #[default]
    Any,
    Allow,
    Deny,
    #[serde(other)]
    Unknown,
}

impl PermissionType {
    /// Allow or Deny; the only values that are ever materialized as ACLs.
    pub fn is_decided(&self) -> bool {
        matches!(self, PermissionType::Allow | PermissionType::Deny)
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionType::Any => "Any",
            PermissionType::Allow => "Allow",
            PermissionType::Deny => "Deny",
            PermissionType::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// One ACL as the console API describes it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AclFlat {
    pub resource_type: ResourceType,
    pub resource_name: String,
    pub resource_pattern_type: PatternType,

    /// Prefixed principal, e.g. `User:alice`
    pub principal: String,
    pub host: String,
    pub operation: Operation,
    pub permission_type: PermissionType,
}

/// Rule part of an overview resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AclRuleOverview {
    pub principal: String,
    pub host: String,
    pub operation: Operation,
    pub permission_type: PermissionType,
}

/// A resource together with every rule attached to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AclResourceOverview {
    pub resource_type: ResourceType,
    pub resource_name: String,
    pub resource_pattern_type: PatternType,
    #[serde(default)]
    pub acls: Vec<AclRuleOverview>,
}

/// Response of `GET /api/acls`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AclOverview {
    #[serde(default)]
    pub acl_resources: Vec<AclResourceOverview>,
    #[serde(default)]
    pub is_authorizer_enabled: bool,
}

/// Unpack the nested overview into one flat entry per (resource, rule) pair.
pub fn flatten_overview(overview: Option<&AclOverview>) -> Vec<AclFlat> {
    let Some(overview) = overview else {
        return Vec::new();
    };

    overview
        .acl_resources
        .iter()
        .flat_map(|resource| {
            resource.acls.iter().map(move |rule| AclFlat {
                resource_type: resource.resource_type,
                resource_name: resource.resource_name.clone(),
                resource_pattern_type: resource.resource_pattern_type,
                principal: rule.principal.clone(),
                host: rule.host.clone(),
                operation: rule.operation,
                permission_type: rule.permission_type,
            })
        })
        .collect()
}
