//! Principal Groups
//!
//! Re-shapes flat ACLs into one editable group per `(principal, host)`,
//! with resource entries bucketed by category and keyed by
//! `(patternType, resourceName)`.

use super::flat::{AclFlat, Operation, PatternType, PermissionType, ResourceType};
use super::principal::{format_principal, parse_principal, PrincipalType};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Selector that matches every resource of a category
pub const WILDCARD_SELECTOR: &str = "*";

/// Host that matches every client address
pub const ANY_HOST: &str = "*";

pub const TOPIC_OPERATIONS: &[Operation] = &[
    Operation::Alter,
    Operation::AlterConfigs,
    Operation::Create,
    Operation::Delete,
    Operation::Describe,
    Operation::DescribeConfigs,
    Operation::Read,
    Operation::Write,
];

pub const CONSUMER_GROUP_OPERATIONS: &[Operation] =
    &[Operation::Delete, Operation::Describe, Operation::Read];

pub const TRANSACTIONAL_ID_OPERATIONS: &[Operation] = &[Operation::Describe, Operation::Write];

pub const CLUSTER_OPERATIONS: &[Operation] = &[
    Operation::Alter,
    Operation::AlterConfigs,
    Operation::ClusterAction,
    Operation::Create,
    Operation::Describe,
    Operation::DescribeConfigs,
    Operation::IdempotentWrite,
];

/// Bucket a resource ACL is shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclCategory {
    Topic,
    ConsumerGroup,
    TransactionalId,
    Cluster,
}

impl AclCategory {
    /// Categories addressed by a selector, in display order
    pub const SELECTOR_BASED: [AclCategory; 3] = [
        AclCategory::Topic,
        AclCategory::ConsumerGroup,
        AclCategory::TransactionalId,
    ];

    pub fn from_resource_type(resource_type: ResourceType) -> Option<Self> {
        match resource_type {
            ResourceType::Topic => Some(AclCategory::Topic),
            ResourceType::Group => Some(AclCategory::ConsumerGroup),
            ResourceType::TransactionalId => Some(AclCategory::TransactionalId),
            ResourceType::Cluster => Some(AclCategory::Cluster),
            ResourceType::Any
            | ResourceType::DelegationToken
            | ResourceType::Unknown => None,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            AclCategory::Topic => ResourceType::Topic,
            AclCategory::ConsumerGroup => ResourceType::Group,
            AclCategory::TransactionalId => ResourceType::TransactionalId,
            AclCategory::Cluster => ResourceType::Cluster,
        }
    }

    /// Fixed set of operations the category exposes
    pub fn operations(&self) -> &'static [Operation] {
        match self {
            AclCategory::Topic => TOPIC_OPERATIONS,
            AclCategory::ConsumerGroup => CONSUMER_GROUP_OPERATIONS,
            AclCategory::TransactionalId => TRANSACTIONAL_ID_OPERATIONS,
            AclCategory::Cluster => CLUSTER_OPERATIONS,
        }
    }
}

/// Permissions for one selector of a topic, consumer group or transactional id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAcl {
    pub pattern_type: PatternType,
    pub selector: String,

    /// Shortcut for every operation; dominates `permissions` when decided
    #[serde(default)]
    pub all: PermissionType,

    #[serde(default)]
    pub permissions: BTreeMap<Operation, PermissionType>,
}

impl ResourceAcl {
    /// Literal `*` selector with every permission left at `Any`
    pub fn wildcard(category: AclCategory) -> Self {
        Self {
            pattern_type: PatternType::Literal,
            selector: WILDCARD_SELECTOR.to_string(),
            all: PermissionType::Any,
            permissions: undecided_permissions(category.operations()),
        }
    }

    pub fn permission(&self, operation: Operation) -> PermissionType {
        self.permissions
            .get(&operation)
            .copied()
            .unwrap_or(PermissionType::Any)
    }
}

/// Cluster-wide permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAcl {
    #[serde(default)]
    pub all: PermissionType,

    #[serde(default)]
    pub permissions: BTreeMap<Operation, PermissionType>,
}

impl ClusterAcl {
    pub fn permission(&self, operation: Operation) -> PermissionType {
        self.permissions
            .get(&operation)
            .copied()
            .unwrap_or(PermissionType::Any)
    }
}

impl Default for ClusterAcl {
    fn default() -> Self {
        Self {
            all: PermissionType::Any,
            permissions: undecided_permissions(CLUSTER_OPERATIONS),
        }
    }
}

/// Every ACL of one `(principal, host)` pair, shaped for editing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalGroup {
    pub principal_type: PrincipalType,

    /// Bare name, without the type prefix
    pub principal_name: String,
    pub host: String,

    #[serde(default)]
    pub topic_acls: Vec<ResourceAcl>,
    #[serde(default)]
    pub consumer_group_acls: Vec<ResourceAcl>,
    #[serde(default)]
    pub transactional_id_acls: Vec<ResourceAcl>,
    #[serde(default)]
    pub cluster_acls: ClusterAcl,

    /// Flat entries this group was derived from
    #[serde(default)]
    pub source_entries: Vec<AclFlat>,
}

impl PrincipalGroup {
    /// Group with a wildcard entry per selector-based category and nothing
    /// decided. Used for principals that have no ACLs yet.
    pub fn empty(principal_type: PrincipalType, principal_name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            principal_type,
            principal_name: principal_name.into(),
            host: host.into(),
            topic_acls: vec![ResourceAcl::wildcard(AclCategory::Topic)],
            consumer_group_acls: vec![ResourceAcl::wildcard(AclCategory::ConsumerGroup)],
            transactional_id_acls: vec![ResourceAcl::wildcard(AclCategory::TransactionalId)],
            cluster_acls: ClusterAcl::default(),
            source_entries: Vec::new(),
        }
    }

    /// Wire form of the principal, e.g. `User:alice`
    pub fn principal(&self) -> String {
        format_principal(&self.principal_type, &self.principal_name)
    }

    pub fn selector_acls(&self, category: AclCategory) -> &[ResourceAcl] {
        match category {
            AclCategory::Topic => &self.topic_acls,
            AclCategory::ConsumerGroup => &self.consumer_group_acls,
            AclCategory::TransactionalId => &self.transactional_id_acls,
            AclCategory::Cluster => &[],
        }
    }

    fn selector_acls_mut(&mut self, category: AclCategory) -> Option<&mut Vec<ResourceAcl>> {
        match category {
            AclCategory::Topic => Some(&mut self.topic_acls),
            AclCategory::ConsumerGroup => Some(&mut self.consumer_group_acls),
            AclCategory::TransactionalId => Some(&mut self.transactional_id_acls),
            AclCategory::Cluster => None,
        }
    }

    pub fn matches(&self, principal: &str, host: &str) -> bool {
        self.principal() == principal && self.host == host
    }
}

/// Group flat ACLs by `(principal, host)` and append an empty group for
/// every known service account that has no ACLs.
pub fn group_principals(acls: &[AclFlat], service_accounts: Option<&[String]>) -> Vec<PrincipalGroup> {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut by_key: HashMap<(&str, &str), Vec<&AclFlat>> = HashMap::new();

    for acl in acls {
        let key = (acl.principal.as_str(), acl.host.as_str());
        by_key
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(acl);
    }

    let mut groups: Vec<PrincipalGroup> = order
        .into_iter()
        .map(|key| {
            let entries = by_key.remove(&key).unwrap_or_default();
            build_group(key.0, key.1, &entries)
        })
        .collect();

    for account in service_accounts.unwrap_or_default() {
        let represented = groups
            .iter()
            .any(|g| g.principal_type == PrincipalType::User && &g.principal_name == account);
        if !represented {
            groups.push(PrincipalGroup::empty(PrincipalType::User, account.clone(), ANY_HOST));
        }
    }

    groups
}

fn build_group(principal: &str, host: &str, entries: &[&AclFlat]) -> PrincipalGroup {
    let (principal_type, principal_name) = parse_principal(principal);

    let mut group = PrincipalGroup {
        principal_type,
        principal_name,
        host: host.to_string(),
        topic_acls: Vec::new(),
        consumer_group_acls: Vec::new(),
        transactional_id_acls: Vec::new(),
        cluster_acls: ClusterAcl::default(),
        source_entries: entries.iter().map(|e| (*e).clone()).collect(),
    };

    let mut cluster_entries: Vec<&AclFlat> = Vec::new();
    let mut buckets: HashMap<AclCategory, Vec<&AclFlat>> = HashMap::new();

    for entry in entries.iter().copied() {
        match AclCategory::from_resource_type(entry.resource_type) {
            Some(AclCategory::Cluster) => cluster_entries.push(entry),
            Some(category) => buckets.entry(category).or_default().push(entry),
            None => {}
        }
    }

    for category in AclCategory::SELECTOR_BASED {
        let Some(bucket) = buckets.get(&category) else {
            continue;
        };
        if let Some(target) = group.selector_acls_mut(category) {
            *target = build_resource_acls(category, bucket);
        }
    }

    if !cluster_entries.is_empty() {
        let (all, permissions) = consolidate(CLUSTER_OPERATIONS, &cluster_entries);
        group.cluster_acls = ClusterAcl { all, permissions };
    }

    group
}

fn build_resource_acls(category: AclCategory, entries: &[&AclFlat]) -> Vec<ResourceAcl> {
    let mut order: Vec<(PatternType, &str)> = Vec::new();
    let mut by_selector: HashMap<(PatternType, &str), Vec<&AclFlat>> = HashMap::new();

    for entry in entries.iter().copied() {
        let key = (entry.resource_pattern_type, entry.resource_name.as_str());
        by_selector
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(entry);
    }

    order
        .into_iter()
        .map(|key| {
            let selector_entries = by_selector.remove(&key).unwrap_or_default();
            let (all, permissions) = consolidate(category.operations(), &selector_entries);
            ResourceAcl {
                pattern_type: key.0,
                selector: key.1.to_string(),
                all,
                permissions,
            }
        })
        .collect()
}

/// Derive the `all` shortcut and per-operation permissions of one selector.
/// `All` and individual grants are read independently and never reconciled.
fn consolidate(
    operations: &[Operation],
    entries: &[&AclFlat],
) -> (PermissionType, BTreeMap<Operation, PermissionType>) {
    let all = entries
        .iter()
        .find(|e| e.operation == Operation::All)
        .map(|e| decided_or_any(e.permission_type))
        .unwrap_or_default();

    let permissions = operations
        .iter()
        .map(|op| {
            let permission = entries
                .iter()
                .find(|e| e.operation == *op)
                .map(|e| decided_or_any(e.permission_type))
                .unwrap_or_default();
            (*op, permission)
        })
        .collect();

    (all, permissions)
}

fn decided_or_any(permission: PermissionType) -> PermissionType {
    if permission.is_decided() {
        permission
    } else {
        PermissionType::Any
    }
}

fn undecided_permissions(operations: &[Operation]) -> BTreeMap<Operation, PermissionType> {
    operations.iter().map(|op| (*op, PermissionType::Any)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flat(
        resource_type: ResourceType,
        name: &str,
        principal: &str,
        operation: Operation,
        permission: PermissionType,
    ) -> AclFlat {
        AclFlat {
            resource_type,
            resource_name: name.to_string(),
            resource_pattern_type: PatternType::Literal,
            principal: principal.to_string(),
            host: "*".to_string(),
            operation,
            permission_type: permission,
        }
    }

    #[test]
    fn test_single_topic_read() {
        let acls = vec![flat(
            ResourceType::Topic,
            "orders",
            "User:alice",
            Operation::Read,
            PermissionType::Allow,
        )];

        let groups = group_principals(&acls, None);
        assert_eq!(groups.len(), 1);

        let group = &groups[0];
        assert_eq!(group.principal_type, PrincipalType::User);
        assert_eq!(group.principal_name, "alice");
        assert_eq!(group.host, "*");
        assert_eq!(group.topic_acls.len(), 1);

        let topic = &group.topic_acls[0];
        assert_eq!(topic.selector, "orders");
        assert_eq!(topic.pattern_type, PatternType::Literal);
        assert_eq!(topic.all, PermissionType::Any);
        assert_eq!(topic.permissions.len(), TOPIC_OPERATIONS.len());
        for op in TOPIC_OPERATIONS {
            let expected = if *op == Operation::Read {
                PermissionType::Allow
            } else {
                PermissionType::Any
            };
            assert_eq!(topic.permission(*op), expected, "operation {}", op);
        }

        assert!(group.consumer_group_acls.is_empty());
        assert!(group.transactional_id_acls.is_empty());
        assert_eq!(group.cluster_acls, ClusterAcl::default());
        assert_eq!(group.source_entries, acls);
    }

    #[test]
    fn test_grouping_key_is_principal_and_host() {
        let mut other_host = flat(ResourceType::Topic, "t", "User:alice", Operation::Read, PermissionType::Allow);
        other_host.host = "10.0.0.1".to_string();

        let acls = vec![
            flat(ResourceType::Topic, "t", "User:alice", Operation::Read, PermissionType::Allow),
            other_host,
            flat(ResourceType::Topic, "t", "User:bob", Operation::Read, PermissionType::Allow),
            flat(ResourceType::Topic, "u", "User:alice", Operation::Write, PermissionType::Deny),
        ];

        let groups = group_principals(&acls, None);
        let keys: Vec<(String, String)> = groups
            .iter()
            .map(|g| (g.principal_name.clone(), g.host.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("alice".to_string(), "*".to_string()),
                ("alice".to_string(), "10.0.0.1".to_string()),
                ("bob".to_string(), "*".to_string()),
            ]
        );
        assert_eq!(groups[0].topic_acls.len(), 2);
        assert_eq!(groups[0].source_entries.len(), 2);
    }

    #[test]
    fn test_selector_key_includes_pattern_type() {
        let mut prefixed = flat(ResourceType::Topic, "orders", "User:a", Operation::Write, PermissionType::Allow);
        prefixed.resource_pattern_type = PatternType::Prefixed;
        let acls = vec![
            flat(ResourceType::Topic, "orders", "User:a", Operation::Read, PermissionType::Allow),
            prefixed,
            flat(ResourceType::Topic, "orders", "User:a", Operation::Describe, PermissionType::Deny),
        ];

        let groups = group_principals(&acls, None);
        let topics = &groups[0].topic_acls;
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].pattern_type, PatternType::Literal);
        assert_eq!(topics[0].permission(Operation::Read), PermissionType::Allow);
        assert_eq!(topics[0].permission(Operation::Describe), PermissionType::Deny);
        assert_eq!(topics[1].pattern_type, PatternType::Prefixed);
        assert_eq!(topics[1].permission(Operation::Write), PermissionType::Allow);
    }

    #[test]
    fn test_all_operation_sets_shortcut() {
        let acls = vec![
            flat(ResourceType::Group, "g", "User:a", Operation::All, PermissionType::Deny),
            flat(ResourceType::Group, "g", "User:a", Operation::Read, PermissionType::Allow),
        ];

        let groups = group_principals(&acls, None);
        let group_acl = &groups[0].consumer_group_acls[0];
        assert_eq!(group_acl.all, PermissionType::Deny);
        // Individual grants are read as stored, even when they disagree with All
        assert_eq!(group_acl.permission(Operation::Read), PermissionType::Allow);
        assert_eq!(group_acl.permission(Operation::Delete), PermissionType::Any);
    }

    #[test]
    fn test_buckets_by_resource_type() {
        let acls = vec![
            flat(ResourceType::Topic, "t", "User:a", Operation::Read, PermissionType::Allow),
            flat(ResourceType::Group, "g", "User:a", Operation::Read, PermissionType::Allow),
            flat(ResourceType::TransactionalId, "tx", "User:a", Operation::Write, PermissionType::Allow),
            flat(ResourceType::Cluster, "kafka-cluster", "User:a", Operation::IdempotentWrite, PermissionType::Allow),
            flat(ResourceType::DelegationToken, "tok", "User:a", Operation::Describe, PermissionType::Allow),
        ];

        let groups = group_principals(&acls, None);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.topic_acls.len(), 1);
        assert_eq!(group.consumer_group_acls.len(), 1);
        assert_eq!(group.transactional_id_acls.len(), 1);
        assert_eq!(group.transactional_id_acls[0].permissions.len(), 2);
        assert_eq!(
            group.cluster_acls.permission(Operation::IdempotentWrite),
            PermissionType::Allow
        );
        // Unrecognized resource types never reach a bucket but stay in the source
        assert_eq!(group.source_entries.len(), 5);
    }

    #[test]
    fn test_cluster_entries_merge() {
        let acls = vec![
            flat(ResourceType::Cluster, "kafka-cluster", "User:a", Operation::Describe, PermissionType::Allow),
            flat(ResourceType::Cluster, "kafka-cluster", "User:a", Operation::Alter, PermissionType::Deny),
            flat(ResourceType::Cluster, "kafka-cluster", "User:a", Operation::All, PermissionType::Allow),
        ];
        let groups = group_principals(&acls, None);
        let cluster = &groups[0].cluster_acls;
        assert_eq!(cluster.all, PermissionType::Allow);
        assert_eq!(cluster.permission(Operation::Describe), PermissionType::Allow);
        assert_eq!(cluster.permission(Operation::Alter), PermissionType::Deny);
        assert_eq!(cluster.permission(Operation::ClusterAction), PermissionType::Any);
    }

    #[test]
    fn test_role_principal() {
        let acls = vec![flat(
            ResourceType::Topic,
            "t",
            "RedpandaRole:ops",
            Operation::Read,
            PermissionType::Allow,
        )];
        let groups = group_principals(&acls, None);
        let group = &groups[0];
        assert_eq!(group.principal_type, PrincipalType::RedpandaRole);
        assert_eq!(group.principal_name, "ops");
        assert_eq!(group.principal(), "RedpandaRole:ops");
    }

    #[test]
    fn test_service_account_backfill() {
        let acls = vec![
            flat(ResourceType::Topic, "t", "User:alice", Operation::Read, PermissionType::Allow),
            flat(ResourceType::Topic, "t", "RedpandaRole:carol", Operation::Read, PermissionType::Allow),
        ];
        let accounts = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];

        let groups = group_principals(&acls, Some(accounts.as_slice()));
        let names: Vec<(&PrincipalType, &str)> = groups
            .iter()
            .map(|g| (&g.principal_type, g.principal_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                (&PrincipalType::User, "alice"),
                (&PrincipalType::RedpandaRole, "carol"),
                (&PrincipalType::User, "bob"),
                (&PrincipalType::User, "carol"),
            ]
        );

        let bob = &groups[2];
        assert_eq!(bob.host, "*");
        assert!(bob.source_entries.is_empty());
        assert_eq!(bob.topic_acls, vec![ResourceAcl::wildcard(AclCategory::Topic)]);
        assert_eq!(
            bob.consumer_group_acls,
            vec![ResourceAcl::wildcard(AclCategory::ConsumerGroup)]
        );
        assert_eq!(
            bob.transactional_id_acls,
            vec![ResourceAcl::wildcard(AclCategory::TransactionalId)]
        );
        assert_eq!(bob.cluster_acls, ClusterAcl::default());
        assert!(bob.topic_acls[0]
            .permissions
            .values()
            .all(|p| *p == PermissionType::Any));
    }

    #[test]
    fn test_duplicate_service_accounts_backfill_once() {
        let accounts = vec!["bob".to_string(), "bob".to_string()];
        let groups = group_principals(&[], Some(accounts.as_slice()));
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_principals(&[], None).is_empty());
        assert!(group_principals(&[], Some(Vec::<String>::new().as_slice())).is_empty());
    }

    #[test]
    fn test_principal_group_json_shape() {
        let group = PrincipalGroup::empty(PrincipalType::User, "alice", "*");
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["principalType"], "User");
        assert_eq!(value["principalName"], "alice");
        assert_eq!(value["topicAcls"][0]["selector"], "*");
        assert_eq!(value["topicAcls"][0]["patternType"], "Literal");
        assert_eq!(value["topicAcls"][0]["permissions"]["Read"], "Any");
        assert_eq!(value["clusterAcls"]["all"], "Any");

        let decoded: PrincipalGroup = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, group);
    }
}
