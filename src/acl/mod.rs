//! Access Control List (ACL) Model
//!
//! Conversions between the flat ACLs the console API speaks and the
//! principal groups operators edit: flattening the resource overview,
//! grouping by principal and host, and unpacking edited groups back into
//! creatable ACLs.

pub mod flat;
pub mod group;
pub mod principal;
pub mod unpack;
pub mod view;

pub use flat::{
    flatten_overview, AclFlat, AclOverview, AclResourceOverview, AclRuleOverview, Operation,
    PatternType, PermissionType, ResourceType,
};
pub use group::{
    group_principals, AclCategory, ClusterAcl, PrincipalGroup, ResourceAcl, ANY_HOST,
    CLUSTER_OPERATIONS, CONSUMER_GROUP_OPERATIONS, TOPIC_OPERATIONS,
    TRANSACTIONAL_ID_OPERATIONS, WILDCARD_SELECTOR,
};
pub use principal::{format_principal, parse_principal, PrincipalType};
pub use unpack::{unpack_principal_group, unpack_with_cluster_name, CLUSTER_RESOURCE_NAME};
pub use view::PrincipalGroupsView;
