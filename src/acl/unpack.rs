//! Principal group → flat ACLs
//!
//! Only decided permissions (Allow/Deny) are materialized. A decided `all`
//! shortcut replaces every per-operation entry of its selector.

use super::flat::{AclFlat, Operation, PatternType, PermissionType};
use super::group::{AclCategory, PrincipalGroup};

use std::collections::BTreeMap;

/// Resource name every cluster ACL is stored under
pub const CLUSTER_RESOURCE_NAME: &str = "kafka-cluster";

/// Expand an edited principal group into the flat ACLs that represent it.
pub fn unpack_principal_group(group: &PrincipalGroup) -> Vec<AclFlat> {
    unpack_with_cluster_name(group, CLUSTER_RESOURCE_NAME)
}

/// Same as [`unpack_principal_group`] for clusters that store cluster ACLs
/// under a different resource name.
pub fn unpack_with_cluster_name(group: &PrincipalGroup, cluster_resource_name: &str) -> Vec<AclFlat> {
    let principal = group.principal();
    let mut flat = Vec::new();

    for category in AclCategory::SELECTOR_BASED {
        for acl in group.selector_acls(category) {
            if acl.selector.is_empty() {
                continue;
            }
            emit(
                &mut flat,
                &Target {
                    category,
                    resource_name: &acl.selector,
                    pattern_type: acl.pattern_type,
                    principal: &principal,
                    host: &group.host,
                },
                acl.all,
                &acl.permissions,
            );
        }
    }

    emit(
        &mut flat,
        &Target {
            category: AclCategory::Cluster,
            resource_name: cluster_resource_name,
            pattern_type: PatternType::Literal,
            principal: &principal,
            host: &group.host,
        },
        group.cluster_acls.all,
        &group.cluster_acls.permissions,
    );

    flat
}

struct Target<'a> {
    category: AclCategory,
    resource_name: &'a str,
    pattern_type: PatternType,
    principal: &'a str,
    host: &'a str,
}

impl Target<'_> {
    fn entry(&self, operation: Operation, permission_type: PermissionType) -> AclFlat {
        AclFlat {
            resource_type: self.category.resource_type(),
            resource_name: self.resource_name.to_string(),
            resource_pattern_type: self.pattern_type,
            principal: self.principal.to_string(),
            host: self.host.to_string(),
            operation,
            permission_type,
        }
    }
}

fn emit(
    out: &mut Vec<AclFlat>,
    target: &Target<'_>,
    all: PermissionType,
    permissions: &BTreeMap<Operation, PermissionType>,
) {
    if all.is_decided() {
        out.push(target.entry(Operation::All, all));
        return;
    }

    // Keys outside the category's operation set never reach the wire
    let operations = target.category.operations();
    for (operation, permission) in permissions {
        if permission.is_decided() && operations.contains(operation) {
            out.push(target.entry(*operation, *permission));
        }
    }
}
