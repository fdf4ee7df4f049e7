use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::traits::{AclFilter, ConsoleBackend};
use super::users::{validate_username, CreateUserRequest};
use crate::acl::{
    flatten_overview, unpack_with_cluster_name, AclFlat, PrincipalGroup, PrincipalGroupsView,
};
use crate::config::AclConfig;
use crate::error::{ConsoleError, Result};

/// Everything the ACL pages show, fetched in one refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSnapshot {
    pub authorizer_enabled: bool,
    pub acls: Vec<AclFlat>,
    pub groups: Vec<PrincipalGroup>,
    pub service_accounts: Vec<String>,
    pub roles: Vec<String>,

    /// Non-fatal problems hit while refreshing, e.g. an unreachable users endpoint
    pub warnings: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl ConsoleSnapshot {
    pub fn find_group(&self, principal: &str, host: &str) -> Option<&PrincipalGroup> {
        self.groups.iter().find(|g| g.matches(principal, host))
    }
}

/// Outcome of committing one principal group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub principal: String,
    pub host: String,
    pub deleted: usize,
    pub created: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Load, edit and commit principal groups against a console backend
pub struct AclEditor {
    backend: Arc<dyn ConsoleBackend>,
    config: AclConfig,
    view: PrincipalGroupsView,
}

impl AclEditor {
    pub fn new(backend: Arc<dyn ConsoleBackend>, config: AclConfig) -> Self {
        Self {
            backend,
            config,
            view: PrincipalGroupsView::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ConsoleBackend> {
        &self.backend
    }

    /// Refresh ACLs, service accounts and roles concurrently. Only the ACL
    /// fetch is required; the other two degrade to warnings.
    pub async fn load(&mut self) -> Result<ConsoleSnapshot> {
        let (acls, accounts, roles) = tokio::join!(
            self.backend.list_acls(),
            self.backend.list_service_accounts(),
            self.backend.list_roles(),
        );

        let overview = acls?;
        let mut warnings = Vec::new();

        let service_accounts = match accounts {
            Ok(accounts) => Some(accounts),
            Err(e) => {
                warn!("Failed to list service accounts: {}", e);
                warnings.push(format!("Service accounts unavailable: {}", e));
                None
            }
        };

        let roles = roles.unwrap_or_else(|e| {
            warn!("Failed to list roles: {}", e);
            warnings.push(format!("Roles unavailable: {}", e));
            Vec::new()
        });

        let acls = flatten_overview(Some(&overview));
        let groups = self
            .view
            .groups(&acls, service_accounts.as_deref())
            .to_vec();

        debug!(
            "Loaded {} ACLs into {} principal groups",
            acls.len(),
            groups.len()
        );

        Ok(ConsoleSnapshot {
            authorizer_enabled: overview.is_authorizer_enabled,
            acls,
            groups,
            service_accounts: service_accounts.unwrap_or_default(),
            roles,
            warnings,
            fetched_at: Utc::now(),
        })
    }

    /// Commit an edited group: delete every ACL of the original
    /// `(principal, host)` and of the edited one, then create the unpacked
    /// entries. Create failures are counted, not fatal.
    pub async fn save_group(
        &self,
        original: Option<&PrincipalGroup>,
        edited: &PrincipalGroup,
    ) -> Result<SaveReport> {
        let started_at = Utc::now();
        let principal = edited.principal();

        let to_create = unpack_with_cluster_name(edited, &self.config.cluster_resource_name);
        if to_create.is_empty() {
            return Err(ConsoleError::EmptyAclSet {
                principal,
                host: edited.host.clone(),
            });
        }

        info!(
            "Saving principal group {} (host {}) with {} ACLs",
            principal,
            edited.host,
            to_create.len()
        );

        let mut deleted = 0;
        if let Some(original) = original {
            if !original.matches(&principal, &edited.host) {
                deleted += self.delete_all(&original.principal(), &original.host).await?;
            }
        }
        deleted += self.delete_all(&principal, &edited.host).await?;

        let (created, errors) = self.create_all(&to_create).await;
        let report = SaveReport {
            principal,
            host: edited.host.clone(),
            deleted,
            created,
            failed: errors.len(),
            errors,
            started_at,
            completed_at: Utc::now(),
        };

        if report.is_success() {
            info!(
                "Saved {} ACLs for {} (replaced {})",
                report.created, report.principal, report.deleted
            );
        } else {
            warn!(
                "{} of {} ACLs failed to be created for {}",
                report.failed,
                to_create.len(),
                report.principal
            );
        }

        Ok(report)
    }

    /// Delete every ACL of a group
    pub async fn delete_group(&self, group: &PrincipalGroup) -> Result<usize> {
        let principal = group.principal();
        info!("Deleting principal group {} (host {})", principal, group.host);
        self.delete_all(&principal, &group.host).await
    }

    pub async fn create_service_account(&self, request: &CreateUserRequest) -> Result<()> {
        request.validate()?;
        info!("Creating service account: {}", request.username);
        self.backend.create_service_account(request).await
    }

    pub async fn delete_service_account(&self, username: &str) -> Result<()> {
        validate_username(username)?;
        info!("Deleting service account: {}", username);
        self.backend.delete_service_account(username).await
    }

    async fn delete_all(&self, principal: &str, host: &str) -> Result<usize> {
        let filter = AclFilter::for_principal(principal, host);
        let removed = self.backend.delete_acls(&filter).await?;
        debug!("Removed {} ACLs of {} on host {}", removed.len(), principal, host);
        Ok(removed.len())
    }

    /// Issue every create concurrently, bounded by `max_concurrent_requests`,
    /// and collect all outcomes.
    async fn create_all(&self, acls: &[AclFlat]) -> (usize, Vec<String>) {
        let semaphore = Semaphore::new(self.config.max_concurrent_requests.max(1));
        let backend = &self.backend;
        let semaphore = &semaphore;

        let tasks = acls.iter().map(|acl| async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|e| ConsoleError::Network(e.to_string()))?;
            backend.create_acl(acl).await
        });

        let results = join_all(tasks).await;
        let mut created = 0;
        let mut errors = Vec::new();

        for (acl, result) in acls.iter().zip(results) {
            match result {
                Ok(()) => created += 1,
                Err(e) => errors.push(format!(
                    "{} {} on {} '{}': {}",
                    acl.permission_type, acl.operation, acl.resource_type, acl.resource_name, e
                )),
            }
        }

        (created, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{
        AclCategory, AclOverview, AclResourceOverview, AclRuleOverview, Operation, PatternType,
        PermissionType, PrincipalType, ResourceAcl, ResourceType,
    };
    use async_trait::async_trait;
    use std::collections::HashSet;
    use tokio::sync::RwLock;

    /// In-memory console backend
    #[derive(Default)]
    struct TestBackend {
        acls: RwLock<Vec<AclFlat>>,
        users: RwLock<Vec<String>>,
        reject_operations: HashSet<Operation>,
        users_unavailable: bool,
    }

    #[async_trait]
    impl ConsoleBackend for TestBackend {
        async fn list_acls(&self) -> Result<AclOverview> {
            let acls = self.acls.read().await;
            Ok(AclOverview {
                acl_resources: acls
                    .iter()
                    .map(|a| AclResourceOverview {
                        resource_type: a.resource_type,
                        resource_name: a.resource_name.clone(),
                        resource_pattern_type: a.resource_pattern_type,
                        acls: vec![AclRuleOverview {
                            principal: a.principal.clone(),
                            host: a.host.clone(),
                            operation: a.operation,
                            permission_type: a.permission_type,
                        }],
                    })
                    .collect(),
                is_authorizer_enabled: true,
            })
        }

        async fn create_acl(&self, acl: &AclFlat) -> Result<()> {
            if self.reject_operations.contains(&acl.operation) {
                return Err(ConsoleError::Api {
                    status: 400,
                    message: format!("operation {} rejected", acl.operation),
                });
            }
            self.acls.write().await.push(acl.clone());
            Ok(())
        }

        async fn delete_acls(&self, filter: &AclFilter) -> Result<Vec<AclFlat>> {
            let mut acls = self.acls.write().await;
            let (removed, kept): (Vec<AclFlat>, Vec<AclFlat>) =
                acls.drain(..).partition(|a| filter.matches(a));
            *acls = kept;
            Ok(removed)
        }

        async fn list_service_accounts(&self) -> Result<Vec<String>> {
            if self.users_unavailable {
                return Err(ConsoleError::Network("connection refused".to_string()));
            }
            Ok(self.users.read().await.clone())
        }

        async fn create_service_account(&self, request: &CreateUserRequest) -> Result<()> {
            self.users.write().await.push(request.username.clone());
            Ok(())
        }

        async fn delete_service_account(&self, username: &str) -> Result<()> {
            self.users.write().await.retain(|u| u != username);
            Ok(())
        }

        async fn list_roles(&self) -> Result<Vec<String>> {
            Ok(vec!["ops".to_string()])
        }
    }

    fn flat(principal: &str, name: &str, operation: Operation, permission: PermissionType) -> AclFlat {
        AclFlat {
            resource_type: ResourceType::Topic,
            resource_name: name.to_string(),
            resource_pattern_type: PatternType::Literal,
            principal: principal.to_string(),
            host: "*".to_string(),
            operation,
            permission_type: permission,
        }
    }

    fn editor(backend: TestBackend) -> (Arc<TestBackend>, AclEditor) {
        let backend = Arc::new(backend);
        let editor = AclEditor::new(backend.clone(), AclConfig::default());
        (backend, editor)
    }

    #[tokio::test]
    async fn test_load_groups_and_backfills() {
        let backend = TestBackend::default();
        *backend.acls.write().await = vec![flat("User:alice", "orders", Operation::Read, PermissionType::Allow)];
        *backend.users.write().await = vec!["alice".to_string(), "bob".to_string()];
        let (_, mut editor) = editor(backend);

        let snapshot = editor.load().await.unwrap();
        assert!(snapshot.authorizer_enabled);
        assert_eq!(snapshot.acls.len(), 1);
        assert_eq!(snapshot.groups.len(), 2);
        assert_eq!(snapshot.roles, vec!["ops".to_string()]);
        assert!(snapshot.warnings.is_empty());
        assert!(snapshot.find_group("User:bob", "*").is_some());
    }

    #[tokio::test]
    async fn test_load_survives_missing_service_accounts() {
        let backend = TestBackend {
            users_unavailable: true,
            ..TestBackend::default()
        };
        *backend.acls.write().await = vec![flat("User:alice", "orders", Operation::Read, PermissionType::Allow)];
        let (_, mut editor) = editor(backend);

        let snapshot = editor.load().await.unwrap();
        assert_eq!(snapshot.groups.len(), 1);
        assert!(snapshot.service_accounts.is_empty());
        assert_eq!(snapshot.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_acls() {
        let backend = TestBackend::default();
        *backend.acls.write().await = vec![
            flat("User:alice", "orders", Operation::Read, PermissionType::Allow),
            flat("User:alice", "orders", Operation::Write, PermissionType::Allow),
            flat("User:bob", "orders", Operation::Read, PermissionType::Allow),
        ];
        let (backend, mut editor) = editor(backend);

        let snapshot = editor.load().await.unwrap();
        let original = snapshot.find_group("User:alice", "*").unwrap().clone();

        let mut edited = original.clone();
        edited.topic_acls[0].permissions.insert(Operation::Write, PermissionType::Any);
        edited.topic_acls[0].permissions.insert(Operation::Describe, PermissionType::Deny);

        let report = editor.save_group(Some(&original), &edited).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.deleted, 2);
        assert_eq!(report.created, 2);

        let stored = backend.acls.read().await.clone();
        assert_eq!(stored.len(), 3);
        assert!(stored.contains(&flat("User:bob", "orders", Operation::Read, PermissionType::Allow)));
        assert!(stored.contains(&flat("User:alice", "orders", Operation::Read, PermissionType::Allow)));
        assert!(stored.contains(&flat("User:alice", "orders", Operation::Describe, PermissionType::Deny)));
    }

    #[tokio::test]
    async fn test_save_rejects_empty_group_before_any_call() {
        let backend = TestBackend::default();
        *backend.acls.write().await = vec![flat("User:alice", "orders", Operation::Read, PermissionType::Allow)];
        let (backend, editor) = editor(backend);

        let edited = PrincipalGroup::empty(PrincipalType::User, "alice", "*");
        let result = editor.save_group(None, &edited).await;
        assert!(matches!(result, Err(ConsoleError::EmptyAclSet { .. })));
        assert_eq!(backend.acls.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_save_keeps_existing_acls_when_only_foreign_operations_are_set() {
        let backend = TestBackend::default();
        *backend.acls.write().await = vec![flat("User:alice", "orders", Operation::Read, PermissionType::Allow)];
        let (backend, editor) = editor(backend);

        let edited: PrincipalGroup = serde_json::from_value(serde_json::json!({
            "principalType": "User",
            "principalName": "alice",
            "host": "*",
            "topicAcls": [{
                "patternType": "Literal",
                "selector": "orders",
                "permissions": {"Any": "Allow", "ClusterAction": "Deny", "Fly": "Allow"}
            }],
            "clusterAcls": {"permissions": {"Read": "Allow"}}
        }))
        .unwrap();

        let result = editor.save_group(None, &edited).await;
        assert!(matches!(result, Err(ConsoleError::EmptyAclSet { .. })));
        assert_eq!(
            *backend.acls.read().await,
            vec![flat("User:alice", "orders", Operation::Read, PermissionType::Allow)]
        );
    }

    #[tokio::test]
    async fn test_save_counts_partial_failures() {
        let mut reject = HashSet::new();
        reject.insert(Operation::Write);
        let (backend, editor) = editor(TestBackend {
            reject_operations: reject,
            ..TestBackend::default()
        });

        let mut edited = PrincipalGroup::empty(PrincipalType::User, "carol", "*");
        let mut topic = ResourceAcl::wildcard(AclCategory::Topic);
        topic.selector = "payments".to_string();
        topic.permissions.insert(Operation::Read, PermissionType::Allow);
        topic.permissions.insert(Operation::Write, PermissionType::Allow);
        edited.topic_acls = vec![topic];

        let report = editor.save_group(None, &edited).await.unwrap();
        assert!(!report.is_success());
        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);
        assert!(report.errors[0].contains("rejected"));
        assert_eq!(backend.acls.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_save_renamed_principal_clears_both() {
        let backend = TestBackend::default();
        *backend.acls.write().await = vec![
            flat("User:alice", "orders", Operation::Read, PermissionType::Allow),
            flat("User:alice2", "legacy", Operation::Read, PermissionType::Allow),
        ];
        let (backend, mut editor) = editor(backend);

        let snapshot = editor.load().await.unwrap();
        let original = snapshot.find_group("User:alice", "*").unwrap().clone();
        let mut edited = original.clone();
        edited.principal_name = "alice2".to_string();

        let report = editor.save_group(Some(&original), &edited).await.unwrap();
        assert_eq!(report.deleted, 2);
        assert_eq!(
            *backend.acls.read().await,
            vec![flat("User:alice2", "orders", Operation::Read, PermissionType::Allow)]
        );
    }

    #[tokio::test]
    async fn test_delete_group_and_service_accounts() {
        let backend = TestBackend::default();
        *backend.acls.write().await = vec![
            flat("User:alice", "orders", Operation::Read, PermissionType::Allow),
            flat("User:alice", "audit", Operation::Read, PermissionType::Allow),
        ];
        let (backend, mut editor) = editor(backend);

        let snapshot = editor.load().await.unwrap();
        let group = snapshot.find_group("User:alice", "*").unwrap().clone();
        assert_eq!(editor.delete_group(&group).await.unwrap(), 2);
        assert!(backend.acls.read().await.is_empty());

        let request = CreateUserRequest::new("dave", "secret-pass", Default::default()).unwrap();
        editor.create_service_account(&request).await.unwrap();
        assert_eq!(*backend.users.read().await, vec!["dave".to_string()]);

        assert!(matches!(
            editor.delete_service_account("bad name").await,
            Err(ConsoleError::Validation(_))
        ));
        editor.delete_service_account("dave").await.unwrap();
        assert!(backend.users.read().await.is_empty());
    }
}
