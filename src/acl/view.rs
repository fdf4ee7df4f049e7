//! Memoized principal-group view
//!
//! Groups are derived state: they are recomputed only when the flat ACL list
//! or the service-account list differs from the inputs of the last
//! computation.

use super::flat::AclFlat;
use super::group::{group_principals, PrincipalGroup};

use tracing::debug;

#[derive(Debug, Default)]
pub struct PrincipalGroupsView {
    acls: Vec<AclFlat>,
    service_accounts: Option<Vec<String>>,
    groups: Vec<PrincipalGroup>,
    computed: bool,
    recomputations: u64,
}

impl PrincipalGroupsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups for the given inputs, reusing the previous result when the
    /// inputs are unchanged.
    pub fn groups(&mut self, acls: &[AclFlat], service_accounts: Option<&[String]>) -> &[PrincipalGroup] {
        let unchanged = self.computed
            && self.acls.as_slice() == acls
            && self.service_accounts.as_deref() == service_accounts;

        if !unchanged {
            self.acls = acls.to_vec();
            self.service_accounts = service_accounts.map(|s| s.to_vec());
            self.groups = group_principals(&self.acls, self.service_accounts.as_deref());
            self.computed = true;
            self.recomputations += 1;
            debug!(
                "Recomputed {} principal groups from {} ACLs",
                self.groups.len(),
                self.acls.len()
            );
        }

        &self.groups
    }

    /// Look up the group of a wire principal (`User:alice`) on a host.
    pub fn find(&self, principal: &str, host: &str) -> Option<&PrincipalGroup> {
        self.groups.iter().find(|g| g.matches(principal, host))
    }

    /// Forget the cached result; the next call recomputes.
    pub fn invalidate(&mut self) {
        self.computed = false;
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
