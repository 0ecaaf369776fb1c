//! Grant table keyed by exact `(role, resource, action)` triples.

use crate::grant::{Grant, GrantKey, GrantKeyRef, WILDCARD};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// Grants in insertion order. Overwriting a key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrantTable {
    grants: IndexMap<GrantKey, Grant>,
}

impl GrantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a grant, replacing any grant stored under the same key.
    ///
    /// The grant is stored in its [normalized](Grant::normalized) form.
    pub fn set(&mut self, key: GrantKey, grant: Grant) -> Option<Grant> {
        let grant = grant.normalized();
        debug!(
            role = %key.role,
            resource = %key.resource,
            action = %key.action,
            grant = ?grant,
            "Writing grant"
        );
        self.grants.insert(key, grant)
    }

    /// Remove the grant stored under the exact key.
    pub fn revoke(&mut self, role: &str, resource: &str, action: &str) -> Option<Grant> {
        let removed = self
            .grants
            .shift_remove(&GrantKeyRef::new(role, resource, action));
        if removed.is_some() {
            debug!(role = %role, resource = %resource, action = %action, "Revoked grant");
        }
        removed
    }

    /// Exact-key lookup: no wildcard expansion, no inheritance.
    pub fn lookup(&self, role: &str, resource: &str, action: &str) -> Option<&Grant> {
        self.grants.get(&GrantKeyRef::new(role, resource, action))
    }

    pub(crate) fn get(&self, key: &GrantKey) -> Option<&Grant> {
        self.grants.get(key)
    }

    /// Probe the four specificity tiers for a single role, most specific first:
    /// `(resource, action)`, `(resource, *)`, `(*, action)`, `(*, *)`.
    ///
    /// The first tier holding any grant wins, whatever its variant.
    pub fn probe(&self, role: &str, resource: &str, action: &str) -> Option<(&GrantKey, &Grant)> {
        let tiers = [
            (resource, action),
            (resource, WILDCARD),
            (WILDCARD, action),
            (WILDCARD, WILDCARD),
        ];

        tiers.into_iter().find_map(|(resource, action)| {
            let hit = self
                .grants
                .get_key_value(&GrantKeyRef::new(role, resource, action));
            trace!(
                role = %role,
                resource = %resource,
                action = %action,
                hit = hit.is_some(),
                "Probing tier"
            );
            hit
        })
    }

    /// All grants in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&GrantKey, &Grant)> {
        self.grants.iter()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
