//! Permission resolution over the role registry and the grant table.
//!
//! For each role reached, the grant table is probed across the four
//! specificity tiers before any parent is consulted. Parents are searched
//! depth-first in declaration order and the first role yielding any grant
//! decides, allow or deny. A visited set guards against inheritance cycles and
//! keeps the walk linear in the number of roles.

use crate::grant::{Grant, GrantKey};
use crate::registry::RoleRegistry;
use crate::table::GrantTable;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::trace;

/// The grant that decided a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Matched<'a> {
    pub key: &'a GrantKey,
    pub grant: &'a Grant,
}

/// Outcome of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision<'a> {
    pub allowed: bool,
    /// `None` when the default action decided.
    pub matched: Option<Matched<'a>>,
}

impl<'a> Decision<'a> {
    /// Conditional payload of the deciding grant.
    pub fn payload(&self) -> Option<&'a Value> {
        self.matched.and_then(|m| m.grant.payload())
    }

    /// Whether no grant was found and the default action applied.
    pub fn is_default(&self) -> bool {
        self.matched.is_none()
    }
}

/// Read-only view answering point queries.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a RoleRegistry,
    table: &'a GrantTable,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a RoleRegistry, table: &'a GrantTable) -> Self {
        Self { registry, table }
    }

    /// Find the grant deciding `(role, resource, action)` through inheritance.
    ///
    /// Uses an explicit stack; parents are pushed in reverse so the first
    /// declared parent is explored, with its whole ancestry, before the next.
    pub fn find(&self, role: &str, resource: &str, action: &str) -> Option<Matched<'a>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![role];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                trace!(role = %current, "Role already visited");
                continue;
            }

            if let Some((key, grant)) = self.table.probe(current, resource, action) {
                trace!(role = %current, key = %key, "Grant matched");
                return Some(Matched { key, grant });
            }

            let parents = self.registry.parents(current);
            trace!(role = %current, parents = parents.len(), "No grant, descending to parents");
            stack.extend(parents.iter().rev().map(String::as_str));
        }

        None
    }

    /// Resolve a query, falling back to `default_action` when nothing matched.
    pub fn decide(
        &self,
        role: &str,
        resource: &str,
        action: &str,
        default_action: bool,
    ) -> Decision<'a> {
        match self.find(role, resource, action) {
            Some(matched) => Decision {
                allowed: matched.grant.is_allowed(),
                matched: Some(matched),
            },
            None => Decision {
                allowed: default_action,
                matched: None,
            },
        }
    }
}
