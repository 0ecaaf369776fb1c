//! Role registry: the set of known roles and their inheritance edges.

use indexmap::IndexMap;
use tracing::debug;

/// Known roles in first-seen order, each with its direct parents in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRegistry {
    roles: IndexMap<String, Vec<String>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `role` is known. Returns `true` if it was newly added.
    pub fn ensure(&mut self, role: &str) -> bool {
        if self.roles.contains_key(role) {
            return false;
        }
        debug!(role = %role, "Registering role");
        self.roles.insert(role.to_string(), Vec::new());
        true
    }

    /// Register `role` and record an edge to each parent.
    ///
    /// Re-registering a role appends to its parents rather than replacing them.
    pub fn register<I, S>(&mut self, role: &str, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure(role);
        for parent in parents {
            self.add_inherit(role, parent.as_ref());
        }
    }

    /// Record that `role` inherits from `parent`, registering both.
    ///
    /// A self edge only registers the role.
    pub fn add_inherit(&mut self, role: &str, parent: &str) {
        self.ensure(role);
        self.ensure(parent);

        if role == parent {
            debug!(role = %role, "Ignoring self inheritance");
            return;
        }

        if let Some(parents) = self.roles.get_mut(role) {
            debug!(role = %role, parent = %parent, "Adding inheritance edge");
            parents.push(parent.to_string());
        }
    }

    pub fn contains(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Direct parents of `role` in declaration order; empty for unknown roles.
    pub fn parents(&self, role: &str) -> &[String] {
        self.roles.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Role names in first-seen order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
