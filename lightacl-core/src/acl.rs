//! The access-control evaluator and its builder.

use crate::config::{AclConfig, Inherits};
use crate::grant::{Grant, GrantKey};
use crate::registry::RoleRegistry;
use crate::resolver::{Decision, Resolver};
use crate::table::GrantTable;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};

/// Role-based access-control evaluator.
///
/// Holds the role registry, the grant table and the default action. Queries
/// go through [`Acl::evaluate`], which is pure and returns the deciding grant
/// alongside the answer. [`Acl::is_allowed`] and [`Acl::matched_rules`] offer
/// the two-call style on top of it by remembering the last match.
///
/// # Example
///
/// ```rust
/// use lightacl_core::Acl;
///
/// let mut acl = Acl::new();
/// acl.set_default_action(false)
///     .allow("Guest", "routes", "*")
///     .deny("Guest", "routes", "profile")
///     .register_role("Admin", "Guest")
///     .allow("Admin", "*", "*");
///
/// assert!(!acl.is_allowed("Guest", "routes", "profile"));
/// assert!(acl.is_allowed("Guest", "routes", "list"));
/// assert!(acl.is_allowed("Admin", "routes", "profile"));
/// ```
#[derive(Debug, Clone)]
pub struct Acl {
    registry: RoleRegistry,
    table: GrantTable,
    default_action: bool,
    audit_enabled: bool,
    matched: Option<GrantKey>,
}

impl Default for Acl {
    fn default() -> Self {
        Self {
            registry: RoleRegistry::new(),
            table: GrantTable::new(),
            default_action: true,
            audit_enabled: false,
            matched: None,
        }
    }
}

/// Two evaluators are equal when they hold the same policy; the last match
/// and the audit switch are not part of it.
impl PartialEq for Acl {
    fn eq(&self, other: &Self) -> bool {
        self.default_action == other.default_action
            && self.registry == other.registry
            && self.table == other.table
    }
}

impl Acl {
    /// Empty policy; the default action allows.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AclBuilder {
        AclBuilder::new()
    }

    pub fn set_default_action(&mut self, allowed: bool) -> &mut Self {
        self.default_action = allowed;
        self
    }

    pub fn default_action(&self) -> bool {
        self.default_action
    }

    pub fn set_audit_logging(&mut self, enabled: bool) -> &mut Self {
        self.audit_enabled = enabled;
        self
    }

    /// Register a role and its parents, which may be none, one name or a list.
    pub fn register_role(&mut self, role: &str, parents: impl Into<Inherits>) -> &mut Self {
        self.registry.register(role, parents.into().names());
        self
    }

    /// Register a role without parents.
    pub fn add_role(&mut self, role: &str) -> &mut Self {
        self.registry.ensure(role);
        self
    }

    pub fn add_inherit(&mut self, role: &str, parent: &str) -> &mut Self {
        self.registry.add_inherit(role, parent);
        self
    }

    /// Known roles in first-seen order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.registry.roles()
    }

    /// Direct parents of a role in declaration order.
    pub fn parents(&self, role: &str) -> &[String] {
        self.registry.parents(role)
    }

    /// Store a grant under the exact key, replacing any previous one.
    ///
    /// The role is registered if it was unknown.
    pub fn grant(
        &mut self,
        role: &str,
        resource: &str,
        action: &str,
        grant: impl Into<Grant>,
    ) -> &mut Self {
        self.registry.ensure(role);
        self.table
            .set(GrantKey::new(role, resource, action), grant.into());
        self
    }

    pub fn allow(&mut self, role: &str, resource: &str, action: &str) -> &mut Self {
        self.grant(role, resource, action, Grant::Allow)
    }

    /// Allow with a payload, normalized as described on [`Grant::from_value`].
    ///
    /// An empty list or map means no conditions and stores a plain allow.
    pub fn allow_with(
        &mut self,
        role: &str,
        resource: &str,
        action: &str,
        payload: Value,
    ) -> &mut Self {
        let grant = match &payload {
            Value::Array(items) if items.is_empty() => Grant::Allow,
            Value::Object(map) if map.is_empty() => Grant::Allow,
            _ => Grant::from_value(payload),
        };
        self.grant(role, resource, action, grant)
    }

    pub fn deny(&mut self, role: &str, resource: &str, action: &str) -> &mut Self {
        self.grant(role, resource, action, Grant::Deny)
    }

    /// Remove the grant stored under the exact key. The role stays registered.
    pub fn revoke(&mut self, role: &str, resource: &str, action: &str) -> Option<Grant> {
        self.table.revoke(role, resource, action)
    }

    /// Exact-key lookup without wildcards or inheritance.
    pub fn lookup(&self, role: &str, resource: &str, action: &str) -> Option<&Grant> {
        self.table.lookup(role, resource, action)
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn table(&self) -> &GrantTable {
        &self.table
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.registry, &self.table)
    }

    /// Decide a query without touching any state.
    pub fn evaluate(&self, role: &str, resource: &str, action: &str) -> Decision<'_> {
        let decision = self
            .resolver()
            .decide(role, resource, action, self.default_action);

        if self.audit_enabled {
            let matched = decision
                .matched
                .map(|m| m.key.to_string())
                .unwrap_or_else(|| "default".to_string());
            if decision.allowed {
                info!(
                    role = %role,
                    resource = %resource,
                    action = %action,
                    matched = %matched,
                    result = "granted",
                    "Access check"
                );
            } else {
                warn!(
                    role = %role,
                    resource = %resource,
                    action = %action,
                    matched = %matched,
                    result = "denied",
                    "Access check"
                );
            }
        }

        decision
    }

    /// Decide a query and remember the deciding grant for
    /// [`Acl::matched_rules`] and [`Acl::matched_access_key`].
    pub fn is_allowed(&mut self, role: &str, resource: &str, action: &str) -> bool {
        let decision = self.evaluate(role, resource, action);
        let allowed = decision.allowed;
        let matched = decision.matched.map(|m| m.key.clone());
        self.matched = matched;
        allowed
    }

    /// Key of the grant that decided the last [`Acl::is_allowed`] call.
    pub fn matched_access_key(&self) -> Option<&GrantKey> {
        self.matched.as_ref()
    }

    /// Payload of the grant that decided the last [`Acl::is_allowed`] call.
    ///
    /// `None` for plain allow/deny grants and for default decisions.
    pub fn matched_rules(&self) -> Option<&Value> {
        self.matched
            .as_ref()
            .and_then(|key| self.table.get(key))
            .and_then(Grant::payload)
    }

    /// Every known role allowed to perform `action` on `resource`, mapped to
    /// the payload of its deciding grant.
    ///
    /// Roles appear in registry order. Each role is decided through
    /// [`Acl::evaluate`], so audit logging covers it, and the remembered match
    /// of [`Acl::is_allowed`] is left untouched.
    pub fn which_roles_have_access(
        &self,
        resource: &str,
        action: &str,
    ) -> IndexMap<&str, Option<&Value>> {
        self.registry
            .roles()
            .filter_map(|role| {
                let decision = self.evaluate(role, resource, action);
                decision.allowed.then(|| (role, decision.payload()))
            })
            .collect()
    }

    /// Import a literal configuration value.
    pub fn parse(config: &Value) -> crate::Result<Self> {
        Self::from_config(&AclConfig::from_value(config)?)
    }
}

/// Builder for [`Acl`].
#[derive(Debug, Clone)]
pub struct AclBuilder {
    default_action: bool,
    audit_enabled: bool,
    config: Option<AclConfig>,
    roles: Vec<(String, Inherits)>,
    grants: Vec<(GrantKey, Grant)>,
}

impl AclBuilder {
    pub fn new() -> Self {
        Self {
            default_action: true,
            audit_enabled: false,
            config: None,
            roles: Vec::new(),
            grants: Vec::new(),
        }
    }

    pub fn with_default_action(mut self, allowed: bool) -> Self {
        self.default_action = allowed;
        self
    }

    /// Log every decision: granted at info level, denied at warn level.
    pub fn with_audit_logging(mut self, enabled: bool) -> Self {
        self.audit_enabled = enabled;
        self
    }

    /// Start from an imported configuration; later roles and grants apply on top.
    pub fn with_config(mut self, config: AclConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_role(mut self, role: &str, parents: impl Into<Inherits>) -> Self {
        self.roles.push((role.to_string(), parents.into()));
        self
    }

    pub fn with_grant(
        mut self,
        role: &str,
        resource: &str,
        action: &str,
        grant: impl Into<Grant>,
    ) -> Self {
        self.grants
            .push((GrantKey::new(role, resource, action), grant.into()));
        self
    }

    pub fn with_allow(self, role: &str, resource: &str, action: &str) -> Self {
        self.with_grant(role, resource, action, Grant::Allow)
    }

    pub fn with_deny(self, role: &str, resource: &str, action: &str) -> Self {
        self.with_grant(role, resource, action, Grant::Deny)
    }

    /// Fails only if the supplied configuration holds a malformed endpoint.
    pub fn build(self) -> crate::Result<Acl> {
        let mut acl = match &self.config {
            Some(config) => Acl::from_config(config)?,
            None => Acl::new(),
        };

        for (role, parents) in self.roles {
            acl.register_role(&role, parents);
        }
        for (key, grant) in self.grants {
            acl.grant(&key.role, &key.resource, &key.action, grant);
        }

        acl.set_default_action(self.default_action)
            .set_audit_logging(self.audit_enabled);
        Ok(acl)
    }
}

impl Default for AclBuilder {
    fn default() -> Self {
        Self::new()
    }
}
