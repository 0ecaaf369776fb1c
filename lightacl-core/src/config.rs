//! Configuration codec: literal policy values to and from an [`Acl`].
//!
//! A policy is a mapping from role name to a list. The first element of the
//! list is the inherit specification (`null`, a role name or a list of role
//! names); every further element is a grant, either a bare `"resource!action"`
//! string (unconditional allow) or an object mapping `"resource!action"` to a
//! payload (`true`, `false` or a structured value).
//!
//! ```json
//! {
//!     "Guest": [null, "routes!*", {"routes!profile": false}],
//!     "Admin": ["Guest", "*!*"]
//! }
//! ```

use crate::acl::Acl;
use crate::error::{AclError, Result};
use crate::grant::{Grant, SEPARATOR, parse_endpoint};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Parents declared for a role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Inherits {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Inherits {
    /// Parent names in declaration order.
    pub fn names(&self) -> &[String] {
        match self {
            Inherits::None => &[],
            Inherits::One(parent) => std::slice::from_ref(parent),
            Inherits::Many(parents) => parents,
        }
    }

    /// Most compact form for a parent list.
    pub fn from_parents(parents: &[String]) -> Self {
        match parents {
            [] => Inherits::None,
            [parent] => Inherits::One(parent.clone()),
            _ => Inherits::Many(parents.to_vec()),
        }
    }

    fn from_value(role: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Inherits::None),
            Value::String(parent) => Ok(Inherits::One(parent.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        AclError::config(role, format!("inherited role must be a string, found {item}"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Inherits::Many),
            other => Err(AclError::config(
                role,
                format!("inherit specification must be null, a role name or a list of role names, found {other}"),
            )),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Inherits::None => Value::Null,
            Inherits::One(parent) => Value::String(parent.clone()),
            Inherits::Many(parents) => {
                Value::Array(parents.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for Inherits {
    fn from(parent: &str) -> Self {
        Inherits::One(parent.to_string())
    }
}

impl From<String> for Inherits {
    fn from(parent: String) -> Self {
        Inherits::One(parent)
    }
}

impl From<Option<&str>> for Inherits {
    fn from(parent: Option<&str>) -> Self {
        parent.map_or(Inherits::None, Inherits::from)
    }
}

impl From<Vec<String>> for Inherits {
    fn from(parents: Vec<String>) -> Self {
        Inherits::Many(parents)
    }
}

impl From<Vec<&str>> for Inherits {
    fn from(parents: Vec<&str>) -> Self {
        Inherits::Many(parents.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Inherits {
    fn from(parents: &[&str]) -> Self {
        Inherits::Many(parents.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Inherits {
    fn from(parents: [&str; N]) -> Self {
        Inherits::Many(parents.iter().map(|p| p.to_string()).collect())
    }
}

/// One grant line of a role entry.
#[derive(Debug, Clone, PartialEq)]
pub enum GrantEntry {
    /// Bare `resource!action`: unconditional allow.
    Allow(String),
    /// `resource!action` mapped to a literal payload.
    Keyed(String, Value),
}

impl GrantEntry {
    pub fn endpoint(&self) -> &str {
        match self {
            GrantEntry::Allow(endpoint) | GrantEntry::Keyed(endpoint, _) => endpoint,
        }
    }

    /// The normalized grant this entry stands for.
    pub fn grant(&self) -> Grant {
        match self {
            GrantEntry::Allow(_) => Grant::Allow,
            GrantEntry::Keyed(_, payload) => Grant::from_value(payload.clone()),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            GrantEntry::Allow(endpoint) => Value::String(endpoint.clone()),
            GrantEntry::Keyed(endpoint, payload) => {
                let mut map = Map::new();
                map.insert(endpoint.clone(), payload.clone());
                Value::Object(map)
            }
        }
    }
}

/// Inherit specification and grants of a single role.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoleEntry {
    pub inherits: Inherits,
    pub grants: Vec<GrantEntry>,
}

impl RoleEntry {
    fn from_value(role: &str, value: &Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            AclError::config(
                role,
                "expected a list whose first element is the inherit specification",
            )
        })?;
        let (inherits, rest) = items
            .split_first()
            .ok_or_else(|| AclError::config(role, "missing inherit specification"))?;

        let mut grants = Vec::with_capacity(rest.len());
        for item in rest {
            match item {
                Value::String(endpoint) => {
                    check_endpoint(role, endpoint)?;
                    grants.push(GrantEntry::Allow(endpoint.clone()));
                }
                Value::Object(entries) => {
                    for (endpoint, payload) in entries {
                        check_endpoint(role, endpoint)?;
                        grants.push(GrantEntry::Keyed(endpoint.clone(), payload.clone()));
                    }
                }
                other => {
                    return Err(AclError::config(
                        role,
                        format!("grant must be an endpoint string or an endpoint-to-payload mapping, found {other}"),
                    ));
                }
            }
        }

        Ok(Self {
            inherits: Inherits::from_value(role, inherits)?,
            grants,
        })
    }

    fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.grants.len() + 1);
        items.push(self.inherits.to_value());
        items.extend(self.grants.iter().map(GrantEntry::to_value));
        Value::Array(items)
    }
}

fn check_endpoint(role: &str, endpoint: &str) -> Result<()> {
    if parse_endpoint(endpoint).is_none() {
        return Err(AclError::config(
            role,
            format!("endpoint '{endpoint}' is not of the form 'resource{SEPARATOR}action'"),
        ));
    }
    Ok(())
}

/// Typed form of a literal policy value, roles in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AclConfig {
    pub roles: IndexMap<String, RoleEntry>,
}

impl AclConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a literal policy value, naming the offending role on failure.
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value.as_object().ok_or_else(|| {
            AclError::InvalidDocument(format!("expected a mapping of role names, found {value}"))
        })?;

        let roles = entries
            .iter()
            .map(|(role, entry)| Ok((role.clone(), RoleEntry::from_value(role, entry)?)))
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self { roles })
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.roles
                .iter()
                .map(|(role, entry)| (role.clone(), entry.to_value()))
                .collect(),
        )
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_value(&serde_json::from_str(s)?)
    }

    pub fn get(&self, role: &str) -> Option<&RoleEntry> {
        self.roles.get(role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RoleEntry)> {
        self.roles.iter().map(|(role, entry)| (role.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Serialize for AclConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AclConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        AclConfig::from_value(&value).map_err(D::Error::custom)
    }
}

impl TryFrom<&Value> for AclConfig {
    type Error = AclError;

    fn try_from(value: &Value) -> Result<Self> {
        AclConfig::from_value(value)
    }
}

impl Acl {
    /// Build an evaluator from a typed configuration.
    ///
    /// Roles are processed in declaration order: each is registered with its
    /// parents, then its grants are applied in listed order.
    pub fn from_config(config: &AclConfig) -> Result<Self> {
        let mut acl = Acl::new();
        acl.load_config(config)?;
        Ok(acl)
    }

    /// Apply a configuration on top of the current policy.
    pub fn load_config(&mut self, config: &AclConfig) -> Result<&mut Self> {
        for (role, entry) in config.iter() {
            debug!(
                role = %role,
                parents = entry.inherits.names().len(),
                grants = entry.grants.len(),
                "Importing role"
            );
            self.register_role(role, entry.inherits.clone());

            for grant in &entry.grants {
                let (resource, action) = parse_endpoint(grant.endpoint()).ok_or_else(|| {
                    AclError::config(
                        role,
                        format!("endpoint '{}' is missing the '{SEPARATOR}' separator", grant.endpoint()),
                    )
                })?;
                self.grant(role, resource, action, grant.grant());
            }
        }
        Ok(self)
    }

    /// Export roles, inheritance and grants in the literal policy shape.
    ///
    /// Fails if a grant's resource contains the separator, since its endpoint
    /// would be re-imported under a different key.
    pub fn to_config(&self) -> Result<AclConfig> {
        let mut grants: IndexMap<&str, Vec<GrantEntry>> = IndexMap::new();
        for (key, grant) in self.table().iter() {
            if key.resource.contains(SEPARATOR) {
                return Err(AclError::UnrepresentableEndpoint {
                    role: key.role.clone(),
                    resource: key.resource.clone(),
                });
            }
            let entry = match grant {
                Grant::Allow => GrantEntry::Allow(key.endpoint()),
                other => GrantEntry::Keyed(key.endpoint(), other.to_value()),
            };
            grants.entry(key.role.as_str()).or_default().push(entry);
        }

        let roles = self
            .roles()
            .map(|role| {
                let entry = RoleEntry {
                    inherits: Inherits::from_parents(self.parents(role)),
                    grants: grants.swap_remove(role).unwrap_or_default(),
                };
                (role.to_string(), entry)
            })
            .collect();

        Ok(AclConfig { roles })
    }
}

fn default_action() -> bool {
    true
}

/// A complete policy file: default action plus role configuration.
///
/// ```json
/// {
///     "default_action": false,
///     "roles": { "Guest": [null, "routes!*"] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDocument {
    /// Answer used when no grant is found; allows when omitted.
    pub default_action: bool,
    pub roles: AclConfig,
}

/// Deserialization goes through [`PolicyDocument::from_value`].
impl<'de> Deserialize<'de> for PolicyDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        PolicyDocument::from_value(&value).map_err(D::Error::custom)
    }
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            default_action: true,
            roles: AclConfig::new(),
        }
    }
}

impl PolicyDocument {
    /// Load a policy document from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading policy document");
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Save the policy document as pretty-printed JSON
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), roles = self.roles.len(), "Saving policy document");
        std::fs::write(path, self.to_json_string_pretty()?)?;
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let document = value.as_object().ok_or_else(|| {
            AclError::InvalidDocument(format!("expected an object, found {value}"))
        })?;

        let default_action = match document.get("default_action") {
            None => default_action(),
            Some(Value::Bool(allowed)) => *allowed,
            Some(other) => {
                return Err(AclError::InvalidDocument(format!(
                    "default_action must be a boolean, found {other}"
                )));
            }
        };
        let roles = document
            .get("roles")
            .ok_or_else(|| AclError::InvalidDocument("missing 'roles' mapping".to_string()))?;

        Ok(Self {
            default_action,
            roles: AclConfig::from_value(roles)?,
        })
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every grant endpoint of a programmatically assembled document.
    pub fn validate(&self) -> Result<()> {
        for (role, entry) in self.roles.iter() {
            for grant in &entry.grants {
                check_endpoint(role, grant.endpoint())?;
            }
        }
        Ok(())
    }

    pub fn to_acl(&self) -> Result<Acl> {
        let mut acl = Acl::from_config(&self.roles)?;
        acl.set_default_action(self.default_action);
        Ok(acl)
    }

    pub fn from_acl(acl: &Acl) -> Result<Self> {
        Ok(Self {
            default_action: acl.default_action(),
            roles: acl.to_config()?,
        })
    }
}
