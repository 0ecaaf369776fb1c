//! Grant keys and grant values.
//!
//! A grant is addressed by the exact triple `(role, resource, action)`, where
//! resource and action are either literal tokens or the [`WILDCARD`]. Its value
//! is one of three variants: allow, deny, or allow with an opaque payload the
//! host may interpret as conditions.

use indexmap::Equivalent;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Token that matches any resource or any action through the specificity tiers.
pub const WILDCARD: &str = "*";

/// Separator between resource and action in a textual endpoint (`routes!list`).
pub const SEPARATOR: char = '!';

/// Exact key of a grant table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantKey {
    pub role: String,
    pub resource: String,
    pub action: String,
}

impl GrantKey {
    pub fn new(
        role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// The `resource!action` form used by the configuration codec.
    pub fn endpoint(&self) -> String {
        format_endpoint(&self.resource, &self.action)
    }
}

impl fmt::Display for GrantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.role, self.resource, self.action
        )
    }
}

/// Borrowed key used to probe the table without allocating.
///
/// Hashes identically to [`GrantKey`] since `String` hashes as `str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct GrantKeyRef<'a> {
    pub role: &'a str,
    pub resource: &'a str,
    pub action: &'a str,
}

impl<'a> GrantKeyRef<'a> {
    pub fn new(role: &'a str, resource: &'a str, action: &'a str) -> Self {
        Self {
            role,
            resource,
            action,
        }
    }
}

impl Equivalent<GrantKey> for GrantKeyRef<'_> {
    fn equivalent(&self, key: &GrantKey) -> bool {
        self.role == key.role && self.resource == key.resource && self.action == key.action
    }
}

/// A stored access decision.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Grant {
    /// Unconditional permission.
    #[default]
    Allow,
    /// Unconditional denial.
    Deny,
    /// Permission carrying a payload the host may treat as conditions.
    AllowWithPayload(Value),
}

impl Grant {
    /// Build a grant from a loosely shaped value.
    ///
    /// - `true` or `null` allow unconditionally
    /// - `false` denies
    /// - a list becomes a map: plain items are flags with value `true`,
    ///   object items contribute their entries as given
    /// - a map is kept as the payload, even when empty
    /// - any other scalar is kept verbatim as the payload
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null | Value::Bool(true) => Grant::Allow,
            Value::Bool(false) => Grant::Deny,
            other => Grant::AllowWithPayload(other).normalized(),
        }
    }

    /// Canonical form of a grant, the one the configuration codec reproduces.
    ///
    /// A payload that is a boolean or `null` carries no conditions and becomes
    /// [`Grant::Allow`]; a list payload becomes its flag map. The allow/deny
    /// answer never changes.
    pub fn normalized(self) -> Self {
        match self {
            Grant::AllowWithPayload(Value::Null | Value::Bool(_)) => Grant::Allow,
            Grant::AllowWithPayload(Value::Array(items)) => {
                Grant::AllowWithPayload(Value::Object(flags_from_items(items)))
            }
            other => other,
        }
    }

    /// Whether this grant permits access.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Grant::Deny)
    }

    /// The conditional payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Grant::AllowWithPayload(payload) => Some(payload),
            Grant::Allow | Grant::Deny => None,
        }
    }

    /// Literal value form: booleans for plain grants, the payload otherwise.
    pub fn to_value(&self) -> Value {
        match self {
            Grant::Allow => Value::Bool(true),
            Grant::Deny => Value::Bool(false),
            Grant::AllowWithPayload(payload) => payload.clone(),
        }
    }
}

impl From<bool> for Grant {
    fn from(allowed: bool) -> Self {
        if allowed { Grant::Allow } else { Grant::Deny }
    }
}

impl From<Value> for Grant {
    fn from(value: Value) -> Self {
        Grant::from_value(value)
    }
}

impl Serialize for Grant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Grant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Grant::from_value)
    }
}

fn flags_from_items(items: Vec<Value>) -> Map<String, Value> {
    let mut map = Map::new();
    for item in items {
        match item {
            Value::Object(entries) => map.extend(entries),
            Value::String(flag) => {
                map.insert(flag, Value::Bool(true));
            }
            // Non-string scalars are keyed by their JSON text
            other => {
                map.insert(other.to_string(), Value::Bool(true));
            }
        }
    }
    map
}

/// Join a resource and an action into `resource!action`.
pub fn format_endpoint(resource: &str, action: &str) -> String {
    format!("{resource}{SEPARATOR}{action}")
}

/// Split `resource!action` at the first separator.
///
/// The resource never contains the separator, the action may.
pub fn parse_endpoint(endpoint: &str) -> Option<(&str, &str)> {
    endpoint.split_once(SEPARATOR)
}
