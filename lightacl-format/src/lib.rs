//! # lightacl format
//!
//! Renders an exported policy as indented literal text, ready to be embedded
//! in a source or configuration file. The output is valid JSON and imports
//! back into an equivalent policy.
//!
//! ```rust
//! use lightacl_core::Acl;
//! use lightacl_format::PolicyLiteral;
//!
//! let mut acl = Acl::new();
//! acl.allow("Guest", "routes", "*").deny("Guest", "routes", "profile");
//!
//! let config = acl.to_config().unwrap();
//! let text = PolicyLiteral::new(&config).to_string();
//! assert_eq!(
//!     text,
//!     "{\n    \"Guest\": [ null,\n        \"routes!*\",\n        { \"routes!profile\": false }\n    ]\n}\n"
//! );
//! ```

use lightacl_core::config::{AclConfig, GrantEntry, Inherits};
use lightacl_core::{Acl, Result};
use serde_json::Value;
use std::fmt;

/// Indentation used when none is configured.
pub const DEFAULT_TAB: &str = "    ";

/// Display adapter rendering a policy configuration as literal text.
#[derive(Debug, Clone, Copy)]
pub struct PolicyLiteral<'a> {
    config: &'a AclConfig,
    tab: &'a str,
}

impl<'a> PolicyLiteral<'a> {
    pub fn new(config: &'a AclConfig) -> Self {
        Self {
            config,
            tab: DEFAULT_TAB,
        }
    }

    /// Use `tab` for each indentation level.
    pub fn with_tab(mut self, tab: &'a str) -> Self {
        self.tab = tab;
        self
    }
}

impl fmt::Display for PolicyLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;

        let last = self.config.len().saturating_sub(1);
        for (index, (role, entry)) in self.config.iter().enumerate() {
            write!(
                f,
                "{}{}: [ {}",
                self.tab,
                quote(role),
                inherits_literal(&entry.inherits)
            )?;

            for grant in &entry.grants {
                write!(f, ",\n{}{}", self.tab.repeat(2), grant_literal(grant))?;
            }

            if entry.grants.is_empty() {
                write!(f, " ]")?;
            } else {
                write!(f, "\n{}]", self.tab)?;
            }
            writeln!(f, "{}", if index < last { "," } else { "" })?;
        }

        writeln!(f, "}}")
    }
}

/// Render a configuration with the default indentation.
pub fn render(config: &AclConfig) -> String {
    PolicyLiteral::new(config).to_string()
}

/// Export an evaluator and render it with the given indentation.
pub fn render_acl(acl: &Acl, tab: &str) -> Result<String> {
    let config = acl.to_config()?;
    Ok(PolicyLiteral::new(&config).with_tab(tab).to_string())
}

fn quote(s: &str) -> String {
    Value::from(s).to_string()
}

fn inherits_literal(inherits: &Inherits) -> String {
    match inherits {
        Inherits::None => "null".to_string(),
        Inherits::One(parent) => quote(parent),
        Inherits::Many(parents) => {
            let names: Vec<String> = parents.iter().map(|p| quote(p)).collect();
            format!("[{}]", names.join(", "))
        }
    }
}

fn grant_literal(grant: &GrantEntry) -> String {
    match grant {
        GrantEntry::Allow(endpoint) => quote(endpoint),
        GrantEntry::Keyed(endpoint, payload) => {
            format!("{{ {}: {} }}", quote(endpoint), payload_literal(payload))
        }
    }
}

/// A map made only of flags renders as the list of its keys.
fn payload_literal(payload: &Value) -> String {
    match payload {
        Value::Object(map) if !map.is_empty() && map.values().all(|v| v == &Value::Bool(true)) => {
            let flags: Vec<String> = map.keys().map(|k| quote(k)).collect();
            format!("[{}]", flags.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", quote(key), value))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        other => other.to_string(),
    }
}
