//! Error types for lightacl.
//!
//! Queries and mutations on an [`Acl`](crate::Acl) never fail: any string is a
//! legal role, resource or action name and unknown roles simply fall through
//! to the default action. Errors only arise at the configuration boundary,
//! where a literal policy value is imported, exported or read from disk.
//!
//! # Examples
//!
//! ```rust
//! use lightacl_core::error::{AclError, Result};
//!
//! fn reject(role: &str) -> Result<()> {
//!     Err(AclError::Config {
//!         role: role.to_string(),
//!         reason: "expected a list".to_string(),
//!     })
//! }
//!
//! assert!(reject("Guest").unwrap_err().to_string().contains("Guest"));
//! ```

use thiserror::Error;

/// Result type alias for lightacl operations.
pub type Result<T> = std::result::Result<T, AclError>;

/// Errors that can occur while importing, exporting or loading a policy.
#[derive(Error, Debug)]
pub enum AclError {
    /// A role entry of the configuration value has an invalid shape.
    #[error("Invalid configuration for role '{role}': {reason}")]
    Config { role: String, reason: String },

    /// The configuration value as a whole is not a mapping of roles.
    #[error("Invalid policy document: {0}")]
    InvalidDocument(String),

    /// A grant cannot be written as a `resource!action` endpoint because the
    /// resource itself contains the separator.
    #[error("Grant for role '{role}' on resource '{resource}' cannot be exported: resource contains '!'")]
    UnrepresentableEndpoint { role: String, resource: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AclError {
    pub(crate) fn config(role: &str, reason: impl Into<String>) -> Self {
        AclError::Config {
            role: role.to_string(),
            reason: reason.into(),
        }
    }
}
