//! # lightacl core
//!
//! Role-based access control evaluator: given a role, a resource and an
//! action, decide whether access is permitted using a statically configured
//! grant table with role inheritance and wildcard matching.
//!
//! - **Role registry**: known roles and their ordered parents
//! - **Grant table**: allow, deny or allow-with-payload per exact
//!   `(role, resource, action)` key, where resource and action may be `*`
//! - **Resolver**: four specificity tiers per role, then a depth-first,
//!   cycle-safe walk through the parents
//! - **Configuration codec**: import and export of literal policy values
//!
//! # Quick Start
//!
//! ```rust
//! use lightacl_core::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> Result<()> {
//! let mut acl = Acl::parse(&json!({
//!     "Guest": [null, "routes!*", {"routes!profile": false}],
//!     "Admin": ["Guest", "*!*"]
//! }))?;
//! acl.set_default_action(false);
//!
//! assert!(!acl.is_allowed("Guest", "routes", "profile"));
//! assert!(acl.is_allowed("Admin", "routes", "profile"));
//!
//! let decision = acl.evaluate("Guest", "routes", "list");
//! assert!(decision.allowed);
//! assert_eq!(decision.matched.unwrap().key.to_string(), "Guest!routes!*");
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! All query methods except [`Acl::is_allowed`] take `&self`, so a shared
//! `Acl` may be evaluated from many threads at once. The remembered match of
//! `is_allowed` is per instance; use [`Acl::evaluate`] when sharing.

pub mod acl;
pub mod config;
pub mod error;
pub mod grant;
pub mod registry;
pub mod resolver;
pub mod table;

pub mod prelude {
    //! Common imports for lightacl

    pub use crate::acl::{Acl, AclBuilder};
    pub use crate::config::{AclConfig, GrantEntry, Inherits, PolicyDocument, RoleEntry};
    pub use crate::error::{AclError, Result};
    pub use crate::grant::{Grant, GrantKey, WILDCARD};
    pub use crate::resolver::{Decision, Matched};
}

pub use acl::{Acl, AclBuilder};
pub use config::{AclConfig, PolicyDocument};
pub use error::{AclError, Result};
pub use grant::{Grant, GrantKey};
pub use resolver::Decision;
