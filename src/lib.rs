//! # lightacl - lightweight role-based access control
//!
//! Decide whether a role may perform an action on a resource, using a static
//! grant table with role inheritance and `*` wildcards.
//!
//! This crate re-exports the functionality of the constituent crates:
//! - `lightacl-core`: Role registry, grant table, resolver and configuration codec
//! - `lightacl-format`: Literal rendering of exported policies

pub use lightacl_core as core;
pub use lightacl_format as format;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::format::{PolicyLiteral, render, render_acl};
}
