//! Command implementations.
//!
//! Each command returns the text to print so callers decide where it goes.

pub mod catalog;
pub mod profile;
pub mod query;

pub use self::catalog::{execute_describe, execute_interfaces, execute_resolve, execute_services};
pub use self::profile::execute_profile;
pub use self::query::execute_query;
