//! Core types for the compatibility matrix resolver.

pub mod catalog;
pub mod component;
pub mod operator;
pub mod version;

pub use catalog::{Catalog, CatalogEntry, SupportStatus};
pub use component::{Component, Matrix};
pub use operator::{ComponentKind, OperatorType};
pub use version::{compare, ComponentVersion, VersionError};
