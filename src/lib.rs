//! Strata - layered application-descriptor merge lane
//!
//! This crate merges a base application descriptor with one or more
//! extension descriptors. Extensions layer environment- or
//! deployment-specific configuration onto the canonical descriptor: they
//! may add or override field values under per-field overwrite metadata,
//! but may never introduce new named modules, resources, interfaces, or
//! hooks.

pub mod loader;
pub mod merge;

pub use loader::{load_and_merge, DescriptorSource, LoadError, MergeReport, SourceRole};
pub use merge::{merge, merge_all, merge_checked, MergeError, MergeErrorKind};
pub use strata_model::{Document, ExtensionDocument, Module, Resource};
