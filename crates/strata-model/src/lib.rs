//! Strata descriptor data model
//!
//! Defines the in-memory representation of a base application descriptor
//! and of the extension descriptors that are layered on top of it. The
//! model is deliberately dumb: all dynamic configuration lives in
//! `serde_yaml` mappings, and the only behavior offered here is
//! deserialization and by-name lookup of child entities.

mod document;
mod extension;

pub use document::{
    Document, FieldMeta, Hook, Include, Module, ProvidedInterface, RequiredInterface,
    RequiresOwner, Resource,
};
pub use extension::{ExtensionDocument, ModuleExt, ResourceExt};

use thiserror::Error;

/// Errors produced when turning serialized descriptor bytes into the model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The base descriptor could not be deserialized.
    #[error("could not deserialize the base descriptor")]
    Document(#[source] serde_yaml::Error),

    /// The extension descriptor could not be deserialized.
    #[error("could not deserialize the extension descriptor")]
    Extension(#[source] serde_yaml::Error),
}
