//! Extension descriptor model
//!
//! An extension descriptor mirrors the base descriptor but every field is
//! absent-by-default: an omitted field means "no change", never "change to
//! empty". Extensions reuse the base sub-entity types for provided
//! interfaces, required interfaces, and hooks; only the document, module,
//! and resource layers need their own looser shapes.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::document::{Hook, Include, ProvidedInterface, RequiredInterface};
use crate::ModelError;

/// A parsed extension descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionDocument {
    #[serde(default)]
    pub schema_version: String,

    /// Identifier of this extension, used in merge error context.
    #[serde(default)]
    pub id: String,

    /// Identifier of the base descriptor this extension overlays.
    #[serde(default)]
    pub extends: String,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub parameters: Mapping,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ModuleExt>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceExt>,
}

impl ExtensionDocument {
    /// Deserialize an extension descriptor from raw YAML bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        serde_yaml::from_slice(bytes).map_err(ModelError::Extension)
    }

    /// Deserialize an extension descriptor from a YAML string.
    pub fn from_str(source: &str) -> Result<Self, ModelError> {
        serde_yaml::from_str(source).map_err(ModelError::Extension)
    }
}

/// Extension overlay for one named module of the base descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleExt {
    /// Name of the base module being extended.
    pub name: String,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub properties: Mapping,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub parameters: Mapping,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub build_parameters: Mapping,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<Include>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<ProvidedInterface>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiredInterface>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<Hook>,
}

/// Extension overlay for one named resource of the base descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceExt {
    /// Name of the base resource being extended.
    pub name: String,

    /// Tri-state activation override; `None` leaves the base flag alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub properties: Mapping,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub parameters: Mapping,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiredInterface>,
}
