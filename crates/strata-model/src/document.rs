//! Base descriptor model
//!
//! A descriptor declares an application as a set of named modules and
//! resources. Modules expose provided interfaces, consume required
//! interfaces, and may declare lifecycle hooks. Every properties or
//! parameters table can carry a per-field overwrite-metadata table that
//! governs whether extensions may replace an existing value.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::collections::HashMap;

use crate::ModelError;

/// Per-field overwrite policy entry.
///
/// A field listed in a metadata table with `overwritable: false` may not be
/// replaced by an extension once it holds a value. Fields without a
/// metadata entry are overwritable by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    #[serde(default)]
    pub overwritable: bool,
}

/// A parsed base application descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Document {
    /// Descriptor schema version understood by this toolchain.
    #[serde(default)]
    pub schema_version: String,

    /// Unique identifier of the application.
    pub id: String,

    /// Application version.
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Root-level parameters shared by every module and resource.
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub parameters: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters_metadata: HashMap<String, FieldMeta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Module>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

impl Document {
    /// Deserialize a base descriptor from raw YAML bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        serde_yaml::from_slice(bytes).map_err(ModelError::Document)
    }

    /// Deserialize a base descriptor from a YAML string.
    pub fn from_str(source: &str) -> Result<Self, ModelError> {
        serde_yaml::from_str(source).map_err(ModelError::Document)
    }

    /// Look up a module by its exact, case-sensitive name.
    pub fn module_by_name(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.name == name)
    }

    /// Look up a resource by its exact, case-sensitive name.
    pub fn resource_by_name(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.name == name)
    }
}

/// A deployable unit of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Module {
    /// Module name, unique among the document's modules.
    pub name: String,

    /// Module type understood by the deployer (e.g. "nodejs").
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub module_type: String,

    /// Path to the module's sources or build result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub properties: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties_metadata: HashMap<String, FieldMeta>,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub parameters: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters_metadata: HashMap<String, FieldMeta>,

    /// Build-tool parameters. Build parameters carry no overwrite metadata;
    /// they are always overwritable.
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub build_parameters: Mapping,

    /// Additional content brought into the module, concatenated rather
    /// than merged.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<Include>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<ProvidedInterface>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiredInterface>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<Hook>,
}

impl Module {
    /// Look up a provided interface by its exact name.
    pub fn provided_by_name(&mut self, name: &str) -> Option<&mut ProvidedInterface> {
        self.provides.iter_mut().find(|p| p.name == name)
    }

    /// Look up a hook by its exact name.
    pub fn hook_by_name(&mut self, name: &str) -> Option<&mut Hook> {
        self.hooks.iter_mut().find(|h| h.name == name)
    }
}

/// An external service or configuration the application depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Resource {
    /// Resource name, unique among the document's resources.
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the resource takes part in deployment. `None` means the
    /// descriptor takes no explicit stance; extensions may set it either way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub properties: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties_metadata: HashMap<String, FieldMeta>,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub parameters: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters_metadata: HashMap<String, FieldMeta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiredInterface>,
}

/// A named capability a module exposes to the rest of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProvidedInterface {
    pub name: String,

    /// Whether the interface is visible outside the application.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub public: bool,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub properties: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties_metadata: HashMap<String, FieldMeta>,
}

/// A named dependency of a module, resource, or hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequiredInterface {
    pub name: String,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub properties: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties_metadata: HashMap<String, FieldMeta>,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub parameters: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters_metadata: HashMap<String, FieldMeta>,
}

/// A lifecycle command attached to a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Hook {
    /// Hook name, unique within its module.
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub hook_type: String,

    /// Deployment phases the hook runs in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<String>,

    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub parameters: Mapping,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub parameters_metadata: HashMap<String, FieldMeta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiredInterface>,
}

/// Content appended to a module's include list.
///
/// Includes are opaque to the merge: extension entries are concatenated
/// after base entries, never merged field-by-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Include {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

/// Entities that own required interfaces, resolvable by exact name.
pub trait RequiresOwner {
    fn required_by_name(&mut self, name: &str) -> Option<&mut RequiredInterface>;
}

impl RequiresOwner for Module {
    fn required_by_name(&mut self, name: &str) -> Option<&mut RequiredInterface> {
        self.requires.iter_mut().find(|r| r.name == name)
    }
}

impl RequiresOwner for Resource {
    fn required_by_name(&mut self, name: &str) -> Option<&mut RequiredInterface> {
        self.requires.iter_mut().find(|r| r.name == name)
    }
}

impl RequiresOwner for Hook {
    fn required_by_name(&mut self, name: &str) -> Option<&mut RequiredInterface> {
        self.requires.iter_mut().find(|r| r.name == name)
    }
}
