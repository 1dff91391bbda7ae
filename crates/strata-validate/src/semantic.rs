//! Semantic checks over parsed descriptors.
//!
//! These run after deserialization succeeded and therefore see the typed
//! model; the raw source is only consulted for line attribution.

use std::collections::HashMap;
use std::collections::HashSet;

use serde_yaml::Mapping;
use strata_model::{Document, ExtensionDocument, FieldMeta, Module, Resource};

use crate::{is_valid_name, line_of, ValidationIssue};

/// Semantic validation of a parsed base descriptor.
pub fn validate_parsed_document(document: &Document, source: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_identifier(&document.id, "id", source, &mut issues);
    check_metadata(
        &document.parameters,
        &document.parameters_metadata,
        "parameters",
        &format!("the \"{}\" descriptor", document.id),
        source,
        &mut issues,
    );

    check_duplicates(
        document.modules.iter().map(|m| m.name.as_str()),
        "module",
        source,
        &mut issues,
    );
    check_duplicates(
        document.resources.iter().map(|r| r.name.as_str()),
        "resource",
        source,
        &mut issues,
    );

    for module in &document.modules {
        check_module(module, source, &mut issues);
    }
    for resource in &document.resources {
        check_resource(resource, source, &mut issues);
    }

    issues
}

/// Semantic validation of a parsed extension descriptor.
pub fn validate_parsed_extension(
    extension: &ExtensionDocument,
    source: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_identifier(&extension.id, "id", source, &mut issues);
    check_identifier(&extension.extends, "extends", source, &mut issues);

    check_duplicates(
        extension.modules.iter().map(|m| m.name.as_str()),
        "module",
        source,
        &mut issues,
    );
    check_duplicates(
        extension.resources.iter().map(|r| r.name.as_str()),
        "resource",
        source,
        &mut issues,
    );

    issues
}

fn check_module(module: &Module, source: &str, issues: &mut Vec<ValidationIssue>) {
    let owner = format!("the \"{}\" module", module.name);

    check_name(&module.name, "module", source, issues);
    check_metadata(
        &module.properties,
        &module.properties_metadata,
        "properties",
        &owner,
        source,
        issues,
    );
    check_metadata(
        &module.parameters,
        &module.parameters_metadata,
        "parameters",
        &owner,
        source,
        issues,
    );

    check_duplicates(
        module.provides.iter().map(|p| p.name.as_str()),
        "provides",
        source,
        issues,
    );
    check_duplicates(
        module.requires.iter().map(|r| r.name.as_str()),
        "requires",
        source,
        issues,
    );
    check_duplicates(
        module.hooks.iter().map(|h| h.name.as_str()),
        "hook",
        source,
        issues,
    );
}

fn check_resource(resource: &Resource, source: &str, issues: &mut Vec<ValidationIssue>) {
    let owner = format!("the \"{}\" resource", resource.name);

    check_name(&resource.name, "resource", source, issues);
    check_metadata(
        &resource.properties,
        &resource.properties_metadata,
        "properties",
        &owner,
        source,
        issues,
    );
    check_metadata(
        &resource.parameters,
        &resource.parameters_metadata,
        "parameters",
        &owner,
        source,
        issues,
    );

    check_duplicates(
        resource.requires.iter().map(|r| r.name.as_str()),
        "requires",
        source,
        issues,
    );
}

fn check_identifier(value: &str, field: &str, source: &str, issues: &mut Vec<ValidationIssue>) {
    if value.is_empty() {
        issues.push(ValidationIssue {
            message: format!("the descriptor does not define \"{field}\""),
            line: 1,
        });
    } else if !is_valid_name(value) {
        issues.push(ValidationIssue {
            message: format!("\"{value}\" is not a valid \"{field}\" identifier"),
            line: line_of(source, value),
        });
    }
}

fn check_name(value: &str, kind: &str, source: &str, issues: &mut Vec<ValidationIssue>) {
    if !is_valid_name(value) {
        issues.push(ValidationIssue {
            message: format!("\"{value}\" is not a valid {kind} name"),
            line: line_of(source, value),
        });
    }
}

fn check_duplicates<'a>(
    names: impl Iterator<Item = &'a str>,
    kind: &str,
    source: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            issues.push(ValidationIssue {
                message: format!("the \"{name}\" {kind} is defined more than once"),
                line: line_of(source, name),
            });
        }
    }
}

/// A metadata table may only talk about fields its map actually defines;
/// a dangling entry is almost always a typo that silently disables the
/// intended protection.
fn check_metadata(
    fields: &Mapping,
    metadata: &HashMap<String, FieldMeta>,
    table: &str,
    owner: &str,
    source: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for field in metadata.keys() {
        if !fields.contains_key(field.as_str()) {
            issues.push(ValidationIssue {
                message: format!(
                    "the \"{field}\" field has overwrite metadata in {owner} but is not defined in its {table}"
                ),
                line: line_of(source, field),
            });
        }
    }
}
