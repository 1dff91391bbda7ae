//! Descriptor merge engine
//!
//! Applies an extension descriptor to a base descriptor in a fixed
//! traversal order: root parameters, then each extended module (fields,
//! provided interfaces, required interfaces, hooks), then each extended
//! resource (active flag, fields, required interfaces). Modules and
//! resources are visited in the extension's declaration order.
//!
//! The merge is strictly additive with respect to named entities: an
//! extension may only extend modules, resources, interfaces, and hooks
//! that already exist in the base descriptor.
//!
//! On failure the base document is left partially merged; callers must
//! discard it. See [`merge_checked`] for the copy-on-success variant.

mod chain;
mod error;
mod extend;

pub use error::{MergeError, MergeErrorKind};
pub use extend::{extend_active, extend_includes, extend_mapping};

use chain::Chain;
use strata_model::{
    Document, ExtensionDocument, Module, ModuleExt, RequiredInterface, RequiresOwner, ResourceExt,
};
use tracing::debug;

/// Merge one extension descriptor into the base document, in place.
///
/// Returns the first error encountered, wrapped with the extension id and
/// the named entity it occurred in. A failed merge leaves `document` in an
/// indeterminate, partially merged state.
pub fn merge(document: &mut Document, extension: &ExtensionDocument) -> Result<(), MergeError> {
    debug!(extension = %extension.id, base = %document.id, "applying extension");

    Chain::new()
        .merge_fields(
            &mut document.parameters,
            Some(&document.parameters_metadata),
            &extension.parameters,
            || {
                format!(
                    "could not merge the parameters of the \"{}\" extension descriptor",
                    extension.id
                )
            },
        )
        .finish()?;

    merge_modules(document, &extension.modules).map_err(|e| {
        e.context(format!(
            "could not merge the modules of the \"{}\" extension descriptor",
            extension.id
        ))
    })?;

    merge_resources(document, &extension.resources).map_err(|e| {
        e.context(format!(
            "could not merge the resources of the \"{}\" extension descriptor",
            extension.id
        ))
    })?;

    Ok(())
}

/// Apply several extensions sequentially, stopping at the first failure.
///
/// Each extension merges against the document as already mutated by the
/// previous ones; there is no combined or reordered application.
pub fn merge_all(
    document: &mut Document,
    extensions: &[ExtensionDocument],
) -> Result<(), MergeError> {
    for extension in extensions {
        merge(document, extension)?;
    }
    Ok(())
}

/// Like [`merge_all`], but against a working copy: the document is only
/// updated if every extension applies cleanly.
pub fn merge_checked(
    document: &mut Document,
    extensions: &[ExtensionDocument],
) -> Result<(), MergeError> {
    let mut working = document.clone();
    merge_all(&mut working, extensions)?;
    *document = working;
    Ok(())
}

fn merge_modules(document: &mut Document, ext_modules: &[ModuleExt]) -> Result<(), MergeError> {
    for ext_module in ext_modules {
        let Some(module) = document.module_by_name(&ext_module.name) else {
            return Err(MergeError::unknown(format!(
                "\"{}\" module",
                ext_module.name
            )));
        };

        Chain::new()
            .merge_fields(
                &mut module.properties,
                Some(&module.properties_metadata),
                &ext_module.properties,
                || {
                    format!(
                        "could not merge the properties of the \"{}\" module",
                        ext_module.name
                    )
                },
            )
            .merge_fields(
                &mut module.parameters,
                Some(&module.parameters_metadata),
                &ext_module.parameters,
                || {
                    format!(
                        "could not merge the parameters of the \"{}\" module",
                        ext_module.name
                    )
                },
            )
            .merge_fields(
                &mut module.build_parameters,
                None,
                &ext_module.build_parameters,
                || {
                    format!(
                        "could not merge the build parameters of the \"{}\" module",
                        ext_module.name
                    )
                },
            )
            .append_includes(&mut module.includes, &ext_module.includes)
            .finish()?;

        merge_module_provides(module, ext_module)?;

        let module_name = ext_module.name.as_str();
        merge_requires(
            module,
            &ext_module.requires,
            |name| format!("\"{name}\" requires in the \"{module_name}\" module"),
            |name| {
                format!(
                    "could not merge the properties of the \"{name}\" requires in the \"{module_name}\" module"
                )
            },
            |name| {
                format!(
                    "could not merge the parameters of the \"{name}\" requires in the \"{module_name}\" module"
                )
            },
        )?;

        merge_module_hooks(module, ext_module)?;
    }
    Ok(())
}

fn merge_module_provides(module: &mut Module, ext_module: &ModuleExt) -> Result<(), MergeError> {
    for ext_provided in &ext_module.provides {
        let Some(provided) = module.provided_by_name(&ext_provided.name) else {
            return Err(MergeError::unknown(format!(
                "\"{}\" provides in the \"{}\" module",
                ext_provided.name, ext_module.name
            )));
        };

        Chain::new()
            .merge_fields(
                &mut provided.properties,
                Some(&provided.properties_metadata),
                &ext_provided.properties,
                || {
                    format!(
                        "could not merge the properties of the \"{}\" provides in the \"{}\" module",
                        ext_provided.name, ext_module.name
                    )
                },
            )
            .finish()?;
    }
    Ok(())
}

fn merge_module_hooks(module: &mut Module, ext_module: &ModuleExt) -> Result<(), MergeError> {
    for ext_hook in &ext_module.hooks {
        let Some(hook) = module.hook_by_name(&ext_hook.name) else {
            return Err(MergeError::unknown(format!(
                "\"{}\" hook in the \"{}\" module",
                ext_hook.name, ext_module.name
            )));
        };

        Chain::new()
            .merge_fields(
                &mut hook.parameters,
                Some(&hook.parameters_metadata),
                &ext_hook.parameters,
                || {
                    format!(
                        "could not merge the parameters of the \"{}\" hook in the \"{}\" module",
                        ext_hook.name, ext_module.name
                    )
                },
            )
            .finish()?;

        let hook_name = ext_hook.name.as_str();
        let module_name = ext_module.name.as_str();
        merge_requires(
            hook,
            &ext_hook.requires,
            |name| {
                format!(
                    "\"{name}\" requires in the \"{hook_name}\" hook of the \"{module_name}\" module"
                )
            },
            |name| {
                format!(
                    "could not merge the properties of the \"{name}\" requires in the \"{hook_name}\" hook of the \"{module_name}\" module"
                )
            },
            |name| {
                format!(
                    "could not merge the parameters of the \"{name}\" requires in the \"{hook_name}\" hook of the \"{module_name}\" module"
                )
            },
        )?;
    }
    Ok(())
}

fn merge_resources(
    document: &mut Document,
    ext_resources: &[ResourceExt],
) -> Result<(), MergeError> {
    for ext_resource in ext_resources {
        let Some(resource) = document.resource_by_name(&ext_resource.name) else {
            return Err(MergeError::unknown(format!(
                "\"{}\" resource",
                ext_resource.name
            )));
        };

        Chain::new()
            .set_active(&mut resource.active, ext_resource.active)
            .merge_fields(
                &mut resource.properties,
                Some(&resource.properties_metadata),
                &ext_resource.properties,
                || {
                    format!(
                        "could not merge the properties of the \"{}\" resource",
                        ext_resource.name
                    )
                },
            )
            .merge_fields(
                &mut resource.parameters,
                Some(&resource.parameters_metadata),
                &ext_resource.parameters,
                || {
                    format!(
                        "could not merge the parameters of the \"{}\" resource",
                        ext_resource.name
                    )
                },
            )
            .finish()?;

        let resource_name = ext_resource.name.as_str();
        merge_requires(
            resource,
            &ext_resource.requires,
            |name| format!("\"{name}\" requires in the \"{resource_name}\" resource"),
            |name| {
                format!(
                    "could not merge the properties of the \"{name}\" requires in the \"{resource_name}\" resource"
                )
            },
            |name| {
                format!(
                    "could not merge the parameters of the \"{name}\" requires in the \"{resource_name}\" resource"
                )
            },
        )?;
    }
    Ok(())
}

/// Merge the required-interface overlays of one owner (module, resource,
/// or hook). The context closures let each owner keep its own message
/// shape without duplicating the walk.
fn merge_requires<O: RequiresOwner>(
    owner: &mut O,
    ext_requires: &[RequiredInterface],
    unknown: impl Fn(&str) -> String,
    properties_context: impl Fn(&str) -> String,
    parameters_context: impl Fn(&str) -> String,
) -> Result<(), MergeError> {
    for ext_required in ext_requires {
        let Some(required) = owner.required_by_name(&ext_required.name) else {
            return Err(MergeError::unknown(unknown(&ext_required.name)));
        };

        Chain::new()
            .merge_fields(
                &mut required.properties,
                Some(&required.properties_metadata),
                &ext_required.properties,
                || properties_context(&ext_required.name),
            )
            .merge_fields(
                &mut required.parameters,
                Some(&required.parameters_metadata),
                &ext_required.parameters,
                || parameters_context(&ext_required.name),
            )
            .finish()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Document {
        Document::from_str(
            r#"
id: shop
parameters:
  region: eu
modules:
  - name: web
    properties:
      memory: 256M
    provides:
      - name: web-api
        properties:
          url: internal
    requires:
      - name: db-link
        parameters:
          pool: 5
    hooks:
      - name: warmup
        parameters:
          command: warmup.sh
        requires:
          - name: scheduler
resources:
  - name: db
    properties:
      host: db.internal
"#,
        )
        .unwrap()
    }

    fn ext(yaml: &str) -> ExtensionDocument {
        ExtensionDocument::from_str(yaml).unwrap()
    }

    #[test]
    fn full_traversal_applies_every_field_group() {
        let mut doc = base();
        let extension = ext(
            r#"
id: shop-dev
extends: shop
parameters:
  region: us
modules:
  - name: web
    properties:
      memory: 512M
    build-parameters:
      builder: npm
    includes:
      - name: extra
        path: extra.zip
    provides:
      - name: web-api
        properties:
          url: public
    requires:
      - name: db-link
        parameters:
          pool: 10
    hooks:
      - name: warmup
        parameters:
          command: fast-warmup.sh
        requires:
          - name: scheduler
            properties:
              cron: "* * * * *"
resources:
  - name: db
    active: true
    properties:
      host: db.dev.internal
"#,
        );

        merge(&mut doc, &extension).unwrap();

        assert_eq!(doc.parameters.get("region").unwrap().as_str(), Some("us"));

        let module = &doc.modules[0];
        assert_eq!(module.properties.get("memory").unwrap().as_str(), Some("512M"));
        assert_eq!(
            module.build_parameters.get("builder").unwrap().as_str(),
            Some("npm")
        );
        assert_eq!(module.includes.len(), 1);
        assert_eq!(
            module.provides[0].properties.get("url").unwrap().as_str(),
            Some("public")
        );
        assert_eq!(
            module.requires[0].parameters.get("pool").unwrap().as_u64(),
            Some(10)
        );
        assert_eq!(
            module.hooks[0].parameters.get("command").unwrap().as_str(),
            Some("fast-warmup.sh")
        );
        assert_eq!(
            module.hooks[0].requires[0]
                .properties
                .get("cron")
                .unwrap()
                .as_str(),
            Some("* * * * *")
        );

        let resource = &doc.resources[0];
        assert_eq!(resource.active, Some(true));
        assert_eq!(
            resource.properties.get("host").unwrap().as_str(),
            Some("db.dev.internal")
        );
    }

    #[test]
    fn unknown_module_aborts_with_context() {
        let mut doc = base();
        let extension = ext("id: e\nextends: shop\nmodules:\n  - name: ghost\n");

        let err = merge(&mut doc, &extension).unwrap_err();
        assert_eq!(err.kind(), MergeErrorKind::UnknownEntity);
        assert_eq!(
            err.to_string(),
            "could not merge the modules of the \"e\" extension descriptor: \
             the \"ghost\" module is defined in the extension descriptor but not in the base descriptor"
        );
    }

    #[test]
    fn unknown_hook_requires_names_the_full_path() {
        let mut doc = base();
        let extension = ext(
            r#"
id: e
extends: shop
modules:
  - name: web
    hooks:
      - name: warmup
        requires:
          - name: ghost
"#,
        );

        let err = merge(&mut doc, &extension).unwrap_err();
        assert!(err.to_string().contains(
            "the \"ghost\" requires in the \"warmup\" hook of the \"web\" module is defined"
        ));
    }

    #[test]
    fn root_parameter_error_names_the_extension() {
        let mut doc = base();
        doc.parameters_metadata.insert(
            "region".to_string(),
            strata_model::FieldMeta { overwritable: false },
        );
        let extension = ext("id: locked-ext\nextends: shop\nparameters:\n  region: us\n");

        let err = merge(&mut doc, &extension).unwrap_err();
        assert_eq!(
            err.to_string(),
            "could not merge the parameters of the \"locked-ext\" extension descriptor: \
             the \"region\" field is not overwritable"
        );
    }

    #[test]
    fn merge_checked_leaves_document_intact_on_failure() {
        let mut doc = base();
        let good = ext("id: a\nextends: shop\nparameters:\n  tier: gold\n");
        let bad = ext("id: b\nextends: shop\nresources:\n  - name: ghost\n");

        let err = merge_checked(&mut doc, &[good, bad]).unwrap_err();
        assert_eq!(err.kind(), MergeErrorKind::UnknownEntity);

        // Neither extension's changes are visible.
        assert!(doc.parameters.get("tier").is_none());
    }

    #[test]
    fn merge_all_layers_extensions_sequentially() {
        let mut doc = base();
        let first = ext("id: a\nextends: shop\nparameters:\n  region: us\n");
        let second = ext("id: b\nextends: shop\nparameters:\n  region: ap\n");

        merge_all(&mut doc, &[first, second]).unwrap();
        assert_eq!(doc.parameters.get("region").unwrap().as_str(), Some("ap"));
    }
}
