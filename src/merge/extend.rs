//! Generic field-map merge
//!
//! Merge semantics, applied per key in extension declaration order:
//! - no current value, or an explicit null on either side: replace
//! - both values are mappings: recurse (metadata never applies below the
//!   top level of an entity's field map)
//! - exactly one side is a mapping: shape-conflict error
//! - anything else, lists included: replace (include lists are the one
//!   exception, handled by [`extend_includes`])
//!
//! The merge is fail-fast but not transactional: keys earlier in the
//! extension map stay applied when a later key fails.

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

use strata_model::{FieldMeta, Include};

use super::error::{key_display, MergeError};

/// Decide whether an extension may write `field` into `current`.
///
/// Protection is opt-in and only applies to an actual override: the field
/// must already hold a non-null value AND carry a metadata entry AND that
/// entry must mark it non-overwritable. A first assignment is always
/// allowed, metadata or not.
pub(crate) fn is_overwritable(
    field: &Value,
    meta: Option<&HashMap<String, FieldMeta>>,
    current: &Mapping,
) -> bool {
    let Some(meta) = meta else {
        return true;
    };
    let has_value = matches!(current.get(field), Some(v) if !v.is_null());
    if !has_value {
        return true;
    }
    match field.as_str().and_then(|name| meta.get(name)) {
        Some(entry) => entry.overwritable,
        None => true,
    }
}

/// Merge `ext` into `base`, consulting `meta` for top-level overwrite
/// protection. Stops at the first failing key.
pub fn extend_mapping(
    base: &mut Mapping,
    meta: Option<&HashMap<String, FieldMeta>>,
    ext: &Mapping,
) -> Result<(), MergeError> {
    for (key, ext_value) in ext {
        if !is_overwritable(key, meta, base) {
            return Err(MergeError::NotOverwritable(key_display(key)));
        }
        merge_entry(base, key, ext_value)?;
    }
    Ok(())
}

/// Merge a single key of the extension map into the base map.
fn merge_entry(base: &mut Mapping, key: &Value, ext_value: &Value) -> Result<(), MergeError> {
    let current_is_set = matches!(base.get(key), Some(v) if !v.is_null());
    let current_is_mapping = matches!(base.get(key), Some(Value::Mapping(_)));
    let ext_is_mapping = ext_value.is_mapping();

    if !current_is_set || ext_value.is_null() || (!current_is_mapping && !ext_is_mapping) {
        // First assignment, explicit null on either side, or two
        // unstructured values: the extension value replaces wholesale.
        base.insert(key.clone(), ext_value.clone());
    } else if current_is_mapping && ext_is_mapping {
        let current = base.get_mut(key).and_then(Value::as_mapping_mut);
        if let (Some(current), Some(ext)) = (current, ext_value.as_mapping()) {
            extend_mapping(current, None, ext).map_err(|e| e.under_key(key))?;
        }
    } else if current_is_mapping {
        return Err(MergeError::StructuredOverScalar(key_display(key)));
    } else {
        return Err(MergeError::ScalarOverStructured(key_display(key)));
    }
    Ok(())
}

/// Append the extension's includes after the base's, preserving both
/// orders. Never fails and never deduplicates.
pub fn extend_includes(base: &mut Vec<Include>, ext: &[Include]) {
    base.extend_from_slice(ext);
}

/// Replace a tri-state flag if the extension takes an explicit stance.
pub fn extend_active(base: &mut Option<bool>, ext: Option<bool>) {
    if let Some(flag) = ext {
        *base = Some(flag);
    }
}
