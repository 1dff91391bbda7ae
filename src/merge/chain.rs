//! Fail-fast sequencing of per-entity merge steps.
//!
//! Each entity merge builds its own [`Chain`], runs the field-group steps
//! in order, and collects at most one error. Once a step fails, every
//! later step in the same chain is a no-op. Context strings are built
//! lazily so the formatting cost is only paid on failure.

use serde_yaml::Mapping;
use std::collections::HashMap;

use strata_model::{FieldMeta, Include};

use super::error::MergeError;
use super::extend::{extend_active, extend_includes, extend_mapping};

/// One entity's merge sequence. Not reusable across entities.
pub(crate) struct Chain {
    err: Option<MergeError>,
}

impl Chain {
    pub fn new() -> Self {
        Chain { err: None }
    }

    /// Merge one field map, wrapping any failure with `context`.
    pub fn merge_fields(
        mut self,
        base: &mut Mapping,
        meta: Option<&HashMap<String, FieldMeta>>,
        ext: &Mapping,
        context: impl FnOnce() -> String,
    ) -> Self {
        if self.err.is_none() {
            if let Err(e) = extend_mapping(base, meta, ext) {
                self.err = Some(e.context(context()));
            }
        }
        self
    }

    /// Concatenate include lists. Infallible, but skipped after a failure
    /// so a broken chain applies nothing further.
    pub fn append_includes(mut self, base: &mut Vec<Include>, ext: &[Include]) -> Self {
        if self.err.is_none() {
            extend_includes(base, ext);
        }
        self
    }

    /// Apply a tri-state flag override. Infallible, skipped after a failure.
    pub fn set_active(mut self, base: &mut Option<bool>, ext: Option<bool>) -> Self {
        if self.err.is_none() {
            extend_active(base, ext);
        }
        self
    }

    pub fn finish(self) -> Result<(), MergeError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn clean_chain_applies_every_step() {
        let mut first = mapping("a: 1");
        let mut second = Mapping::new();
        let mut active = None;

        Chain::new()
            .merge_fields(&mut first, None, &mapping("a: 2"), || "first".to_string())
            .merge_fields(&mut second, None, &mapping("b: 3"), || "second".to_string())
            .set_active(&mut active, Some(true))
            .finish()
            .unwrap();

        assert_eq!(first.get("a").unwrap().as_u64(), Some(2));
        assert_eq!(second.get("b").unwrap().as_u64(), Some(3));
        assert_eq!(active, Some(true));
    }

    #[test]
    fn steps_after_a_failure_are_skipped() {
        let mut structured = mapping("env:\n  a: 1");
        let mut untouched = mapping("x: 1");
        let mut includes = vec![];
        let mut active = None;

        let err = Chain::new()
            .merge_fields(&mut structured, None, &mapping("env: flat"), || {
                "step one".to_string()
            })
            .merge_fields(&mut untouched, None, &mapping("x: 2"), || {
                "step two".to_string()
            })
            .append_includes(
                &mut includes,
                &[Include {
                    name: "late.zip".to_string(),
                    path: String::new(),
                }],
            )
            .set_active(&mut active, Some(false))
            .finish()
            .unwrap_err();

        // Only the first error is reported, with its own context.
        assert!(err.to_string().starts_with("step one: "));

        // Later steps never ran.
        assert_eq!(untouched.get("x").unwrap().as_u64(), Some(1));
        assert!(includes.is_empty());
        assert_eq!(active, None);
    }

    #[test]
    fn context_is_not_built_on_success() {
        let mut base = mapping("a: 1");
        Chain::new()
            .merge_fields(&mut base, None, &mapping("a: 2"), || {
                panic!("context must only be formatted on failure")
            })
            .finish()
            .unwrap();
    }
}
