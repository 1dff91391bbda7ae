//! File-based pipeline tests
//!
//! Drives the loader end to end: descriptor files on disk, sequential
//! extension application, provenance reporting, and re-parsing of the
//! serialized merge result.

use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use strata_descriptor::{load_and_merge, Document, SourceRole};

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

const BASE: &str = r#"
id: shop
version: 1.0.0
parameters:
  region: eu
modules:
  - name: web
    type: nodejs
    properties:
      memory: 256M
resources:
  - name: db
    type: postgres
    properties:
      host: db.internal
"#;

#[test]
fn two_extensions_layer_in_command_order() {
    let base = write_temp(BASE);
    let staging = write_temp(
        r#"
id: shop-staging
extends: shop
parameters:
  region: us
modules:
  - name: web
    properties:
      memory: 512M
"#,
    );
    let spike = write_temp(
        r#"
id: shop-load-spike
extends: shop
modules:
  - name: web
    properties:
      memory: 1G
resources:
  - name: db
    active: true
"#,
    );

    let report = load_and_merge(
        base.path(),
        &[
            staging.path().to_path_buf(),
            spike.path().to_path_buf(),
        ],
    )
    .unwrap();

    // The later extension wins where both touch the same field.
    let memory = report.document.modules[0].properties.get("memory").unwrap();
    assert_eq!(memory.as_str(), Some("1G"));
    assert_eq!(report.document.parameters.get("region").unwrap().as_str(), Some("us"));
    assert_eq!(report.document.resources[0].active, Some(true));

    // Provenance lists every contributing file in application order.
    let roles: Vec<SourceRole> = report.sources.iter().map(|s| s.role).collect();
    assert_eq!(
        roles,
        [SourceRole::Base, SourceRole::Extension, SourceRole::Extension]
    );
    assert!(report.sources.iter().all(|s| s.digest.len() == 64));
}

#[test]
fn merged_output_round_trips_through_the_model() {
    let base = write_temp(BASE);
    let ext = write_temp(
        "id: e\nextends: shop\nmodules:\n  - name: web\n    properties:\n      instances: 3\n",
    );

    let report = load_and_merge(base.path(), &[ext.path().to_path_buf()]).unwrap();

    let yaml = serde_yaml::to_string(&report.document).unwrap();
    let reparsed = Document::from_str(&yaml).unwrap();
    assert_eq!(reparsed, report.document);
}

#[test]
fn failing_extension_reports_its_position_in_the_chain() {
    let base = write_temp(BASE);
    let good = write_temp("id: good\nextends: shop\nparameters:\n  tier: gold\n");
    let bad = write_temp("id: bad\nextends: shop\nmodules:\n  - name: ghost\n");

    let err = load_and_merge(
        base.path(),
        &[good.path().to_path_buf(), bad.path().to_path_buf()],
    )
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("could not merge the modules of the \"bad\" extension descriptor"));
    assert!(message.contains("\"ghost\" module"));
}

#[test]
fn unreadable_extension_path_fails_before_any_merge() {
    let base = write_temp(BASE);
    let missing = PathBuf::from("/nonexistent/shop-dev.yaml");

    let err = load_and_merge(base.path(), &[missing]).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/shop-dev.yaml"));
}
