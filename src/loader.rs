//! Descriptor file loading with provenance
//!
//! Reads base and extension descriptors from disk, records where each
//! contributing file came from (path, SHA-256 digest, load time), and
//! drives the sequential merge. The provenance list ends up in the CLI's
//! merge report so a deployment can be traced back to the exact bytes
//! that produced it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use strata_model::{Document, ExtensionDocument, ModelError};

use crate::merge::{merge, MergeError};

/// Role a file played in producing the merged document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    Base,
    Extension,
}

/// Provenance of one contributing descriptor file.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorSource {
    pub role: SourceRole,

    pub path: String,

    /// SHA-256 digest of the raw file bytes.
    pub digest: String,

    pub loaded_at: DateTime<Utc>,
}

/// Outcome of [`load_and_merge`]: the merged document plus the provenance
/// of every file that contributed to it, in application order.
#[derive(Debug)]
pub struct MergeReport {
    pub document: Document,
    pub sources: Vec<DescriptorSource>,
}

/// Errors from loading or merging descriptor files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not read \"{path}\"")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Load a base descriptor from a YAML file.
pub fn load_document(path: &Path) -> Result<(Document, DescriptorSource), LoadError> {
    let (bytes, source) = read_with_digest(path, SourceRole::Base)?;
    let document = Document::from_slice(&bytes)?;
    debug!(path = %source.path, digest = %source.digest, "loaded base descriptor");
    Ok((document, source))
}

/// Load an extension descriptor from a YAML file.
pub fn load_extension(path: &Path) -> Result<(ExtensionDocument, DescriptorSource), LoadError> {
    let (bytes, source) = read_with_digest(path, SourceRole::Extension)?;
    let extension = ExtensionDocument::from_slice(&bytes)?;
    debug!(path = %source.path, digest = %source.digest, "loaded extension descriptor");
    Ok((extension, source))
}

/// Load the base descriptor, apply each extension file in the given order,
/// and return the merged document with full provenance.
pub fn load_and_merge(base_path: &Path, extension_paths: &[PathBuf]) -> Result<MergeReport, LoadError> {
    let (mut document, base_source) = load_document(base_path)?;
    let mut sources = vec![base_source];

    for path in extension_paths {
        let (extension, source) = load_extension(path)?;
        merge(&mut document, &extension)?;
        info!(extension = %extension.id, path = %source.path, "extension applied");
        sources.push(source);
    }

    Ok(MergeReport { document, sources })
}

fn read_with_digest(
    path: &Path,
    role: SourceRole,
) -> Result<(Vec<u8>, DescriptorSource), LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let source = DescriptorSource {
        role,
        path: path.display().to_string(),
        digest,
        loaded_at: Utc::now(),
    };
    Ok((bytes, source))
}
