//! EC2 instance-metadata documents and their path resolution.
//!
//! A metadata document is a tree of string leaves under string keys. Path
//! resolution reproduces the real metadata service's semantics, including its
//! two notorious quirks: a directory key may be written with a trailing slash
//! (`"placement/"`), and a string value short-circuits resolution even when
//! path segments remain after it.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CfnLocalError, Result};

/// Metadata document served when no per-resource override is configured.
const DEFAULT_METADATA: &str = include_str!("../../embedded/default_metadata.json");

/// One node of a metadata document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataNode {
    /// Terminal string value.
    Leaf(String),
    /// Directory of child nodes, in document order.
    Branch(IndexMap<String, MetadataNode>),
}

impl MetadataNode {
    /// Parse a metadata document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CfnLocalError::MetadataParse { reason: e.to_string() })
    }

    /// Resolve a slash-delimited request path against this document.
    ///
    /// Descends one segment at a time. Each segment is looked up as written
    /// and, failing that, with a `/` suffix — the two forms are aliases for
    /// the same node. A `Leaf` reached at any point returns its value
    /// immediately, remaining segments or not. A `Branch` reached at the end
    /// of the path (including the empty path) returns its keys joined by
    /// newlines, in document order.
    pub fn resolve(&self, path: &str) -> Result<String> {
        let path = path.trim_matches('/');
        let mut node = self;
        if !path.is_empty() {
            for segment in path.split('/') {
                let children = match node {
                    MetadataNode::Leaf(value) => return Ok(value.clone()),
                    MetadataNode::Branch(children) => children,
                };
                node = children
                    .get(segment)
                    .or_else(|| children.get(&format!("{}/", segment)))
                    .ok_or_else(|| CfnLocalError::MetadataNotFound { path: path.to_string() })?;
            }
        }
        match node {
            MetadataNode::Leaf(value) => Ok(value.clone()),
            MetadataNode::Branch(children) => {
                Ok(children.keys().map(String::as_str).collect::<Vec<_>>().join("\n"))
            }
        }
    }
}

/// Per-resource metadata document sources.
///
/// Maps a resource logical id to a metadata file path; resources without an
/// override fall back to the bundled default document.
#[derive(Debug, Clone, Default)]
pub struct MetadataSources {
    paths: IndexMap<String, PathBuf>,
}

impl MetadataSources {
    /// Build from explicit per-resource overrides.
    pub fn new(paths: IndexMap<String, PathBuf>) -> Self {
        Self { paths }
    }

    /// Raw metadata JSON for the given resource.
    pub fn metadata_for(&self, resource: &str) -> Result<String> {
        match self.paths.get(resource) {
            Some(path) => {
                debug!(resource, path = %path.display(), "Using metadata override");
                std::fs::read_to_string(path).map_err(|e| CfnLocalError::MetadataFileRead {
                    path: path.clone(),
                    source: e,
                })
            }
            None => Ok(DEFAULT_METADATA.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Write;

    fn doc(json: &str) -> MetadataNode {
        MetadataNode::from_json(json).unwrap()
    }

    #[test]
    fn test_resolve_key_returns_value() {
        assert_eq!(doc(r#"{"foo": "bar"}"#).resolve("foo").unwrap(), "bar");
    }

    #[test]
    fn test_resolve_missing_key_is_not_found() {
        let err = doc(r#"{"foo": "bar"}"#).resolve("baz").unwrap_err();
        assert!(matches!(err, CfnLocalError::MetadataNotFound { .. }));
    }

    #[test]
    fn test_resolve_string_short_circuits_remaining_segments() {
        assert_eq!(doc(r#"{"foo": "bar"}"#).resolve("foo/biz").unwrap(), "bar");
    }

    #[test]
    fn test_resolve_branch_lists_keys() {
        let listing = doc(r#"{"foo": {"bar": "baz", "biz": "bur"}}"#).resolve("foo").unwrap();
        let keys: BTreeSet<_> = listing.split('\n').collect();
        assert_eq!(keys, BTreeSet::from(["bar", "biz"]));
    }

    #[test]
    fn test_resolve_empty_path_lists_top_level_keys_in_document_order() {
        let listing = doc(r#"{"zeta": "1", "alpha": {"x": "y"}}"#).resolve("").unwrap();
        assert_eq!(listing, "zeta\nalpha");
    }

    #[test]
    fn test_resolve_strips_leading_and_trailing_slashes() {
        let document = doc(r#"{"foo": {"bar": "baz"}}"#);
        assert_eq!(document.resolve("/foo/bar/").unwrap(), "baz");
    }

    #[test]
    fn test_resolve_accepts_trailing_slash_alias_keys() {
        let document = doc(r#"{"placement/": {"availability-zone": "us-east-1a"}}"#);
        assert_eq!(document.resolve("placement/availability-zone").unwrap(), "us-east-1a");
    }

    #[test]
    fn test_resolve_bare_key_wins_over_alias_lookup() {
        let document = doc(r#"{"foo": "bare", "foo/": {"x": "y"}}"#);
        assert_eq!(document.resolve("foo").unwrap(), "bare");
    }

    #[test]
    fn test_resolve_nested_descent() {
        let document = doc(r#"{"latest": {"meta-data": {"instance-id": "i-123"}}}"#);
        assert_eq!(document.resolve("latest/meta-data/instance-id").unwrap(), "i-123");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let document = doc(r#"{"foo": {"bar": "baz", "biz": "bur"}}"#);
        assert_eq!(document.resolve("foo").unwrap(), document.resolve("foo").unwrap());
    }

    #[test]
    fn test_default_metadata_parses_and_resolves() {
        let document = MetadataNode::from_json(DEFAULT_METADATA).unwrap();
        let instance_id = document.resolve("latest/meta-data/instance-id").unwrap();
        assert!(instance_id.starts_with("i-"));
    }

    #[test]
    fn test_sources_fall_back_to_default() {
        let sources = MetadataSources::default();
        assert_eq!(sources.metadata_for("AnyResource").unwrap(), DEFAULT_METADATA);
    }

    #[test]
    fn test_sources_use_override_when_present() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"custom": "doc"}}"#).unwrap();

        let mut paths = IndexMap::new();
        paths.insert("Web".to_string(), file.path().to_path_buf());
        let sources = MetadataSources::new(paths);

        assert_eq!(sources.metadata_for("Web").unwrap(), r#"{"custom": "doc"}"#);
        assert_eq!(sources.metadata_for("Other").unwrap(), DEFAULT_METADATA);
    }

    #[test]
    fn test_sources_missing_override_file_is_an_error() {
        let mut paths = IndexMap::new();
        paths.insert("Web".to_string(), PathBuf::from("/nonexistent/metadata.json"));
        let sources = MetadataSources::new(paths);
        let err = sources.metadata_for("Web").unwrap_err();
        assert!(matches!(err, CfnLocalError::MetadataFileRead { .. }));
    }
}
