// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `Chunk` data model: an opaque byte payload plus provenance.

use serde::{Deserialize, Serialize};

/// The kind of source a chunk originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A git repository (history walking happens outside the core).
    Git,
    /// A local filesystem path.
    Filesystem,
    /// Raw bytes read from stdin.
    Stdin,
    /// A Postman-style workspace/collection API.
    Postman,
    /// Any other SaaS API source not modeled explicitly.
    Other,
}

/// Sum-typed provenance metadata. Each variant is sufficient to locate the
/// chunk's origin precisely enough for a finding to link back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetaData {
    /// A git commit, file, and line.
    Git {
        /// Commit hash.
        commit: String,
        /// Repository-relative file path.
        file: String,
        /// 1-based line number, if known.
        line: Option<u64>,
    },
    /// A filesystem path and line.
    Filesystem {
        /// Absolute or repo-relative path.
        path: String,
        /// 1-based line number, if known.
        line: Option<u64>,
    },
    /// An API-extracted link with location breadcrumb, used by the
    /// Postman-style adapter (spec §4.7).
    ApiExtraction {
        /// Fully qualified link back to the originating resource.
        link: String,
        /// Workspace ID.
        workspace_id: String,
        /// Collection ID.
        collection_id: String,
        /// Folder path within the collection, joined with `/`.
        folder_path: String,
        /// Request ID, if the chunk came from a specific request.
        request_id: Option<String>,
        /// Which field on the request/folder this chunk was read from.
        location_type: ApiLocationType,
    },
    /// No further provenance is available.
    Unknown,
}

/// Where within an API-extracted unit a chunk's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiLocationType {
    /// A request or collection variable.
    Variable,
    /// An HTTP header value.
    Header,
    /// A request URL.
    Url,
    /// A request or example body.
    Body,
    /// An auth block (basic/bearer/apikey/awsv4/oauth2).
    Auth,
    /// A pre-request or test script body.
    Script,
    /// A workspace, collection, or folder name.
    Name,
}

/// An opaque byte payload plus provenance, the unit of work flowing
/// through the pipeline. Chunks are immutable once emitted.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Raw bytes. Typically borrowed from a pooled buffer; the pipeline
    /// copies into a finding's raw field before the chunk is recycled.
    pub data: Vec<u8>,
    /// Which kind of source produced this chunk.
    pub source_type: SourceType,
    /// Human-readable source name (e.g. repo URL, workspace name).
    pub source_name: String,
    /// Stable integer ID for the source instance.
    pub source_id: i64,
    /// The job this chunk belongs to.
    pub job_id: i64,
    /// Whether detectors should attempt live verification on matches
    /// extracted from this chunk.
    pub verify: bool,
    /// Provenance metadata.
    pub meta: MetaData,
}

impl Chunk {
    /// Construct a chunk with [`MetaData::Unknown`] provenance — a
    /// convenience for sources (tests, stdin) that don't track location.
    #[must_use]
    pub fn new(data: Vec<u8>, source_type: SourceType, source_name: impl Into<String>) -> Self {
        Self {
            data,
            source_type,
            source_name: source_name.into(),
            source_id: 0,
            job_id: 0,
            verify: false,
            meta: MetaData::Unknown,
        }
    }

    /// Builder-style setter for provenance metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: MetaData) -> Self {
        self.meta = meta;
        self
    }

    /// Builder-style setter for identity fields.
    #[must_use]
    pub fn with_ids(mut self, source_id: i64, job_id: i64) -> Self {
        self.source_id = source_id;
        self.job_id = job_id;
        self
    }

    /// Builder-style setter for the verify flag.
    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

/// A source-defined unit of work (a repository, a collection, a
/// workspace, stdin). Each unit has a stable ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceUnitId(pub String);

impl SourceUnitId {
    /// Wrap a string as a unit ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for SourceUnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source-defined unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Stable identifier.
    pub id: SourceUnitId,
    /// Human-readable label (repo path, collection name, "stdin").
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_builder_sets_fields() {
        let chunk = Chunk::new(b"hello".to_vec(), SourceType::Filesystem, "local")
            .with_ids(7, 42)
            .with_verify(true)
            .with_meta(MetaData::Filesystem {
                path: "a.txt".into(),
                line: Some(3),
            });
        assert_eq!(chunk.source_id, 7);
        assert_eq!(chunk.job_id, 42);
        assert!(chunk.verify);
        assert_eq!(
            chunk.meta,
            MetaData::Filesystem {
                path: "a.txt".into(),
                line: Some(3)
            }
        );
    }

    #[test]
    fn unit_id_displays_inner_string() {
        let id = SourceUnitId::new("ws-123");
        assert_eq!(id.to_string(), "ws-123");
    }

    #[test]
    fn metadata_serde_roundtrip_api_extraction() {
        let meta = MetaData::ApiExtraction {
            link: "https://example.com".into(),
            workspace_id: "w1".into(),
            collection_id: "c1".into(),
            folder_path: "auth/login".into(),
            request_id: Some("r1".into()),
            location_type: ApiLocationType::Header,
        };
        let json = serde_json::to_string(&meta).unwrap();
        let back: MetaData = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }
}
