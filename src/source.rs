//! Source graph documents.
//!
//! Adapters hand the core one JSON document per dataset:
//!
//! ```json
//! { "nodes": [ { "_label": "Gene", "ids": ["HGNC:1100"], "names": ["BRCA1"] } ],
//!   "edges": [ { "_label": "CODES", "_source": "HGNC:1100", "_target": "HGNC:1101",
//!                "source": "GENCODE" } ] }
//! ```
//!
//! Every key of an edge other than `_label`, `_source` and `_target` is an
//! attribute. The same shape is used for the fused snapshot (`graph.json`).

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, unbounded};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{Entity, EntityKind};
use crate::error::{FusionResult, SourceError};
use crate::relationship::RelationLabel;
use crate::value::Attributes;

/// A relationship as an adapter describes it, before the store numbers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRecord {
    pub label: RelationLabel,
    pub source_ref: String,
    pub target_ref: String,
    pub attributes: Attributes,
}

impl RelationshipRecord {
    pub fn new(
        label: RelationLabel,
        source_ref: impl Into<String>,
        target_ref: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            label,
            source_ref: source_ref.into(),
            target_ref: target_ref.into(),
            attributes,
        }
    }
}

/// One dataset: entities first, then relationships referencing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceGraph {
    pub entities: Vec<Entity>,
    pub relationships: Vec<RelationshipRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    #[serde(rename = "_label")]
    label: String,
    ids: Vec<String>,
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeRecord {
    #[serde(rename = "_label")]
    label: String,
    #[serde(rename = "_source")]
    source: String,
    #[serde(rename = "_target")]
    target: String,
    #[serde(flatten)]
    attributes: Attributes,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

impl SourceGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a source graph document.
    ///
    /// # Errors
    /// - `SourceError::Json` if the text is not a graph document
    /// - `ValidationError` for unknown labels or malformed identifiers
    pub fn from_json_str(text: &str) -> FusionResult<Self> {
        Self::parse(text, Path::new("<memory>"))
    }

    /// Reads and parses a source graph document from disk.
    ///
    /// # Errors
    /// As [`SourceGraph::from_json_str`], plus `SourceError::Io`.
    pub fn from_path(path: &Path) -> FusionResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let graph = Self::parse(&text, path)?;
        debug!(
            path = %path.display(),
            entities = graph.entities.len(),
            relationships = graph.relationships.len(),
            "parsed source graph"
        );
        Ok(graph)
    }

    fn parse(text: &str, path: &Path) -> FusionResult<Self> {
        let document: GraphDocument =
            serde_json::from_str(text).map_err(|source| SourceError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let entities = document
            .nodes
            .into_iter()
            .map(|node| {
                let kind = EntityKind::from_label(&node.label)?;
                Entity::new(kind, node.ids, node.names)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let relationships = document
            .edges
            .into_iter()
            .map(|edge| {
                let label: RelationLabel = edge.label.parse()?;
                Ok(RelationshipRecord::new(label, edge.source, edge.target, edge.attributes))
            })
            .collect::<Result<Vec<_>, crate::error::ValidationError>>()?;

        Ok(Self {
            entities,
            relationships,
        })
    }

    /// Serializes this graph in the document format.
    ///
    /// # Errors
    /// `SourceError::Json` if an attribute cannot be encoded.
    pub fn to_json_string(&self) -> FusionResult<String> {
        let document = GraphDocument {
            nodes: self
                .entities
                .iter()
                .map(|entity| NodeRecord {
                    label: entity.kind().label().to_string(),
                    ids: entity.ids().iter().cloned().collect(),
                    names: entity.names().iter().cloned().collect(),
                })
                .collect(),
            edges: self
                .relationships
                .iter()
                .map(|rel| EdgeRecord {
                    label: rel.label.as_str().to_string(),
                    source: rel.source_ref.clone(),
                    target: rel.target_ref.clone(),
                    attributes: rel.attributes.clone(),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&document).map_err(|source| {
            SourceError::Json {
                path: PathBuf::from("<memory>"),
                source,
            }
            .into()
        })
    }
}

/// Parses several documents on worker threads.
///
/// Results come back in the order of `paths`; the first failing path (in that
/// order) is reported.
///
/// # Errors
/// Any error [`SourceGraph::from_path`] can return, or `SourceError::Worker`
/// if a worker could not be started or died.
pub fn load_sources_parallel(paths: &[PathBuf]) -> FusionResult<Vec<SourceGraph>> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }
    let workers = thread::available_parallelism()
        .map_or(1, std::num::NonZeroUsize::get)
        .min(paths.len());

    let (job_tx, job_rx) = bounded::<(usize, &Path)>(workers);
    let (result_tx, result_rx) = unbounded::<(usize, FusionResult<SourceGraph>)>();

    let spawned: Result<(), SourceError> = thread::scope(|scope| {
        for n in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            thread::Builder::new()
                .name(format!("biofusion-parse-{n}"))
                .spawn_scoped(scope, move || {
                    while let Ok((index, path)) = job_rx.recv() {
                        let parsed = SourceGraph::from_path(path);
                        if result_tx.send((index, parsed)).is_err() {
                            break;
                        }
                    }
                })
                .map_err(|e| SourceError::Worker {
                    message: e.to_string(),
                })?;
        }
        drop(job_rx);
        drop(result_tx);

        for (index, path) in paths.iter().enumerate() {
            if job_tx.send((index, path.as_path())).is_err() {
                break;
            }
        }
        drop(job_tx);
        Ok(())
    });
    spawned?;

    let mut slots: Vec<Option<FusionResult<SourceGraph>>> = paths.iter().map(|_| None).collect();
    for (index, parsed) in result_rx.try_iter() {
        slots[index] = Some(parsed);
    }

    slots
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| {
            slot.unwrap_or_else(|| {
                Err(SourceError::Worker {
                    message: format!("no result for {}", path.display()),
                }
                .into())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttrValue;

    const DOC: &str = r#"{
        "nodes": [
            {"_label": "Drug", "ids": ["DrugBank:DB00945"], "names": ["Aspirin"]},
            {"_label": "Gene", "ids": ["HGNC:9604", "Entrez:5743"], "names": ["PTGS2"]}
        ],
        "edges": [
            {"_label": "TARGETS", "_source": "DrugBank:DB00945", "_target": "HGNC:9604",
             "source": "DrugBank", "known_action": true, "actions": ["inhibitor"]}
        ]
    }"#;

    #[test]
    fn test_parse_document() {
        let graph = SourceGraph::from_json_str(DOC).unwrap();
        assert_eq!(graph.entities.len(), 2);
        assert_eq!(graph.entities[1].kind(), EntityKind::Gene);
        let rel = &graph.relationships[0];
        assert_eq!(rel.label, RelationLabel::Targets);
        assert_eq!(rel.source_ref, "DrugBank:DB00945");
        assert_eq!(rel.attributes.len(), 3);
        assert_eq!(rel.attributes["known_action"], AttrValue::Bool(true));
    }

    #[test]
    fn test_document_survives_reserialization() {
        let graph = SourceGraph::from_json_str(DOC).unwrap();
        let text = graph.to_json_string().unwrap();
        assert_eq!(SourceGraph::from_json_str(&text).unwrap(), graph);
    }

    #[test]
    fn test_unknown_labels_rejected() {
        let err = SourceGraph::from_json_str(r#"{"nodes":[{"_label":"Protein","ids":["UniProt:P1"]}]}"#)
            .unwrap_err();
        assert!(err.is_validation());

        let err = SourceGraph::from_json_str(
            r#"{"edges":[{"_label":"TREATS","_source":"A:1","_target":"B:1"}]}"#,
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_malformed_json_is_source_error() {
        let err = SourceGraph::from_json_str("{nodes").unwrap_err();
        assert!(err.is_source());
    }

    #[test]
    fn test_parallel_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..5 {
            let path = dir.path().join(format!("s{i}.json"));
            let doc = format!(r#"{{"nodes":[{{"_label":"Gene","ids":["HGNC:{i}"]}}]}}"#);
            fs::write(&path, doc).unwrap();
            paths.push(path);
        }

        let graphs = load_sources_parallel(&paths).unwrap();
        assert_eq!(graphs.len(), 5);
        for (i, graph) in graphs.iter().enumerate() {
            assert!(graph.entities[0].has_id(&format!("HGNC:{i}")));
        }
    }

    #[test]
    fn test_parallel_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sources_parallel(&[dir.path().join("absent.json")]).unwrap_err();
        assert!(err.is_source());
    }
}
