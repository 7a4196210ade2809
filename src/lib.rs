//! # biofusion - entity-resolving fusion of biomedical reference graphs
//!
//! biofusion takes graphs produced from heterogeneous biomedical datasets
//! (drug, gene, disease, variant and regulatory-RNA catalogs), merges records
//! that describe the same real-world thing under different identifier schemes,
//! and writes the fused result as a bulk-load file set for a property graph
//! database.
//!
//! ## Core Concepts
//!
//! - **Entity**: a typed record known by a set of namespaced identifiers
//! - **Relationship**: a typed, directed, attributed link between two identifiers
//! - **IdentityResolver**: the alias table that merges entities on insert
//! - **RelationshipIndex**: label / source / target indices over relationships
//! - **FusionPipeline**: load, augment, deduplicate, prune
//! - **BulkExporter**: node and per-label relationship tables plus load scripts
//!
//! ## Usage
//!
//! ```rust
//! use biofusion::{Entity, EntityKind, FusionPipeline, RelationLabel, SourceGraph};
//! use biofusion::source::RelationshipRecord;
//! use biofusion::value::attributes;
//!
//! let drugbank = SourceGraph {
//!     entities: vec![
//!         Entity::new(EntityKind::Drug, ["DrugBank:DB00945"], ["Aspirin"])?,
//!         Entity::new(EntityKind::Gene, ["HGNC:9605"], ["PTGS2"])?,
//!     ],
//!     relationships: vec![RelationshipRecord::new(
//!         RelationLabel::Targets,
//!         "DrugBank:DB00945",
//!         "HGNC:9605",
//!         attributes([("source", "DrugBank".into())]),
//!     )],
//! };
//! let hgnc = SourceGraph {
//!     entities: vec![Entity::new(EntityKind::Gene, ["HGNC:9605", "Entrez:5743"], ["PTGS2"])?],
//!     relationships: vec![],
//! };
//!
//! let mut pipeline = FusionPipeline::new();
//! let report = pipeline.run(&[drugbank, hgnc], None)?;
//! assert_eq!(report.merges, 1);
//! assert!(pipeline.store().entity_for("Entrez:5743").is_some());
//! # Ok::<(), biofusion::FusionError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod entity;
pub mod error;
pub mod identifier;
pub mod relationship;
pub mod value;

// Store
pub mod index;
pub mod resolver;
pub mod store;

// Pipeline and I/O
pub mod config;
pub mod export;
pub mod mapping;
pub mod pipeline;
pub mod source;

// Re-export primary types at crate root for convenience
pub use config::{ExportConfig, FusionConfig, LoaderConfig, MappingConfig};
pub use entity::{Entity, EntityKey, EntityKind};
pub use error::{
    ConsistencyError, ExportError, FusionError, FusionResult, PipelineError, SourceError,
    ValidationError,
};
pub use export::{BulkExporter, ExportSummary};
pub use index::RelationshipIndex;
pub use mapping::{CrossVocabularyTable, Equivalence};
pub use pipeline::{FusionPipeline, FusionReport, Stage};
pub use relationship::{RelationLabel, Relationship, SequenceId};
pub use resolver::{IdentityResolver, InsertOutcome};
pub use source::{load_sources_parallel, SourceGraph};
pub use store::{GraphStore, StoreStats};
pub use value::{AttrValue, Attributes};
