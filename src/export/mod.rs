//! Bulk export of the fused graph.
//!
//! The exporter writes a file set a property-graph bulk loader can ingest:
//!
//! - `nodes.csv`: one row per entity (`_id:ID(Node-ID)`, `ids:string[]`,
//!   `names:string[]`, `:LABEL`);
//! - `rel_<LABEL>.csv`: one table per relationship label present, with the
//!   columns declared in [`schema`];
//! - `create_indices.cypher`: a uniqueness constraint per entity kind;
//! - `import_admin.sh` / `import_admin.bat`: the loader invocation;
//! - optionally `graph.json` (snapshot), `graph.graphml` (see [`graphml`])
//!   and `manifest.json` (checksums).
//!
//! Every row is planned before the output directory is touched, so a bad
//! relationship aborts the export with the previous output intact.

pub mod graphml;
pub mod output;
pub mod schema;
pub mod scripts;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::config::{ExportConfig, LoaderConfig};
use crate::entity::EntityKind;
use crate::error::{ExportError, FusionResult};
use crate::relationship::RelationLabel;
use crate::store::GraphStore;

pub const NODE_FILE: &str = "nodes.csv";
pub const CONSTRAINT_FILE: &str = "create_indices.cypher";
pub const SHELL_SCRIPT_FILE: &str = "import_admin.sh";
pub const BATCH_SCRIPT_FILE: &str = "import_admin.bat";
pub const SNAPSHOT_FILE: &str = "graph.json";
pub const GRAPHML_FILE: &str = "graph.graphml";
pub const MANIFEST_FILE: &str = "manifest.json";

const NODE_HEADER: [&str; 4] = ["_id:ID(Node-ID)", "ids:string[]", "names:string[]", ":LABEL"];

/// File name of the table holding `label` relationships.
#[must_use]
pub fn relationship_file_name(label: RelationLabel) -> String {
    format!("rel_{label}.csv")
}

/// A CSV table ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub file_name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn render(&self) -> Result<Vec<u8>, ExportError> {
        let csv_err = |source| ExportError::Csv {
            path: PathBuf::from(&self.file_name),
            source,
        };
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.header).map_err(csv_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(csv_err)?;
        }
        writer.into_inner().map_err(|e| ExportError::Io {
            path: PathBuf::from(&self.file_name),
            source: e.into_error(),
        })
    }
}

/// Everything the exporter will write, computed up front.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub nodes: Table,
    pub relationships: Vec<Table>,
    pub kinds: Vec<EntityKind>,
    pub snapshot: Option<String>,
    pub graphml: Option<Vec<u8>>,
}

/// One written file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub name: String,
    /// Data rows for tables, absent for scripts and documents.
    pub rows: Option<usize>,
    pub bytes: usize,
    pub blake3: String,
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportManifest {
    pub generated_at: DateTime<Utc>,
    pub generator: String,
    pub files: Vec<ExportedFile>,
}

/// Result of a completed export.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub files: Vec<ExportedFile>,
    pub node_rows: usize,
    pub relationship_rows: usize,
}

impl ExportSummary {
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&ExportedFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Writes a [`GraphStore`] as a bulk-load file set.
#[derive(Debug, Clone)]
pub struct BulkExporter {
    export: ExportConfig,
    loader: LoaderConfig,
}

impl BulkExporter {
    #[must_use]
    pub fn new(export: ExportConfig, loader: LoaderConfig) -> Self {
        Self { export, loader }
    }

    /// Builds every row without writing anything.
    ///
    /// # Errors
    /// - `ConsistencyError::UnknownEndpoint` for a relationship whose endpoint
    ///   no live entity owns
    /// - `ExportError::MissingAttribute` / `AttributeType` for attributes that
    ///   do not fit the label's schema
    pub fn plan(&self, store: &GraphStore) -> FusionResult<ExportPlan> {
        let mut node_rows: Vec<Vec<String>> = store
            .entities()
            .map(|(_, entity)| {
                let ids: Vec<&str> = entity.ids().iter().map(String::as_str).collect();
                let names: Vec<&str> = entity.names().iter().map(String::as_str).collect();
                vec![
                    entity.canonical_id().to_string(),
                    ids.join(";"),
                    names.join(";"),
                    entity.kind().label().to_string(),
                ]
            })
            .collect();
        node_rows.sort();

        let mut relationships = Vec::new();
        for label in store.index().labels() {
            let mut rows = Vec::new();
            for rel in store.relationships_by_label(label) {
                let (source, target) = store.endpoints(rel)?;
                let mut row = Vec::with_capacity(schema::columns(label).len() + 3);
                row.push(source.canonical_id().to_string());
                row.extend(schema::cells(rel)?);
                row.push(target.canonical_id().to_string());
                row.push(label.as_str().to_string());
                rows.push(row);
            }
            relationships.push(Table {
                file_name: relationship_file_name(label),
                header: schema::header(label),
                rows,
            });
        }

        let snapshot = if self.export.write_snapshot {
            Some(store.to_document().to_json_string()?)
        } else {
            None
        };

        let graphml = if self.export.write_graphml {
            Some(graphml::render(store)?)
        } else {
            None
        };

        Ok(ExportPlan {
            nodes: Table {
                file_name: NODE_FILE.to_string(),
                header: NODE_HEADER.iter().map(|h| (*h).to_string()).collect(),
                rows: node_rows,
            },
            relationships,
            kinds: store.kinds_present(),
            snapshot,
            graphml,
        })
    }

    /// Plans, then replaces the output directory with the exported file set.
    ///
    /// # Errors
    /// Any planning error (nothing is written), `ConsistencyError::OutputOutsideRoot`
    /// if the configured directory escapes the root, `ConsistencyError::SymlinkedOutput`
    /// if a path component below the root is a symbolic link, or `ExportError`
    /// for write failures.
    pub fn export(&self, store: &GraphStore) -> FusionResult<ExportSummary> {
        let _span = info_span!("export").entered();
        let plan = self.plan(store)?;
        let dir = output::guard_output_dir(&self.export.output_root, &self.export.output_dir)?;
        output::clean_directory(&dir)?;

        let mut files = Vec::new();
        files.push(write_file(&dir, NODE_FILE, &plan.nodes.render()?, Some(plan.nodes.rows.len()))?);
        for table in &plan.relationships {
            files.push(write_file(&dir, &table.file_name, &table.render()?, Some(table.rows.len()))?);
        }

        let relationship_files: Vec<String> =
            plan.relationships.iter().map(|t| t.file_name.clone()).collect();
        let constraints = scripts::constraint_script(&plan.kinds);
        files.push(write_file(&dir, CONSTRAINT_FILE, constraints.as_bytes(), None)?);
        let shell = scripts::shell_script(&self.loader, NODE_FILE, &relationship_files);
        files.push(write_file(&dir, SHELL_SCRIPT_FILE, shell.as_bytes(), None)?);
        let batch = scripts::batch_script(&self.loader, NODE_FILE, &relationship_files);
        files.push(write_file(&dir, BATCH_SCRIPT_FILE, batch.as_bytes(), None)?);

        if let Some(snapshot) = &plan.snapshot {
            files.push(write_file(&dir, SNAPSHOT_FILE, snapshot.as_bytes(), None)?);
        }
        if let Some(graphml) = &plan.graphml {
            files.push(write_file(&dir, GRAPHML_FILE, graphml, None)?);
        }

        if self.export.write_manifest {
            let manifest = ExportManifest {
                generated_at: Utc::now(),
                generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                files: files.clone(),
            };
            let path = dir.join(MANIFEST_FILE);
            let encoded = serde_json::to_vec_pretty(&manifest)
                .map_err(|source| ExportError::Json { path, source })?;
            fs::write(dir.join(MANIFEST_FILE), encoded).map_err(|source| ExportError::Io {
                path: dir.join(MANIFEST_FILE),
                source,
            })?;
        }

        let relationship_rows = plan.relationships.iter().map(|t| t.rows.len()).sum();
        info!(
            dir = %dir.display(),
            nodes = plan.nodes.rows.len(),
            relationships = relationship_rows,
            tables = plan.relationships.len(),
            "bulk export written"
        );
        Ok(ExportSummary {
            output_dir: dir,
            files,
            node_rows: plan.nodes.rows.len(),
            relationship_rows,
        })
    }
}

fn write_file(
    dir: &Path,
    name: &str,
    contents: &[u8],
    rows: Option<usize>,
) -> Result<ExportedFile, ExportError> {
    let path = dir.join(name);
    fs::write(&path, contents).map_err(|source| ExportError::Io { path, source })?;
    debug!(file = name, bytes = contents.len(), "wrote export file");
    Ok(ExportedFile {
        name: name.to_string(),
        rows,
        bytes: contents.len(),
        blake3: blake3::hash(contents).to_hex().to_string(),
    })
}
