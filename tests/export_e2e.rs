use std::fs;
use std::path::{Path, PathBuf};

use biofusion::source::RelationshipRecord;
use biofusion::value::attributes;
use biofusion::{
    AttrValue, BulkExporter, Entity, EntityKind, ExportConfig, FusionPipeline, GraphStore,
    LoaderConfig, RelationLabel, SourceGraph,
};

fn fused_store() -> GraphStore {
    let source = SourceGraph {
        entities: vec![
            Entity::new(EntityKind::Drug, ["DrugBank:DB00945", "RxNorm:1191"], ["Aspirin", "ASA"]).unwrap(),
            Entity::new(EntityKind::Gene, ["HGNC:9605", "Entrez:5743"], ["PTGS2"]).unwrap(),
            Entity::new(EntityKind::Disease, ["UMLS:C0004096"], ["Asthma"]).unwrap(),
            Entity::new(EntityKind::GoClass, ["GO:0019371"], ["cyclooxygenase pathway"]).unwrap(),
        ],
        relationships: vec![
            RelationshipRecord::new(
                RelationLabel::Targets,
                "RxNorm:1191",
                "Entrez:5743",
                attributes([
                    ("source", "DrugBank".into()),
                    ("known_action", true.into()),
                    ("actions", AttrValue::List(vec!["inhibitor".into()])),
                ]),
            ),
            RelationshipRecord::new(
                RelationLabel::Contraindicates,
                "DrugBank:DB00945",
                "UMLS:C0004096",
                attributes([("source", "DrugCentral".into())]),
            ),
            RelationshipRecord::new(
                RelationLabel::BiologicalProcess,
                "HGNC:9605",
                "GO:0019371",
                attributes([("source", "GO".into())]),
            ),
        ],
    };
    let mut pipeline = FusionPipeline::new();
    pipeline.run(&[source], None).unwrap();
    pipeline.into_store()
}

fn exporter(root: &Path, dir: &str, loader: LoaderConfig) -> BulkExporter {
    BulkExporter::new(
        ExportConfig {
            output_root: root.to_path_buf(),
            output_dir: PathBuf::from(dir),
            write_snapshot: true,
            write_manifest: true,
            write_graphml: true,
        },
        loader,
    )
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn export_writes_tables_and_scripts() {
    let tmp = tempfile::tempdir().unwrap();
    let loader = LoaderConfig {
        bin_path: PathBuf::from("/opt/neo4j/bin"),
        database: Some("fused".to_string()),
    };
    let summary = exporter(tmp.path(), "graph", loader).export(&fused_store()).unwrap();
    let dir = &summary.output_dir;
    assert_eq!(dir, &tmp.path().join("graph"));

    let nodes = read(dir, "nodes.csv");
    let lines: Vec<&str> = nodes.lines().collect();
    assert_eq!(lines[0], "_id:ID(Node-ID),ids:string[],names:string[],:LABEL");
    assert_eq!(lines[1], "DrugBank:DB00945,DrugBank:DB00945;RxNorm:1191,ASA;Aspirin,Drug");
    assert_eq!(lines.len(), 5);

    let targets = read(dir, "rel_TARGETS.csv");
    assert_eq!(
        targets,
        ":START_ID(Node-ID),source:string,known_action:boolean,actions:string[],simplified_action:string,:END_ID(Node-ID),:TYPE\n\
         DrugBank:DB00945,DrugBank,true,inhibitor,,HGNC:9605,TARGETS\n"
    );
    assert!(read(dir, "rel_CONTRAINDICATES.csv").starts_with(":START_ID(Node-ID),source:string,pmid:int,"));
    assert!(read(dir, "rel_BIOLOGICAL_PROCESS.csv").contains("HGNC:9605,GO,GO:0019371,BIOLOGICAL_PROCESS"));
    assert!(!dir.join("rel_CODES.csv").exists());

    let cypher = read(dir, "create_indices.cypher");
    assert_eq!(cypher.lines().count(), 4);
    assert!(cypher.contains("create constraint on (p:GOClass) assert p._id is unique;"));

    let sh = read(dir, "import_admin.sh");
    assert!(sh.starts_with("'/opt/neo4j/bin/neo4j-admin' import --database=fused --nodes nodes.csv"));
    assert!(sh.contains("--relationships rel_TARGETS.csv"));
    assert!(sh.trim_end().ends_with("> import.log"));
    assert!(read(dir, "import_admin.bat").starts_with("@echo off\n"));
}

#[test]
fn snapshot_and_manifest_describe_the_export() {
    let tmp = tempfile::tempdir().unwrap();
    let summary = exporter(tmp.path(), "graph", LoaderConfig::default())
        .export(&fused_store())
        .unwrap();
    let dir = &summary.output_dir;

    let snapshot = SourceGraph::from_json_str(&read(dir, "graph.json")).unwrap();
    assert_eq!(snapshot.entities.len(), 4);
    assert_eq!(snapshot.relationships.len(), 3);

    let manifest: serde_json::Value = serde_json::from_str(&read(dir, "manifest.json")).unwrap();
    let files = manifest["files"].as_array().unwrap();
    let nodes = files.iter().find(|f| f["name"] == "nodes.csv").unwrap();
    assert_eq!(nodes["rows"], 4);
    let bytes = fs::read(dir.join("nodes.csv")).unwrap();
    assert_eq!(nodes["blake3"], blake3::hash(&bytes).to_hex().to_string());
    assert!(manifest["generated_at"].is_string());
}

#[test]
fn graphml_declares_keys_nodes_and_edges() {
    let tmp = tempfile::tempdir().unwrap();
    let summary = exporter(tmp.path(), "graph", LoaderConfig::default())
        .export(&fused_store())
        .unwrap();
    assert!(summary.file("graph.graphml").is_some());
    let doc = read(&summary.output_dir, "graph.graphml");

    for key in [
        r#"<key id="n_label" for="node" attr.name="label" attr.type="string"/>"#,
        r#"<key id="n_ids" for="node" attr.name="ids" attr.type="string"/>"#,
        r#"<key id="e_label" for="edge" attr.name="label" attr.type="string"/>"#,
        r#"<key id="e_pmid" for="edge" attr.name="pmid" attr.type="long"/>"#,
        r#"<key id="e_known_action" for="edge" attr.name="known_action" attr.type="boolean"/>"#,
    ] {
        assert!(doc.contains(key), "missing {key}");
    }
    assert!(doc.contains(r#"edgedefault="directed""#));
    assert_eq!(doc.matches("<node ").count(), 4);
    assert_eq!(doc.matches("<edge ").count(), 3);
    assert!(doc.contains(r#"<node id="UMLS:C0004096">"#));
    assert!(doc.contains(r#"source="DrugBank:DB00945" target="HGNC:9605">"#));
    assert!(doc.contains(r#"<data key="e_actions">inhibitor</data>"#));
    assert!(doc.contains(r#"<data key="e_label">CONTRAINDICATES</data>"#));
}

#[test]
fn export_replaces_previous_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("graph");
    fs::create_dir_all(dir.join("stale")).unwrap();
    fs::write(dir.join("rel_OLD.csv"), "old").unwrap();

    exporter(tmp.path(), "graph", LoaderConfig::default())
        .export(&fused_store())
        .unwrap();
    assert!(!dir.join("rel_OLD.csv").exists());
    assert!(!dir.join("stale").exists());
    assert!(dir.join("nodes.csv").exists());
}

#[test]
fn export_outside_root_is_refused_and_touches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir_all(&root).unwrap();
    let sibling = tmp.path().join("precious");
    fs::create_dir_all(&sibling).unwrap();
    fs::write(sibling.join("keep.txt"), "keep").unwrap();

    let err = exporter(&root, "../precious", LoaderConfig::default())
        .export(&fused_store())
        .unwrap_err();
    assert!(err.is_consistency());
    assert!(sibling.join("keep.txt").exists());
}

#[cfg(unix)]
#[test]
fn symlinked_output_dir_is_refused_and_target_kept() {
    use std::os::unix::fs::symlink;

    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir_all(&root).unwrap();
    let precious = tmp.path().join("precious");
    fs::create_dir_all(&precious).unwrap();
    fs::write(precious.join("keep.txt"), "keep").unwrap();
    symlink(&precious, root.join("graph")).unwrap();

    let err = exporter(&root, "graph", LoaderConfig::default())
        .export(&fused_store())
        .unwrap_err();
    assert!(err.is_consistency());
    assert_eq!(read(&precious, "keep.txt"), "keep");
    assert!(!precious.join("nodes.csv").exists());
}

#[test]
fn invalid_relationship_aborts_before_cleaning() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("graph");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("nodes.csv"), "previous run").unwrap();

    let mut store = GraphStore::new();
    store.add_entity(Entity::new(EntityKind::Gene, ["HGNC:1"], Vec::<String>::new()).unwrap());
    store.add_entity(Entity::new(EntityKind::Gene, ["HGNC:2"], Vec::<String>::new()).unwrap());
    store.add_relationship(RelationLabel::Codes, "HGNC:1", "HGNC:2", attributes([("pmid", "1".into())]));

    let err = exporter(tmp.path(), "graph", LoaderConfig::default())
        .export(&store)
        .unwrap_err();
    assert!(err.is_export());
    assert_eq!(read(&dir, "nodes.csv"), "previous run");
}

#[test]
fn unknown_endpoint_aborts_export() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = GraphStore::new();
    store.add_entity(Entity::new(EntityKind::Gene, ["HGNC:1"], Vec::<String>::new()).unwrap());
    store.add_relationship(RelationLabel::Codes, "HGNC:1", "HGNC:404", attributes([("source", "x".into())]));

    let err = exporter(tmp.path(), "graph", LoaderConfig::default())
        .export(&store)
        .unwrap_err();
    assert!(err.is_consistency());
    assert!(!tmp.path().join("graph").exists());
}
