//! GraphML rendering of the fused graph.
//!
//! The document is directed. Nodes are keyed by canonical id and carry their
//! kind label, `;`-joined ids and names. Edges use canonical endpoint ids and
//! carry their label plus every non-empty schema cell. One `<key>` is
//! declared per edge column name across all labels.

use std::path::PathBuf;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use super::schema::{self, ColumnType};
use super::GRAPHML_FILE;
use crate::error::{ExportError, FusionResult};
use crate::relationship::RelationLabel;
use crate::store::GraphStore;

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";
const GRAPH_ID: &str = "biofusion";

const NODE_KEYS: [&str; 3] = ["label", "ids", "names"];

const fn graphml_type(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Int => "long",
        ColumnType::Boolean => "boolean",
        ColumnType::String | ColumnType::StringArray => "string",
    }
}

/// Distinct edge columns over every label, in first-declared order.
fn edge_columns() -> Vec<(&'static str, ColumnType)> {
    let mut out: Vec<(&'static str, ColumnType)> = Vec::new();
    for label in RelationLabel::ALL {
        for column in schema::columns(label) {
            if !out.iter().any(|(name, _)| *name == column.name) {
                out.push((column.name, column.ty));
            }
        }
    }
    out
}

fn node_key(name: &str) -> String {
    format!("n_{name}")
}

fn edge_key(name: &str) -> String {
    format!("e_{name}")
}

fn xml_err(source: quick_xml::Error) -> ExportError {
    ExportError::Xml {
        path: PathBuf::from(GRAPHML_FILE),
        source,
    }
}

fn write_key(
    writer: &mut Writer<Vec<u8>>,
    id: &str,
    target: &str,
    name: &str,
    ty: &str,
) -> Result<(), ExportError> {
    writer
        .create_element("key")
        .with_attributes([("id", id), ("for", target), ("attr.name", name), ("attr.type", ty)])
        .write_empty()
        .map_err(xml_err)?;
    Ok(())
}

fn write_data(writer: &mut Writer<Vec<u8>>, key: &str, text: &str) -> Result<(), ExportError> {
    writer
        .create_element("data")
        .with_attribute(("key", key))
        .write_text_content(BytesText::new(text))
        .map_err(xml_err)?;
    Ok(())
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), ExportError> {
    writer.write_event(event).map_err(xml_err)
}

/// Renders `store` as a GraphML document.
///
/// # Errors
/// - `ConsistencyError::UnknownEndpoint` for a relationship whose endpoint
///   no live entity owns
/// - `ExportError::MissingAttribute` / `AttributeType` as for the CSV tables
pub fn render(store: &GraphStore) -> FusionResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_event(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_event(
        &mut writer,
        Event::Start(BytesStart::new("graphml").with_attributes([("xmlns", GRAPHML_NS)])),
    )?;

    for name in NODE_KEYS {
        write_key(&mut writer, &node_key(name), "node", name, "string")?;
    }
    write_key(&mut writer, &edge_key("label"), "edge", "label", "string")?;
    let columns = edge_columns();
    for (name, ty) in &columns {
        write_key(&mut writer, &edge_key(name), "edge", name, graphml_type(*ty))?;
    }

    write_event(
        &mut writer,
        Event::Start(
            BytesStart::new("graph").with_attributes([("id", GRAPH_ID), ("edgedefault", "directed")]),
        ),
    )?;

    let mut entities: Vec<_> = store.entities().map(|(_, entity)| entity).collect();
    entities.sort_by(|a, b| a.canonical_id().cmp(b.canonical_id()));
    for entity in entities {
        let ids: Vec<&str> = entity.ids().iter().map(String::as_str).collect();
        let names: Vec<&str> = entity.names().iter().map(String::as_str).collect();
        write_event(
            &mut writer,
            Event::Start(BytesStart::new("node").with_attributes([("id", entity.canonical_id())])),
        )?;
        write_data(&mut writer, &node_key("label"), entity.kind().label())?;
        write_data(&mut writer, &node_key("ids"), &ids.join(";"))?;
        write_data(&mut writer, &node_key("names"), &names.join(";"))?;
        write_event(&mut writer, Event::End(BytesEnd::new("node")))?;
    }

    let mut edges = 0usize;
    for label in store.index().labels() {
        for rel in store.relationships_by_label(label) {
            let (source, target) = store.endpoints(rel)?;
            let cells = schema::cells(rel)?;
            let id = format!("r{}", rel.sequence_id);
            write_event(
                &mut writer,
                Event::Start(BytesStart::new("edge").with_attributes([
                    ("id", id.as_str()),
                    ("source", source.canonical_id()),
                    ("target", target.canonical_id()),
                ])),
            )?;
            write_data(&mut writer, &edge_key("label"), label.as_str())?;
            for (column, cell) in schema::columns(label).iter().zip(&cells) {
                if !cell.is_empty() {
                    write_data(&mut writer, &edge_key(column.name), cell)?;
                }
            }
            write_event(&mut writer, Event::End(BytesEnd::new("edge")))?;
            edges += 1;
        }
    }

    write_event(&mut writer, Event::End(BytesEnd::new("graph")))?;
    write_event(&mut writer, Event::End(BytesEnd::new("graphml")))?;
    debug!(nodes = store.entity_count(), edges, "rendered GraphML");

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}
