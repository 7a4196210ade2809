//! Per-label column schemas for relationship tables.
//!
//! Each label has a fixed, ordered list of attribute columns. A column pairs a
//! bulk-loader type with an accessor that turns the relationship's attribute
//! into cell text.

use crate::error::ExportError;
use crate::relationship::{RelationLabel, Relationship};
use crate::value::AttrValue;

/// Bulk-loader column type, as written in the header (`name:type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Int,
    Boolean,
    StringArray,
}

impl ColumnType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Boolean => "boolean",
            Self::StringArray => "string[]",
        }
    }
}

/// How a column reads its attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// Scalar that must be present.
    Required,
    /// Scalar; missing or null becomes an empty cell.
    Optional,
    /// Boolean rendered `true`/`false`; missing means `false`.
    Flag,
    /// List joined with `;`; missing means empty.
    Joined,
    /// Integer, or text holding one; missing or null becomes an empty cell.
    OptionalInt,
}

/// One declared attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub accessor: Accessor,
}

const fn column(name: &'static str, ty: ColumnType, accessor: Accessor) -> Column {
    Column { name, ty, accessor }
}

const SOURCE: Column = column("source", ColumnType::String, Accessor::Required);
const PMID: Column = column("pmid", ColumnType::Int, Accessor::OptionalInt);

const CITED: [Column; 2] = [SOURCE, PMID];
const SOURCE_ONLY: [Column; 1] = [SOURCE];

const TARGETS: [Column; 4] = [
    SOURCE,
    column("known_action", ColumnType::Boolean, Accessor::Flag),
    column("actions", ColumnType::StringArray, Accessor::Joined),
    column("simplified_action", ColumnType::String, Accessor::Optional),
];

const ASSOCIATES_WITH: [Column; 4] = [
    SOURCE,
    column("num_pmids", ColumnType::Int, Accessor::OptionalInt),
    column("num_snps", ColumnType::Int, Accessor::OptionalInt),
    column("score", ColumnType::String, Accessor::Optional),
];

const EQTL: [Column; 4] = [
    SOURCE,
    column("pvalue", ColumnType::String, Accessor::Optional),
    column("snp_chr", ColumnType::String, Accessor::Optional),
    column("cis_trans", ColumnType::String, Accessor::Optional),
];

const INTERACTS: [Column; 2] = [
    SOURCE,
    column("description", ColumnType::String, Accessor::Optional),
];

/// Attribute columns declared for `label`, in output order.
#[must_use]
pub const fn columns(label: RelationLabel) -> &'static [Column] {
    match label {
        RelationLabel::Indicates
        | RelationLabel::Contraindicates
        | RelationLabel::Induces
        | RelationLabel::Codes
        | RelationLabel::Regulates => &CITED,
        RelationLabel::Targets => &TARGETS,
        RelationLabel::AssociatesWith => &ASSOCIATES_WITH,
        RelationLabel::Eqtl => &EQTL,
        RelationLabel::Interacts => &INTERACTS,
        RelationLabel::HasAdr
        | RelationLabel::AssociatedWithAdr
        | RelationLabel::MolecularFunction
        | RelationLabel::BiologicalProcess
        | RelationLabel::CellularComponent => &SOURCE_ONLY,
    }
}

/// Full header row for `label`: start id, attribute columns, end id, type.
#[must_use]
pub fn header(label: RelationLabel) -> Vec<String> {
    let mut row = Vec::with_capacity(columns(label).len() + 3);
    row.push(":START_ID(Node-ID)".to_string());
    row.extend(columns(label).iter().map(Column::header));
    row.push(":END_ID(Node-ID)".to_string());
    row.push(":TYPE".to_string());
    row
}

impl Column {
    #[must_use]
    pub fn header(&self) -> String {
        format!("{}:{}", self.name, self.ty.as_str())
    }

    /// Renders this column for `rel`.
    ///
    /// # Errors
    /// - `ExportError::MissingAttribute` if a required attribute is absent
    /// - `ExportError::AttributeType` if the value does not fit the column
    pub fn cell(&self, rel: &Relationship) -> Result<String, ExportError> {
        let value = rel.attributes.get(self.name).filter(|v| !v.is_null());
        let mismatch = |expected: &'static str| ExportError::AttributeType {
            sequence_id: rel.sequence_id,
            label: rel.label,
            key: self.name,
            expected,
        };

        match (self.accessor, value) {
            (Accessor::Required, None) => Err(ExportError::MissingAttribute {
                sequence_id: rel.sequence_id,
                label: rel.label,
                key: self.name,
            }),
            (Accessor::Optional | Accessor::OptionalInt | Accessor::Joined, None) => Ok(String::new()),
            (Accessor::Flag, None) => Ok("false".to_string()),
            (Accessor::Required | Accessor::Optional, Some(v)) => {
                v.to_scalar_text().ok_or_else(|| mismatch("scalar"))
            }
            (Accessor::Flag, Some(AttrValue::Bool(b))) => Ok(b.to_string()),
            (Accessor::Flag, Some(_)) => Err(mismatch("boolean")),
            (Accessor::Joined, Some(AttrValue::List(items))) => Ok(items.join(";")),
            (Accessor::Joined, Some(_)) => Err(mismatch("list")),
            (Accessor::OptionalInt, Some(AttrValue::Int(n))) => Ok(n.to_string()),
            (Accessor::OptionalInt, Some(AttrValue::String(text))) => text
                .trim()
                .parse::<i64>()
                .map(|n| n.to_string())
                .map_err(|_| mismatch("int")),
            (Accessor::OptionalInt, Some(_)) => Err(mismatch("int")),
        }
    }
}

/// Renders every attribute column of `rel` in declared order.
///
/// # Errors
/// The first column error, in declared order.
pub fn cells(rel: &Relationship) -> Result<Vec<String>, ExportError> {
    columns(rel.label).iter().map(|c| c.cell(rel)).collect()
}
