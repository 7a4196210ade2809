//! Attribute values carried by relationships.
//!
//! Relationship attributes are an open key→value bag whose shape is fixed per
//! label (see `export::schema`). Values stay close to plain JSON so adapter
//! documents round-trip without a type tag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered attribute map. Ordering keeps fingerprints and exports deterministic.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A single attribute value.
///
/// # Examples
///
/// ```
/// use biofusion::AttrValue;
///
/// let v: AttrValue = serde_json::from_str("[\"inhibitor\",\"antagonist\"]").unwrap();
/// assert_eq!(v.as_list().unwrap().len(), 2);
/// assert!(AttrValue::from(true).is_bool());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl AttrValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Renders a scalar as export text. Lists and null have no scalar form.
    #[must_use]
    pub fn to_scalar_text(&self) -> Option<String> {
        match self {
            Self::Bool(v) => Some(if *v { "true" } else { "false" }.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::String(v) => Some(v.clone()),
            Self::List(_) | Self::Null => None,
        }
    }
}

// Floats compare by bit pattern so that equality stays reflexive (NaN == NaN)
// and agrees with the attribute fingerprint.
impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttrValue {}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

/// Builds an attribute map from `(key, value)` pairs.
///
/// ```
/// use biofusion::value::attributes;
///
/// let attrs = attributes([("source", "DrugCentral".into()), ("num_pmids", 3i64.into())]);
/// assert_eq!(attrs.len(), 2);
/// ```
pub fn attributes<K, I>(pairs: I) -> Attributes
where
    K: Into<String>,
    I: IntoIterator<Item = (K, AttrValue)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialization() {
        let v: Attributes = serde_json::from_str(
            r#"{"source":"DisGeNet","num_pmids":4,"score":"0.7","known_action":true,"actions":["inhibitor"],"pvalue":1.5e-8,"x":null}"#,
        )
        .unwrap();
        assert_eq!(v["source"].as_str(), Some("DisGeNet"));
        assert_eq!(v["num_pmids"].as_int(), Some(4));
        assert_eq!(v["known_action"].as_bool(), Some(true));
        assert_eq!(v["actions"].as_list().map(<[String]>::len), Some(1));
        assert!(matches!(v["pvalue"], AttrValue::Float(_)));
        assert!(v["x"].is_null());
    }

    #[test]
    fn test_equality_is_type_strict() {
        assert_ne!(AttrValue::Int(1), AttrValue::Float(1.0));
        assert_ne!(AttrValue::String("1".into()), AttrValue::Int(1));
        assert_eq!(AttrValue::Float(f64::NAN), AttrValue::Float(f64::NAN));
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(AttrValue::Bool(false).to_scalar_text().as_deref(), Some("false"));
        assert_eq!(AttrValue::Int(12).to_scalar_text().as_deref(), Some("12"));
        assert!(AttrValue::List(vec![]).to_scalar_text().is_none());
        assert!(AttrValue::Null.to_scalar_text().is_none());
    }
}
