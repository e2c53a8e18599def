//! Decoded records.
//!
//! A [`Document`] is an ordered mapping from field name to [`Value`]. Field
//! sets differ per file spec, so documents are not fixed structs. Null
//! values are never stored; a field that decodes to null is simply absent.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Key under which a document's identity is stored.
pub const ID_FIELD: &str = "_id";

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Double(f64),
    Label(String),
    /// Root-to-leaf labels from a tree lookup
    Path(Vec<String>),
    /// Nested document (child entries pushed onto a parent record)
    Document(Document),
    /// Array of nested documents
    Array(Vec<Value>),
}

impl fmt::Display for Value {
    /// String form used when concatenating key fields into an identity.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Double(x) => write!(f, "{x}"),
            Self::Label(s) => f.write_str(s),
            Self::Path(labels) => f.write_str(&labels.join(",")),
            Self::Document(doc) => match serde_json::to_string(doc) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Double(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Label(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Label(s)
    }
}

/// Ordered field-name → value mapping with an optional identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    id: Option<String>,
    fields: Vec<(String, Value)>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Insert or replace a field, keeping its original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field names in insertion order, identity excluded.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert to a JSON object, identity first under [`ID_FIELD`].
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Rebuild a document from a JSON object as written by [`Document::to_json`].
    ///
    /// Returns `None` if `json` is not an object.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let obj = json.as_object()?;
        let mut doc = Self::new();
        for (name, v) in obj {
            if name == ID_FIELD {
                if let Some(id) = v.as_str() {
                    doc.set_id(id);
                }
                continue;
            }
            if let Some(value) = value_from_json(v) {
                doc.insert(name.clone(), value);
            }
        }
        Some(doc)
    }
}

fn value_from_json(json: &serde_json::Value) -> Option<Value> {
    use serde_json::Value as J;
    Some(match json {
        J::Null => return None,
        J::Bool(b) => Value::Label(b.to_string()),
        J::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Double(n.as_f64()?),
        },
        J::String(s) => Value::Label(s.clone()),
        J::Array(items) if !items.is_empty() && items.iter().all(serde_json::Value::is_string) => Value::Path(
            items
                .iter()
                .filter_map(|s| s.as_str().map(str::to_string))
                .collect(),
        ),
        J::Array(items) => Value::Array(items.iter().filter_map(value_from_json).collect()),
        J::Object(_) => Value::Document(Document::from_json(json)?),
    })
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.id.is_some());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        if let Some(id) = &self.id {
            map.serialize_entry(ID_FIELD, id)?;
        }
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
