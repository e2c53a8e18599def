//! Declarative format definitions.
//!
//! A format definition is a JSON document describing one or more fixed-width
//! record layouts. The on-disk field names follow the published definition
//! files (`file`, `length`, `null`, `values`, `keylength`); the Rust names
//! describe what the values mean.
//!
//! ```
//! use microlector::definition::FormatDefinition;
//!
//! let def = FormatDefinition::from_json_str(r#"{
//!     "file": "hogares",
//!     "length": 6,
//!     "key": ["id"],
//!     "fields": [
//!         { "name": "id", "type": "integer", "length": 4 },
//!         { "name": "region", "type": "key", "keytype": "string", "length": 2,
//!           "values": { "01": "Norte", "02": "Sur" } }
//!     ]
//! }"#).unwrap();
//! assert_eq!(def.files().len(), 1);
//! assert!(def.files()[0].is_root());
//! ```

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Ordered sequence of file specs, processed in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormatDefinition {
    files: Vec<FileSpec>,
}

impl FormatDefinition {
    #[must_use]
    pub fn new(files: Vec<FileSpec>) -> Self {
        Self { files }
    }

    /// Parse a definition from JSON text. A single object is accepted as a
    /// one-file definition.
    ///
    /// # Errors
    /// Returns the `serde_json` error if the text is not a valid definition.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    #[must_use]
    pub fn files(&self) -> &[FileSpec] {
        &self.files
    }

    #[must_use]
    pub fn into_files(self) -> Vec<FileSpec> {
        self.files
    }

    /// Look up a file spec by id.
    #[must_use]
    pub fn file(&self, id: &str) -> Option<&FileSpec> {
        self.files.iter().find(|f| f.id == id)
    }
}

impl<'de> Deserialize<'de> for FormatDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            single => vec![single],
        };
        let files = items
            .iter()
            .map(|item| FileSpec::deserialize(item).map_err(|e| D::Error::custom(file_error(item, &e))))
            .collect::<Result<_, _>>()?;
        Ok(Self { files })
    }
}

/// Name the file, field and member behind a failed file spec.
fn file_error(item: &Value, err: &serde_json::Error) -> String {
    let Some(obj) = item.as_object() else {
        return err.to_string();
    };
    let id = obj.get("file").and_then(Value::as_str).unwrap_or("?");
    let problem = member::<String>(obj, "file")
        .or_else(|| member::<usize>(obj, "length"))
        .or_else(|| member::<Option<Vec<String>>>(obj, "key"))
        .or_else(|| member::<Option<ParentLink>>(obj, "parent"))
        .or_else(|| member::<Vec<Value>>(obj, "fields"))
        .or_else(|| {
            obj.get("fields")
                .and_then(Value::as_array)?
                .iter()
                .enumerate()
                .find_map(|(i, field)| field_error(field, i))
        })
        .unwrap_or_else(|| err.to_string());
    format!("file '{id}': {problem}")
}

fn field_error(field: &Value, position: usize) -> Option<String> {
    let err = FieldSpec::deserialize(field).err()?;
    let label = field
        .get("name")
        .and_then(Value::as_str)
        .map_or_else(|| format!("#{}", position + 1), |name| format!("'{name}'"));
    let problem = field
        .as_object()
        .and_then(|obj| {
            member::<String>(obj, "name")
                .or_else(|| member::<String>(obj, "type"))
                .or_else(|| member::<usize>(obj, "length"))
                .or_else(|| member::<Option<u32>>(obj, "decimals"))
                .or_else(|| member::<Option<NullSentinel>>(obj, "null"))
                .or_else(|| member::<Option<String>>(obj, "keytype"))
                .or_else(|| member::<Option<LookupTable>>(obj, "values"))
                .or_else(|| member::<Option<Vec<usize>>>(obj, "keylength"))
        })
        .unwrap_or_else(|| err.to_string());
    Some(format!("field {label}: {problem}"))
}

/// Re-read one member on its own; absent members are left to the struct
/// error.
fn member<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let value = obj.get(key)?;
    T::deserialize(value).err().map(|e| format!("`{key}`: {e}"))
}

/// One fixed-width record layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Identifier; also the target collection (root) or array field (child).
    #[serde(rename = "file")]
    pub id: String,
    /// Exact character length of every record line.
    #[serde(rename = "length")]
    pub record_length: usize,
    pub fields: Vec<FieldSpec>,
    /// Field names concatenated into the record identity (root files).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentLink>,
}

impl FileSpec {
    #[must_use]
    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sum of the declared field widths.
    #[must_use]
    pub fn fields_length(&self) -> usize {
        self.fields.iter().map(|f| f.length).sum()
    }
}

/// Link from a child file to the collection it nests into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    /// Parent file id (collection name).
    #[serde(rename = "file")]
    pub file_id: String,
    /// Child field names whose values form the parent record identity.
    pub key: Vec<String>,
}

/// One column of a fixed-width record.
///
/// `type` and `keytype` are kept as text here and compiled into a
/// [`Decoder`](crate::decode::Decoder), so an unknown tag surfaces as a
/// decode-time error rather than a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    #[serde(default, rename = "null", skip_serializing_if = "Option::is_none")]
    pub null_sentinel: Option<NullSentinel>,
    #[serde(default, rename = "keytype", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
    #[serde(default, rename = "values", skip_serializing_if = "Option::is_none")]
    pub value_table: Option<LookupTable>,
    #[serde(default, rename = "keylength", skip_serializing_if = "Option::is_none")]
    pub key_lengths: Option<Vec<usize>>,
}

impl FieldSpec {
    /// Minimal field with only name, type and width set.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            length,
            decimals: None,
            null_sentinel: None,
            key_type: None,
            value_table: None,
            key_lengths: None,
        }
    }
}

/// Raw-value marker meaning "no data".
///
/// Definitions write it either as a JSON number or a string; it is kept as
/// text and compared numerically or verbatim depending on the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NullSentinel(pub String);

impl NullSentinel {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for NullSentinel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(Self(match n.as_i64() {
                Some(i) => i.to_string(),
                None => n.as_f64().map_or_else(|| n.to_string(), |x| x.to_string()),
            })),
            Value::String(s) => Ok(Self(s)),
            other => Err(D::Error::custom(format!(
                "expected a number or a string, found {other}"
            ))),
        }
    }
}

/// Lookup table from raw key text to a node.
pub type LookupTable = BTreeMap<String, LookupNode>;

/// Entry of a lookup table: either a final label or a named subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LookupNode {
    Label(String),
    Subtree { name: String, values: LookupTable },
}

impl<'de> Deserialize<'de> for LookupNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Subtree {
            name: String,
            values: LookupTable,
        }

        match Value::deserialize(deserializer)? {
            Value::String(label) => Ok(Self::Label(label)),
            json @ Value::Object(_) => Subtree::deserialize(json)
                .map(|t| Self::Subtree {
                    name: t.name,
                    values: t.values,
                })
                .map_err(|e| D::Error::custom(format!("subtree: {e}"))),
            other => Err(D::Error::custom(format!(
                "expected a label or a {{name, values}} subtree, found {other}"
            ))),
        }
    }
}

impl LookupNode {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Label(label) => label,
            Self::Subtree { name, .. } => name,
        }
    }
}
