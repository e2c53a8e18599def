//! Field decoding.
//!
//! A [`FieldSpec`] is compiled once into a [`Decoder`], a closed set of
//! variants selected from the field's `type` and `keytype` tags. Decoding a
//! raw substring then never fails: it yields `Some(value)` or `None` for
//! null. Definition problems (a key without `keytype`, an unknown `type`)
//! surface at compile time.
//!
//! # Numeric parsing
//!
//! Integers are read with a leading-prefix rule: leading whitespace is
//! skipped, an optional sign is accepted, and digits are consumed up to the
//! first non-digit. `"  42"` and `"42AB"` both read as `42`; `"  "` and
//! `"AB"` do not parse. Doubles are stored as scaled integer mantissas, so a
//! literal decimal point in the data ends the mantissa: `"12.50"` reads as
//! `12`, not `1250`.

use crate::definition::{FieldSpec, LookupNode, LookupTable};
use crate::document::Value;
use crate::error::{Error, Result};
use tracing::debug;

static EMPTY_TABLE: LookupTable = LookupTable::new();

/// Compiled decoder for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoder<'a> {
    Integer {
        null: Option<i64>,
    },
    Double {
        null: Option<i64>,
        decimals: u32,
    },
    IntegerKey {
        null: Option<i64>,
        table: &'a LookupTable,
    },
    StringKey {
        null: Option<&'a str>,
        table: &'a LookupTable,
    },
    TreeKey {
        levels: &'a [usize],
        table: &'a LookupTable,
    },
}

impl<'a> Decoder<'a> {
    /// Select the decoder variant for `field`.
    ///
    /// # Errors
    /// - [`Error::FieldDefinition`] for a `key` field without `keytype`, or a
    ///   `tree` key without `keylength`.
    /// - [`Error::UnsupportedType`] for an unknown `type` or `keytype`.
    pub fn compile(field: &'a FieldSpec) -> Result<Self> {
        let numeric_null = field
            .null_sentinel
            .as_ref()
            .and_then(|s| parse_leading_int(s.as_str()));
        let table = field.value_table.as_ref().unwrap_or(&EMPTY_TABLE);

        match field.type_name.as_str() {
            "integer" => Ok(Self::Integer { null: numeric_null }),
            "double" => Ok(Self::Double {
                null: numeric_null,
                decimals: field.decimals.unwrap_or(0),
            }),
            "key" => {
                let key_type = field.key_type.as_deref().ok_or_else(|| Error::FieldDefinition {
                    field: field.name.clone(),
                    message: "key field without keytype".into(),
                })?;
                match key_type {
                    "integer" => Ok(Self::IntegerKey {
                        null: numeric_null,
                        table,
                    }),
                    "string" => Ok(Self::StringKey {
                        null: field.null_sentinel.as_ref().map(|s| s.as_str()),
                        table,
                    }),
                    "tree" => {
                        let levels =
                            field.key_lengths.as_deref().ok_or_else(|| Error::FieldDefinition {
                                field: field.name.clone(),
                                message: "tree key without keylength".into(),
                            })?;
                        Ok(Self::TreeKey { levels, table })
                    }
                    other => Err(Error::UnsupportedType {
                        field: field.name.clone(),
                        type_name: format!("key/{other}"),
                    }),
                }
            }
            other => Err(Error::UnsupportedType {
                field: field.name.clone(),
                type_name: other.to_string(),
            }),
        }
    }

    /// Decode a raw field window. `None` means null.
    #[must_use]
    pub fn decode(&self, raw: &str) -> Option<Value> {
        match self {
            Self::Integer { null } => parse_non_null(raw, *null).map(Value::Integer),
            Self::Double { null, decimals } => parse_non_null(raw, *null)
                .map(|mantissa| Value::Double(scale(mantissa, *decimals))),
            Self::IntegerKey { null, table } => {
                let key = parse_non_null(raw, *null)?;
                lookup(table, &key.to_string())
            }
            Self::StringKey { null, table } => {
                if raw.trim().is_empty() || Some(raw) == *null {
                    return None;
                }
                lookup(table, raw)
            }
            Self::TreeKey { levels, table } => walk_tree(table, levels, raw),
        }
    }
}

/// Decode one raw field window.
///
/// Compiles the decoder on every call; when decoding many records use
/// [`Decoder::compile`] once and reuse it.
///
/// # Errors
/// See [`Decoder::compile`].
pub fn decode(field: &FieldSpec, raw: &str) -> Result<Option<Value>> {
    Ok(Decoder::compile(field)?.decode(raw))
}

/// Parse a base-10 integer prefix.
///
/// Returns `None` when no digit follows the optional sign or on `i64`
/// overflow.
#[must_use]
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for b in digits[..end].bytes() {
        let d = i64::from(b - b'0');
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(d)?
        } else {
            value.checked_add(d)?
        };
    }
    Some(value)
}

fn parse_non_null(raw: &str, null: Option<i64>) -> Option<i64> {
    let n = parse_leading_int(raw)?;
    if Some(n) == null { None } else { Some(n) }
}

fn scale(mantissa: i64, decimals: u32) -> f64 {
    // i32 exponent covers any realistic decimals count
    let exp = i32::try_from(decimals).unwrap_or(i32::MAX);
    mantissa as f64 / 10f64.powi(exp)
}

fn lookup(table: &LookupTable, key: &str) -> Option<Value> {
    match table.get(key) {
        Some(node) => Some(Value::Label(node.label().to_string())),
        None => {
            debug!(key, "no lookup entry for key");
            None
        }
    }
}

fn walk_tree(root: &LookupTable, levels: &[usize], raw: &str) -> Option<Value> {
    let chars: Vec<char> = raw.chars().collect();
    let mut table = root;
    let mut pos = 0usize;
    let mut labels = Vec::new();

    for &width in levels {
        let end = (pos + width).min(chars.len());
        let key: String = chars[pos.min(end)..end].iter().collect();
        match table.get(&key) {
            Some(LookupNode::Label(label)) => {
                labels.push(label.clone());
                break;
            }
            Some(LookupNode::Subtree { name, values }) => {
                labels.push(name.clone());
                table = values;
                pos += width;
            }
            None => {
                debug!(key = key.as_str(), depth = labels.len(), "tree lookup stopped at missing key");
                break;
            }
        }
    }

    if labels.is_empty() {
        None
    } else {
        Some(Value::Path(labels))
    }
}
