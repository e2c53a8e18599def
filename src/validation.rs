//! Well-formedness checks for format definitions.
//!
//! Definitions are hand-written JSON and the schema leaves several
//! invariants unenforced: field widths must add up to the record length,
//! key fields need a `keytype`, tree keys need `keylength`, and key names
//! must refer to declared fields. [`Validate`] reports every violation at
//! once instead of failing on the first record that trips over one.
//!
//! Lookup table contents are not checked beyond their shape.
//!
//! # Example
//!
//! ```
//! use microlector::definition::{FieldSpec, FileSpec};
//! use microlector::validation::Validate;
//!
//! let spec = FileSpec {
//!     id: "hogares".into(),
//!     record_length: 10,
//!     fields: vec![FieldSpec::new("id", "integer", 4)],
//!     key: Some(vec!["id".into()]),
//!     parent: None,
//! };
//! let errors = spec.validate().unwrap_err();
//! assert_eq!(errors[0].code.as_deref(), Some("record-length"));
//! ```

use crate::definition::{FieldSpec, FileSpec, FormatDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Result type for validation operations.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Types that can check their own invariants.
pub trait Validate {
    /// Return every violation found, or `Ok(())`.
    fn validate(&self) -> ValidationResult;
}

/// A single violation with context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Where the violation was found (`file` or `file.field`)
    pub field: Option<String>,
    /// Human-readable error message
    pub message: String,
    /// Stable code for matching (e.g. `record-length`)
    pub code: Option<String>,
}

impl ValidationError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            field: None,
            message: message.into(),
            code: None,
        }
    }

    pub fn field<S: Into<String>, M: Into<String>>(field: S, message: M) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Prefix the location with the enclosing file id.
    #[must_use]
    fn within(mut self, file: &str) -> Self {
        self.field = Some(match self.field.take() {
            Some(f) => format!("{file}.{f}"),
            None => file.to_string(),
        });
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref field) = self.field {
            write!(f, "[{field}] {}", self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref code) = self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Combine multiple validation results.
pub fn combine_validations(results: Vec<ValidationResult>) -> ValidationResult {
    let mut all_errors = Vec::new();
    for result in results {
        if let Err(mut errors) = result {
            all_errors.append(&mut errors);
        }
    }
    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

impl Validate for FieldSpec {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let err = |message: String, code: &str| {
            ValidationError::field(self.name.clone(), message).with_code(code)
        };

        if self.length == 0 {
            errors.push(err("field has zero length".into(), "zero-length"));
        }

        match self.type_name.as_str() {
            "integer" | "double" => {}
            "key" => match self.key_type.as_deref() {
                None => errors.push(err("key field without keytype".into(), "missing-keytype")),
                Some("integer" | "string") => {}
                Some("tree") => match &self.key_lengths {
                    None => {
                        errors.push(err("tree key without keylength".into(), "missing-keylength"));
                    }
                    Some(levels) if levels.iter().sum::<usize>() > self.length => {
                        errors.push(err(
                            format!(
                                "keylength levels sum to {}, field length is {}",
                                levels.iter().sum::<usize>(),
                                self.length
                            ),
                            "keylength-overflow",
                        ));
                    }
                    Some(_) => {}
                },
                Some(other) => {
                    errors.push(err(format!("unsupported keytype '{other}'"), "unsupported-keytype"));
                }
            },
            other => errors.push(err(format!("unsupported type '{other}'"), "unsupported-type")),
        }

        if self.type_name == "key" && self.value_table.is_none() {
            errors.push(err("key field without values table".into(), "missing-values"));
        }

        into_result(errors)
    }
}

impl Validate for FileSpec {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        let total = self.fields_length();
        if total != self.record_length {
            errors.push(
                ValidationError::new(format!(
                    "field lengths sum to {total}, record length is {}",
                    self.record_length
                ))
                .with_code("record-length"),
            );
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                errors.push(
                    ValidationError::field(field.name.clone(), "duplicate field name")
                        .with_code("duplicate-field"),
                );
            }
        }

        let key_names: &[String] = match (&self.parent, &self.key) {
            (Some(parent), _) => {
                if parent.key.is_empty() {
                    errors.push(
                        ValidationError::new(format!(
                            "parent link to '{}' without key; records cannot be matched",
                            parent.file_id
                        ))
                        .with_code("missing-parent-key"),
                    );
                }
                &parent.key
            }
            (None, Some(key)) => key,
            (None, None) => {
                errors.push(
                    ValidationError::new("root file without key; records get an empty _id")
                        .with_code("missing-key"),
                );
                &[]
            }
        };
        for name in key_names {
            if self.field(name).is_none() {
                errors.push(
                    ValidationError::field(name.clone(), "key refers to an undeclared field")
                        .with_code("unknown-key-field"),
                );
            }
        }

        let field_results = self.fields.iter().map(Validate::validate).collect();
        if let Err(mut field_errors) = combine_validations(field_results) {
            errors.append(&mut field_errors);
        }

        match into_result(errors) {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors.into_iter().map(|e| e.within(&self.id)).collect()),
        }
    }
}

impl Validate for FormatDefinition {
    fn validate(&self) -> ValidationResult {
        let mut results = Vec::new();
        let mut ids = HashSet::new();
        for file in self.files() {
            if !ids.insert(file.id.as_str()) {
                results.push(Err(vec![
                    ValidationError::field(file.id.clone(), "file id declared twice")
                        .with_code("duplicate-file"),
                ]));
            }
            results.push(file.validate());
        }
        combine_validations(results)
    }
}
