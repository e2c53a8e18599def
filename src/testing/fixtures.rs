//! A small household survey used across tests and examples.
//!
//! `hogares` (households, record length 7) is the root file keyed by
//! `numero`; `personas` (record length 10) nests under it by the same
//! field.

use crate::definition::{FieldSpec, FileSpec, FormatDefinition, LookupNode, NullSentinel, ParentLink};

/// Two-file definition: `hogares` and its child `personas`.
///
/// # Example
///
/// ```
/// use microlector::testing::household_definition;
///
/// let def = household_definition();
/// assert_eq!(def.files().len(), 2);
/// assert!(def.file("personas").unwrap().is_child());
/// ```
#[must_use]
pub fn household_definition() -> FormatDefinition {
    FormatDefinition::new(vec![households(), persons()])
}

fn households() -> FileSpec {
    let mut region = FieldSpec::new("region", "key", 2);
    region.key_type = Some("string".into());
    region.value_table = Some(
        [("01", "Norte"), ("02", "Sur")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), LookupNode::Label(v.to_string())))
            .collect(),
    );

    FileSpec {
        id: "hogares".into(),
        record_length: 7,
        fields: vec![
            FieldSpec::new("numero", "integer", 4),
            region,
            FieldSpec::new("miembros", "integer", 1),
        ],
        key: Some(vec!["numero".into()]),
        parent: None,
    }
}

fn persons() -> FileSpec {
    let mut income = FieldSpec::new("ingresos", "double", 6);
    income.decimals = Some(2);
    income.null_sentinel = Some(NullSentinel::new("999999"));

    FileSpec {
        id: "personas".into(),
        record_length: 10,
        fields: vec![FieldSpec::new("numero", "integer", 4), income],
        key: None,
        parent: Some(ParentLink {
            file_id: "hogares".into(),
            key: vec!["numero".into()],
        }),
    }
}

/// Household records `1` (Norte), `2` (Sur) and `3` (Norte).
#[must_use]
pub fn household_lines() -> Vec<String> {
    ["0001011", "0002022", "0003013"].map(String::from).to_vec()
}

/// One person per household; household `2`'s income is the null sentinel.
#[must_use]
pub fn person_lines() -> Vec<String> {
    ["0001123456", "0002999999", "0003001050"].map(String::from).to_vec()
}
