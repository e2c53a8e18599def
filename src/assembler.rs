//! Turning record lines into documents and placing them in the store.
//!
//! [`RecordLayout`] compiles a [`FileSpec`] once: each field gets its fixed
//! character window (the sum of the preceding widths) and a compiled
//! [`Decoder`]. [`RecordLayout::assemble`] then decodes a line into a
//! [`Document`] holding only the non-null fields.
//!
//! [`place`] decides where a document goes:
//! - a root file's record gets an identity built from its `key` fields and
//!   is inserted into the collection named after the file;
//! - a child file's record loses its parent-key fields, which instead form
//!   the identity of the parent record it is appended to, under an array
//!   named after the child file.

use crate::decode::Decoder;
use crate::definition::FileSpec;
use crate::document::Document;
use crate::error::Result;
use crate::store::DocumentStore;
use tracing::warn;

#[derive(Debug, Clone)]
struct CompiledField<'a> {
    name: &'a str,
    offset: usize,
    length: usize,
    decoder: Decoder<'a>,
}

/// A file spec with decoders and offsets resolved.
#[derive(Debug, Clone)]
pub struct RecordLayout<'a> {
    spec: &'a FileSpec,
    fields: Vec<CompiledField<'a>>,
}

impl<'a> RecordLayout<'a> {
    /// Compile every field of `spec`.
    ///
    /// # Errors
    /// Propagates [`Decoder::compile`] failures.
    pub fn compile(spec: &'a FileSpec) -> Result<Self> {
        let mut offset = 0;
        let mut fields = Vec::with_capacity(spec.fields.len());
        for field in &spec.fields {
            fields.push(CompiledField {
                name: &field.name,
                offset,
                length: field.length,
                decoder: Decoder::compile(field)?,
            });
            offset += field.length;
        }
        Ok(Self { spec, fields })
    }

    #[must_use]
    pub fn spec(&self) -> &'a FileSpec {
        self.spec
    }

    /// Decode `line` field by field, dropping nulls.
    ///
    /// Windows past the end of a short line are truncated, never out of
    /// bounds; line length is validated upstream by the line reader.
    #[must_use]
    pub fn assemble(&self, line: &str) -> Document {
        let bounds: Vec<usize> = line
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(line.len()))
            .collect();
        let chars = bounds.len() - 1;
        let byte_at = |char_pos: usize| bounds[char_pos.min(chars)];

        let mut doc = Document::new();
        for field in &self.fields {
            let raw = &line[byte_at(field.offset)..byte_at(field.offset + field.length)];
            if let Some(value) = field.decoder.decode(raw) {
                doc.insert(field.name, value);
            }
        }
        doc
    }
}

/// Decode a single line against `spec`.
///
/// # Errors
/// Propagates [`Decoder::compile`] failures.
pub fn assemble(spec: &FileSpec, line: &str) -> Result<Document> {
    Ok(RecordLayout::compile(spec)?.assemble(line))
}

/// Where a document is written.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// New record in `collection`; the document carries its identity.
    Insert {
        collection: String,
        document: Document,
    },
    /// Append `document` to array `field` of record `identity` in `collection`.
    Push {
        collection: String,
        identity: String,
        field: String,
        document: Document,
    },
}

/// Concatenate the string forms of `names` in `doc`.
///
/// A name missing from the document (decoded to null) contributes nothing.
#[must_use]
pub fn identity(spec: &FileSpec, doc: &Document, names: &[String]) -> String {
    let mut id = String::new();
    for name in names {
        match doc.get(name) {
            Some(value) => id.push_str(&value.to_string()),
            None => warn!(file = spec.id.as_str(), field = name.as_str(), "key field is null"),
        }
    }
    id
}

/// Apply the root identity or child nesting transform to `doc`.
#[must_use]
pub fn place(spec: &FileSpec, mut doc: Document) -> Placement {
    match &spec.parent {
        Some(parent) => {
            let identity = identity(spec, &doc, &parent.key);
            for name in &parent.key {
                doc.remove(name);
            }
            Placement::Push {
                collection: parent.file_id.clone(),
                identity,
                field: spec.id.clone(),
                document: doc,
            }
        }
        None => {
            let id = identity(spec, &doc, spec.key.as_deref().unwrap_or_default());
            doc.set_id(id);
            Placement::Insert {
                collection: spec.id.clone(),
                document: doc,
            }
        }
    }
}

/// Place `doc` and write it; returns once the store has acknowledged.
///
/// # Errors
/// Propagates the store's [`Error::StoreWrite`](crate::Error::StoreWrite).
pub fn commit<S: DocumentStore + ?Sized>(store: &S, spec: &FileSpec, doc: Document) -> Result<()> {
    match place(spec, doc) {
        Placement::Insert {
            collection,
            document,
        } => store.insert(&collection, &document),
        Placement::Push {
            collection,
            identity,
            field,
            document,
        } => store.push_append(&collection, &identity, &field, &document),
    }
}
