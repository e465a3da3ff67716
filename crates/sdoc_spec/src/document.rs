//! Individual document definitions.

use indexmap::IndexMap;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::header::{CoseHeader, CoseHeaders, MetadataHeader, MetadataHeaders};
use crate::types::{Authors, ChangeLogEntry, DocType};

/// Header holding a document's content type.
pub const CONTENT_TYPE_HEADER: &str = "content type";

/// Front and back end notes on how a document is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessLogic {
    #[serde(default)]
    pub front_end: Option<String>,
    #[serde(default)]
    pub back_end: Option<String>,
}

/// Schema for a document payload: a URL or an inline JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadSchema {
    Url(String),
    Inline(serde_json::Map<String, Value>),
}

/// A titled example payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayloadExample {
    pub title: String,
    pub description: String,
    pub example: Value,
}

/// Payload definition of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payload {
    pub description: String,
    /// The document has no payload, encoded as CBOR `null`.
    #[serde(default)]
    pub nil: bool,
    #[serde(default)]
    pub schema: Option<PayloadSchema>,
    #[serde(default)]
    pub examples: Vec<PayloadExample>,
}

impl Payload {
    /// Check every example against the payload schema.
    ///
    /// Inline schemas are compiled and applied. Schemas given by URL are not
    /// fetched, so their examples are left unchecked. Examples without any
    /// schema are an error.
    pub fn example_errors(&self) -> Vec<String> {
        if self.examples.is_empty() {
            return Vec::new();
        }

        let schema = match &self.schema {
            None => return vec!["payload has examples but no schema to validate them".to_string()],
            Some(PayloadSchema::Url(url)) => {
                debug!("Not fetching payload schema {}, examples left unchecked", url);
                return Vec::new();
            }
            Some(PayloadSchema::Inline(schema)) => Value::Object(schema.clone()),
        };

        let compiled = match JSONSchema::compile(&schema) {
            Ok(compiled) => compiled,
            Err(e) => return vec![format!("payload schema is not a valid JSON schema: {e}")],
        };

        let mut errors = Vec::new();
        for example in &self.examples {
            if let Err(violations) = compiled.validate(&example.example) {
                for violation in violations {
                    errors.push(format!(
                        "example `{}` does not match the schema at `{}`: {}",
                        example.title, violation.instance_path, violation
                    ));
                }
            }
        }
        errors
    }
}

/// Roles allowed to sign a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Roles {
    #[serde(default)]
    pub user: Vec<String>,
    #[serde(default)]
    pub admin: Vec<String>,
}

/// Who may publish new versions of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRules {
    #[serde(default)]
    pub author: bool,
    #[serde(default)]
    pub collaborators: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Signing and update permissions of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signers {
    pub roles: Roles,
    #[serde(default)]
    pub update: UpdateRules,
}

/// A document record as it appears in the `docs` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDocument {
    #[serde(rename = "type")]
    pub(crate) doc_type: DocType,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) validation: Option<String>,
    #[serde(default)]
    pub(crate) business_logic: BusinessLogic,
    #[serde(default)]
    pub(crate) notes: Vec<String>,
    pub(crate) headers: IndexMap<String, CoseHeader>,
    pub(crate) metadata: IndexMap<String, MetadataHeader>,
    #[serde(default)]
    pub(crate) payload: Option<Payload>,
    pub(crate) signers: Signers,
    pub(crate) authors: Authors,
    pub(crate) versions: Vec<ChangeLogEntry>,
    #[serde(default)]
    pub(crate) draft: bool,
}

/// A document definition, with its headers and metadata stamped with their
/// names and ordered canonically.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    pub doc_type: DocType,
    pub description: Option<String>,
    pub validation: Option<String>,
    pub business_logic: BusinessLogic,
    pub notes: Vec<String>,
    pub headers: CoseHeaders,
    pub metadata: MetadataHeaders,
    pub payload: Option<Payload>,
    pub signers: Signers,
    pub authors: Authors,
    pub versions: Vec<ChangeLogEntry>,
    pub draft: bool,
}

impl Document {
    pub(crate) fn from_raw(
        name: &str,
        raw: RawDocument,
        header_order: &[String],
        metadata_order: &[String],
    ) -> Self {
        Self {
            name: name.to_string(),
            doc_type: raw.doc_type,
            description: raw.description,
            validation: raw.validation,
            business_logic: raw.business_logic,
            notes: raw.notes,
            headers: CoseHeaders::new(raw.headers, header_order, Some(name)),
            metadata: MetadataHeaders::new(raw.metadata, metadata_order, Some(name)),
            payload: raw.payload,
            signers: raw.signers,
            authors: raw.authors,
            versions: raw.versions,
            draft: raw.draft,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value(s) of the `content type` header, or `Undefined`.
    pub fn content_type(&self) -> Vec<&str> {
        match self.headers.get(CONTENT_TYPE_HEADER) {
            Some(header) if !header.value.is_empty() => {
                header.value.iter().map(String::as_str).collect()
            }
            _ => vec!["Undefined"],
        }
    }
}

/// All documents of a specification, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Documents {
    docs: IndexMap<String, Document>,
}

impl Documents {
    pub(crate) fn new(docs: IndexMap<String, Document>) -> Self {
        Self { docs }
    }

    pub fn get(&self, name: &str) -> Option<&Document> {
        self.docs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.docs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.docs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
