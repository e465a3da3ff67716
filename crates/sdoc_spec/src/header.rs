//! COSE header and metadata field definitions.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ordered::{Named, OrderedFieldSet};
use crate::types::{string_or_list, Format, RequirementLevel};

/// COSE header labels are either text or small integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoseLabel {
    Int(i64),
    Text(String),
}

impl fmt::Display for CoseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoseLabel::Int(label) => write!(f, "{label}"),
            CoseLabel::Text(label) => write!(f, "\"{label}\""),
        }
    }
}

/// The three header families a specification declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Document,
    Signature,
    Metadata,
}

/// Common view over COSE headers and metadata fields, as needed to
/// synthesize a CDDL group from a set of them.
pub trait Header {
    fn name(&self) -> &str;

    fn cose_label(&self) -> Option<&CoseLabel>;

    fn required(&self) -> RequirementLevel;

    fn format(&self) -> &str;

    fn exclusive(&self) -> &[String];

    /// The CDDL map key for this header.
    fn label(&self) -> String {
        match self.cose_label() {
            Some(label) => label.to_string(),
            None => format!("\"{}\"", self.name()),
        }
    }
}

/// A COSE protected header definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoseHeader {
    #[serde(rename = "coseLabel", default)]
    pub cose_label: Option<CoseLabel>,
    pub description: String,
    pub required: RequirementLevel,
    pub format: String,
    #[serde(default, deserialize_with = "string_or_list")]
    pub value: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub exclusive: Vec<String>,

    #[serde(skip)]
    name: String,
    #[serde(skip)]
    doc_name: Option<String>,
}

impl CoseHeader {
    /// The document this header is scoped to, if any.
    pub fn doc_name(&self) -> Option<&str> {
        self.doc_name.as_deref()
    }
}

impl Named for CoseHeader {
    fn stamp(&mut self, name: &str, doc_name: Option<&str>) {
        self.name = name.to_string();
        self.doc_name = doc_name.map(str::to_string);
    }
}

impl Header for CoseHeader {
    fn name(&self) -> &str {
        &self.name
    }

    fn cose_label(&self) -> Option<&CoseLabel> {
        self.cose_label.as_ref()
    }

    fn required(&self) -> RequirementLevel {
        self.required
    }

    fn format(&self) -> &str {
        &self.format
    }

    fn exclusive(&self) -> &[String] {
        &self.exclusive
    }
}

/// A metadata field definition, either global or scoped to one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataHeader {
    #[serde(rename = "coseLabel", default)]
    pub cose_label: Option<CoseLabel>,
    pub description: String,
    pub required: RequirementLevel,
    pub format: String,
    #[serde(default)]
    pub validation: Option<String>,
    /// Names of the documents a `Document Reference` field may point at.
    #[serde(rename = "type", default, deserialize_with = "string_or_list")]
    pub doc_types: Vec<String>,
    #[serde(default)]
    pub multiple: Option<bool>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub linked_refs: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub exclusive: Vec<String>,

    #[serde(skip)]
    name: String,
    #[serde(skip)]
    doc_name: Option<String>,
}

impl MetadataHeader {
    /// The document this field is scoped to, if any.
    pub fn doc_name(&self) -> Option<&str> {
        self.doc_name.as_deref()
    }

    /// May a reference list hold more than one entry.
    pub fn multiple(&self) -> bool {
        self.multiple.unwrap_or(false)
    }

    /// Is this field a reference to other documents.
    pub fn is_reference(&self, reference_format: &str) -> bool {
        self.format == reference_format
    }
}

impl Named for MetadataHeader {
    fn stamp(&mut self, name: &str, doc_name: Option<&str>) {
        self.name = name.to_string();
        self.doc_name = doc_name.map(str::to_string);
    }
}

impl Header for MetadataHeader {
    fn name(&self) -> &str {
        &self.name
    }

    fn cose_label(&self) -> Option<&CoseLabel> {
        self.cose_label.as_ref()
    }

    fn required(&self) -> RequirementLevel {
        self.required
    }

    fn format(&self) -> &str {
        &self.format
    }

    fn exclusive(&self) -> &[String] {
        &self.exclusive
    }
}

pub type CoseHeaders = OrderedFieldSet<CoseHeader>;
pub type MetadataHeaders = OrderedFieldSet<MetadataHeader>;

/// Named value formats, each mapped onto a CDDL type.
pub type Formats = IndexMap<String, Format>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let raw = r#"{
            "alg": {"coseLabel": 1, "description": "", "required": "required", "format": "COSE Algorithm"},
            "content type": {"coseLabel": "content-type", "description": "", "required": "yes", "format": "Media Type"},
            "custom": {"description": "", "required": "optional", "format": "Text"}
        }"#;
        let raw: IndexMap<String, CoseHeader> = serde_json::from_str(raw).unwrap();
        let headers = CoseHeaders::new(raw, &[], None);

        let labels: Vec<String> = headers.all().map(Header::label).collect();
        assert_eq!(labels, vec!["1", "\"content-type\"", "\"custom\""]);
    }

    #[test]
    fn test_metadata_header_lists() {
        let raw = r#"{
            "description": "Reference to a template",
            "required": "optional",
            "format": "Document Reference",
            "type": "Proposal Form Template",
            "linked_refs": ["parameters"],
            "multiple": null
        }"#;
        let header: MetadataHeader = serde_json::from_str(raw).unwrap();
        assert_eq!(header.doc_types, vec!["Proposal Form Template"]);
        assert_eq!(header.linked_refs, vec!["parameters"]);
        assert!(header.exclusive.is_empty());
        assert!(!header.multiple());
        assert!(header.is_reference("Document Reference"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let raw = r#"{"description": "", "required": "optional", "format": "Text", "colour": "red"}"#;
        assert!(serde_json::from_str::<MetadataHeader>(raw).is_err());
    }
}
