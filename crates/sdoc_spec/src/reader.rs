//! Specification file reading: JSON to name-stamped registries.
//!
//! Every section, document and header is deserialized on its own so that one
//! malformed entry never hides problems elsewhere. All structural findings
//! are collected before the read fails, and [`SpecReader::read_partial`]
//! keeps whatever did parse so it can still be cross-checked.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::base_types::BaseTypes;
use crate::cddl::{CddlDefinition, CddlDefinitions};
use crate::cluster::{DocCluster, DocClusters};
use crate::copyright::Copyright;
use crate::document::{Document, Documents, RawDocument};
use crate::error::{SpecError, SpecResult};
use crate::header::{CoseHeader, CoseHeaders, Formats, MetadataHeader, MetadataHeaders};
use crate::links::DocumentationLinks;
use crate::types::{Authors, MediaType};
use crate::validator::{IssueKind, ValidationResult};

/// Top-level sections every specification must have.
pub const REQUIRED_SECTIONS: &[&str] = &[
    "authors",
    "base_types",
    "cddlDefinitions",
    "contentTypes",
    "copyright",
    "cose",
    "docClusters",
    "docs",
    "documentationLinks",
    "encodingTypes",
    "linkAKA",
    "metadata",
];

/// Top-level sections that are kept as opaque JSON when present.
pub const OPTIONAL_SECTIONS: &[&str] = &["formTemplate", "presentationTemplate"];

/// The `cose` section.
#[derive(Debug, Clone, Default)]
pub struct CoseSection {
    pub header_formats: Formats,
    pub headers: CoseHeaders,
    pub headers_order: Vec<String>,
    pub signature_headers: CoseHeaders,
}

/// The `metadata` section.
#[derive(Debug, Clone, Default)]
pub struct MetadataSection {
    pub headers: MetadataHeaders,
    pub formats: Formats,
    pub order: Vec<String>,
}

/// A structurally read specification whose entities carry their names.
///
/// Nothing has been cross-checked yet and no derived data exists. When read
/// with [`SpecReader::read_partial`] it holds only the entries that parsed.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub authors: Authors,
    pub base_types: BaseTypes,
    pub cddl: CddlDefinitions,
    pub content_types: IndexMap<String, MediaType>,
    pub encoding_types: IndexMap<String, MediaType>,
    pub copyright: Copyright,
    pub cose: CoseSection,
    pub clusters: DocClusters,
    pub docs: Documents,
    pub links: DocumentationLinks,
    pub metadata: MetadataSection,
    pub form_template: Option<Value>,
    pub presentation_template: Option<Value>,
}

/// Reader for specification files.
pub struct SpecReader;

impl SpecReader {
    /// Read a specification file.
    pub fn read_path(path: impl AsRef<Path>) -> SpecResult<LoadedSpec> {
        Self::read_value(Self::json_from_path(path)?)
    }

    /// Parse a specification file as JSON, without reading its sections.
    pub fn json_from_path(path: impl AsRef<Path>) -> SpecResult<Value> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpecError::NotFound(path.to_path_buf()));
        }
        debug!("Reading specification from {:?}", path);

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read a specification from JSON text.
    pub fn read_str(content: &str) -> SpecResult<LoadedSpec> {
        let root: Value = serde_json::from_str(content)?;
        Self::read_value(root)
    }

    /// Read a specification from an already parsed JSON value.
    pub fn read_value(root: Value) -> SpecResult<LoadedSpec> {
        match Self::read_partial(root) {
            (Some(spec), result) if result.valid => Ok(spec),
            (_, result) => Err(SpecError::Rejected(Box::new(result))),
        }
    }

    /// Read every entry that parses, along with all structural findings.
    ///
    /// Entries that fail to parse are left out and a missing `copyright`
    /// section reads as an empty record. Only a root that is not an object
    /// yields no specification at all.
    pub fn read_partial(root: Value) -> (Option<LoadedSpec>, ValidationResult) {
        let mut result = ValidationResult::new();

        let mut root = match root {
            Value::Object(root) => root,
            other => {
                result.add_error(
                    IssueKind::Structural,
                    "",
                    format!("specification must be a JSON object, found {}", shape(&other)),
                );
                return (None, result);
            }
        };
        reject_unknown(&root, &[REQUIRED_SECTIONS, OPTIONAL_SECTIONS].concat(), "", &mut result);

        let authors: Authors = section(&mut root, "authors", &mut result).unwrap_or_default();
        let raw_base_types: IndexMap<String, String> =
            section(&mut root, "base_types", &mut result).unwrap_or_default();
        let base_types = BaseTypes::from_raw(raw_base_types, &mut result);
        let cddl_defs: IndexMap<String, CddlDefinition> = entries_section(&mut root, "cddlDefinitions", &mut result);
        let content_types: IndexMap<String, MediaType> = entries_section(&mut root, "contentTypes", &mut result);
        let encoding_types: IndexMap<String, MediaType> = entries_section(&mut root, "encodingTypes", &mut result);
        let copyright: Copyright = section(&mut root, "copyright", &mut result).unwrap_or_default();
        let clusters: IndexMap<String, DocCluster> = entries_section(&mut root, "docClusters", &mut result);
        let links: IndexMap<String, String> = section(&mut root, "documentationLinks", &mut result).unwrap_or_default();
        let link_aka: IndexMap<String, String> = section(&mut root, "linkAKA", &mut result).unwrap_or_default();

        let cose = match root.remove("cose") {
            Some(value) => read_cose(value, &mut result),
            None => {
                missing(&mut result, "cose");
                CoseSection::default()
            }
        };
        let metadata = match root.remove("metadata") {
            Some(value) => read_metadata(value, &mut result),
            None => {
                missing(&mut result, "metadata");
                MetadataSection::default()
            }
        };

        let raw_docs: IndexMap<String, RawDocument> = match root.remove("docs") {
            Some(value) => entries(value, "docs", &mut result, read_document),
            None => {
                missing(&mut result, "docs");
                IndexMap::new()
            }
        };

        let form_template = root.remove("formTemplate");
        let presentation_template = root.remove("presentationTemplate");

        let docs = raw_docs
            .into_iter()
            .map(|(name, raw)| {
                let doc = Document::from_raw(&name, raw, &cose.headers_order, &metadata.order);
                (name, doc)
            })
            .collect();

        debug!("Structural read complete: {} error(s)", result.errors.len());
        let spec = LoadedSpec {
            authors,
            base_types,
            cddl: CddlDefinitions::new(cddl_defs),
            content_types,
            encoding_types,
            copyright,
            cose,
            clusters: DocClusters::new(clusters),
            docs: Documents::new(docs),
            links: DocumentationLinks::new(links, link_aka),
            metadata,
            form_template,
            presentation_template,
        };
        (Some(spec), result)
    }
}

fn read_cose(value: Value, result: &mut ValidationResult) -> CoseSection {
    let Some(mut fields) = object(value, "cose", result) else {
        return CoseSection::default();
    };
    reject_unknown(
        &fields,
        &["headerFormats", "headers", "headersOrder", "signature_headers"],
        "cose",
        result,
    );

    let header_formats = entries_field(&mut fields, "cose", "headerFormats", result);
    let headers: IndexMap<String, CoseHeader> = entries_field(&mut fields, "cose", "headers", result);
    let headers_order: Vec<String> = field(&mut fields, "cose", "headersOrder", result).unwrap_or_default();
    let signature_headers: IndexMap<String, CoseHeader> =
        entries_field(&mut fields, "cose", "signature_headers", result);

    CoseSection {
        header_formats,
        headers: CoseHeaders::new(headers, &headers_order, None),
        signature_headers: CoseHeaders::new(signature_headers, &headers_order, None),
        headers_order,
    }
}

fn read_metadata(value: Value, result: &mut ValidationResult) -> MetadataSection {
    let Some(mut fields) = object(value, "metadata", result) else {
        return MetadataSection::default();
    };
    reject_unknown(&fields, &["headers", "formats", "order"], "metadata", result);

    let headers: IndexMap<String, MetadataHeader> = entries_field(&mut fields, "metadata", "headers", result);
    let formats = entries_field(&mut fields, "metadata", "formats", result);
    let order: Vec<String> = field(&mut fields, "metadata", "order", result).unwrap_or_default();

    MetadataSection {
        headers: MetadataHeaders::new(headers, &order, None),
        formats,
        order,
    }
}

/// Documents are read in three parts so that a bad header is reported with
/// its own path rather than as a failure of the whole document.
fn read_document(value: Value, path: &str, result: &mut ValidationResult) -> Option<RawDocument> {
    let mut fields = object(value, path, result)?;

    let headers: IndexMap<String, CoseHeader> = entries_field(&mut fields, path, "headers", result);
    let metadata: IndexMap<String, MetadataHeader> = entries_field(&mut fields, path, "metadata", result);
    fields.insert("headers".to_string(), Value::Object(Map::new()));
    fields.insert("metadata".to_string(), Value::Object(Map::new()));

    let mut raw: RawDocument = parse(Value::Object(fields), path, result)?;
    raw.headers = headers;
    raw.metadata = metadata;
    Some(raw)
}

fn missing(result: &mut ValidationResult, path: &str) {
    result.add_error(IssueKind::Structural, path, "missing required section");
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn reject_unknown(fields: &Map<String, Value>, allowed: &[&str], prefix: &str, result: &mut ValidationResult) {
    for key in fields.keys() {
        if !allowed.contains(&key.as_str()) {
            result.add_error(IssueKind::Structural, join(prefix, key), "unknown field");
        }
    }
}

fn object(value: Value, path: &str, result: &mut ValidationResult) -> Option<Map<String, Value>> {
    match value {
        Value::Object(fields) => Some(fields),
        other => {
            result.add_error(
                IssueKind::Structural,
                path,
                format!("expected an object, found {}", shape(&other)),
            );
            None
        }
    }
}

fn parse<T: DeserializeOwned>(value: Value, path: &str, result: &mut ValidationResult) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            result.add_error(IssueKind::Structural, path, e.to_string());
            None
        }
    }
}

/// Read every entry of an object with `read`, keeping the ones that parse.
fn entries<T>(
    value: Value,
    path: &str,
    result: &mut ValidationResult,
    read: impl Fn(Value, &str, &mut ValidationResult) -> Option<T>,
) -> IndexMap<String, T> {
    let Some(fields) = object(value, path, result) else {
        return IndexMap::new();
    };
    let mut parsed = IndexMap::with_capacity(fields.len());
    for (name, value) in fields {
        if let Some(entry) = read(value, &join(path, &name), result) {
            parsed.insert(name, entry);
        }
    }
    parsed
}

fn section<T: DeserializeOwned>(root: &mut Map<String, Value>, key: &str, result: &mut ValidationResult) -> Option<T> {
    field(root, "", key, result)
}

fn entries_section<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    key: &str,
    result: &mut ValidationResult,
) -> IndexMap<String, T> {
    entries_field(root, "", key, result)
}

fn field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    prefix: &str,
    key: &str,
    result: &mut ValidationResult,
) -> Option<T> {
    let path = join(prefix, key);
    match fields.remove(key) {
        Some(value) => parse(value, &path, result),
        None => {
            result.add_error(IssueKind::Structural, path, "missing required field");
            None
        }
    }
}

fn entries_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    prefix: &str,
    key: &str,
    result: &mut ValidationResult,
) -> IndexMap<String, T> {
    let path = join(prefix, key);
    match fields.remove(key) {
        Some(value) => entries(value, &path, result, parse),
        None => {
            result.add_error(IssueKind::Structural, path, "missing required field");
            IndexMap::new()
        }
    }
}
