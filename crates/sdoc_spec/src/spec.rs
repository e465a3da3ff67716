//! The validated specification model and its queries.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::base_types::BaseTypes;
use crate::cddl::{self, CddlDefinition, CddlDefinitions};
use crate::cluster::{DocCluster, DocClusters};
use crate::config::SpecConfig;
use crate::copyright::CopyrightInfo;
use crate::document::{Document, Documents};
use crate::error::{SpecError, SpecResult, SynthesisError};
use crate::graph::ReferenceGraph;
use crate::header::{CoseHeaders, Formats, HeaderKind, MetadataHeader, MetadataHeaders};
use crate::links::DocumentationLinks;
use crate::reader::{LoadedSpec, SpecReader};
use crate::rules::MetadataView;
use crate::types::{Authors, DocType, DocTypeId, MediaType};
use crate::validator::{Issue, SpecValidator, ValidationResult};

/// A fully loaded, validated and cross-referenced signed document
/// specification.
///
/// Built once and never mutated afterwards, so it can be shared between
/// threads as is (see [`SignedDocSpec::into_shared`]).
#[derive(Debug, Clone)]
pub struct SignedDocSpec {
    config: SpecConfig,
    spec: LoadedSpec,
    graph: ReferenceGraph,
    warnings: Vec<Issue>,
}

impl SignedDocSpec {
    /// Load a specification file with the default configuration.
    pub fn from_path(path: impl AsRef<Path>) -> SpecResult<Self> {
        Self::from_path_with(path, SpecConfig::default())
    }

    /// Load a specification file.
    pub fn from_path_with(path: impl AsRef<Path>, config: SpecConfig) -> SpecResult<Self> {
        Self::from_value(SpecReader::json_from_path(path)?, config)
    }

    /// Load a specification from JSON text with the default configuration.
    pub fn parse(content: &str) -> SpecResult<Self> {
        Self::parse_with(content, SpecConfig::default())
    }

    /// Load a specification from JSON text.
    pub fn parse_with(content: &str, config: SpecConfig) -> SpecResult<Self> {
        Self::from_value(serde_json::from_str(content)?, config)
    }

    /// Load a specification from a parsed JSON value.
    ///
    /// Entries that fail to read are still cross-checked against the rest, so
    /// a rejection reports every structural, referential and invariant error
    /// at once.
    pub fn from_value(root: Value, config: SpecConfig) -> SpecResult<Self> {
        match SpecReader::read_partial(root) {
            (Some(spec), structural) => Self::build(spec, structural, config),
            (None, structural) => Err(SpecError::Rejected(Box::new(structural))),
        }
    }

    /// Validate a structurally read specification, then derive the reference
    /// graph and synthesize the header group definitions.
    pub fn from_loaded(spec: LoadedSpec, config: SpecConfig) -> SpecResult<Self> {
        Self::build(spec, ValidationResult::new(), config)
    }

    fn build(mut spec: LoadedSpec, structural: ValidationResult, config: SpecConfig) -> SpecResult<Self> {
        debug!("Validating specification");
        let mut result = structural;
        result.merge_unreported(SpecValidator::validate(&spec, &config));
        for warning in &result.warnings {
            warn!("{}", warning);
        }
        let result = result.into_result()?;

        debug!("Building reference graph");
        let graph = ReferenceGraph::build(&spec.docs, &config.document_reference_format);

        debug!("Synthesizing header group definitions");
        for (name, kind) in [
            (&config.document_headers_definition, HeaderKind::Document),
            (&config.signature_headers_definition, HeaderKind::Signature),
            (&config.metadata_headers_definition, HeaderKind::Metadata),
        ] {
            let outcome = synthesize_group(&spec, name, kind, None);
            spec.cddl.add_synthesized(name, outcome);
        }

        info!(
            "Loaded specification: {} documents, {} CDDL definitions, {} warnings",
            spec.docs.len(),
            spec.cddl.names().len(),
            result.warnings.len()
        );

        Ok(Self {
            config,
            spec,
            graph,
            warnings: result.warnings,
        })
    }

    /// Wrap the model for sharing between readers.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn config(&self) -> &SpecConfig {
        &self.config
    }

    /// Non-fatal findings from loading.
    pub fn warnings(&self) -> &[Issue] {
        &self.warnings
    }

    // Documents

    /// All document names, in declaration order.
    pub fn document_names(&self) -> impl Iterator<Item = &str> {
        self.spec.docs.names()
    }

    pub fn documents(&self) -> &Documents {
        &self.spec.docs
    }

    pub fn get_document(&self, name: &str) -> SpecResult<&Document> {
        self.spec
            .docs
            .get(name)
            .ok_or_else(|| SpecError::DocumentNotFound(name.to_string()))
    }

    pub fn document_type(&self, name: &str) -> SpecResult<&DocType> {
        Ok(&self.get_document(name)?.doc_type)
    }

    /// The document whose type is exactly `ids`.
    pub fn doc_name_for_type(&self, ids: &[DocTypeId]) -> Option<&str> {
        self.spec
            .docs
            .iter()
            .find(|doc| doc.doc_type.ids() == ids)
            .map(Document::name)
    }

    /// A document type as slash-joined base type names, `Unknown` for
    /// unregistered ids.
    pub fn doc_type_names(&self, doc_type: &DocType) -> String {
        doc_type.formatted_names(|id| self.spec.base_types.name_for(id).unwrap_or("Unknown").to_string())
    }

    pub fn base_types(&self) -> &BaseTypes {
        &self.spec.base_types
    }

    // Metadata

    /// A metadata field, from one document or from the global set.
    pub fn get_metadata(&self, field: &str, doc: Option<&str>) -> SpecResult<&MetadataHeader> {
        let headers = match doc {
            Some(doc) => &self.get_document(doc)?.metadata,
            None => &self.spec.metadata.headers,
        };
        headers.get(field).ok_or_else(|| SpecError::MetadataNotFound {
            field: field.to_string(),
            doc: doc.map(str::to_string),
        })
    }

    /// Evaluate the rules of a metadata field.
    pub fn metadata_view(&self, field: &str, doc: Option<&str>) -> SpecResult<MetadataView<'_>> {
        let field = self.get_metadata(field, doc)?;
        Ok(MetadataView::new(field, &self.config.document_reference_format))
    }

    /// Markdown tables for the global metadata fields, or for the fields of
    /// one document. A document's excluded fields are left out.
    pub fn metadata_as_markdown(&self, doc: Option<&str>) -> SpecResult<String> {
        let reference_format = &self.config.document_reference_format;
        let blocks: Vec<String> = match doc {
            None => self
                .spec
                .metadata
                .headers
                .all()
                .map(|field| MetadataView::new(field, reference_format).to_markdown(None))
                .collect(),
            Some(name) => {
                let doc = self.get_document(name)?;
                let ids = doc.doc_type.formatted_ids();
                doc.metadata
                    .all()
                    .filter(|field| !field.required.is_excluded())
                    .map(|field| MetadataView::new(field, reference_format).to_markdown(Some(ids.as_str())))
                    .collect()
            }
        };
        Ok(blocks.join("\n").trim().to_string())
    }

    pub fn metadata_headers(&self) -> &MetadataHeaders {
        &self.spec.metadata.headers
    }

    pub fn metadata_formats(&self) -> &Formats {
        &self.spec.metadata.formats
    }

    // Reference graph

    /// Documents that `doc` references.
    pub fn all_references_of(&self, doc: &str) -> SpecResult<&BTreeSet<String>> {
        self.graph
            .references(doc)
            .ok_or_else(|| SpecError::DocumentNotFound(doc.to_string()))
    }

    /// Documents that reference `doc`.
    pub fn all_docs_referencing(&self, doc: &str) -> SpecResult<&BTreeSet<String>> {
        self.graph
            .referenced_by(doc)
            .ok_or_else(|| SpecError::DocumentNotFound(doc.to_string()))
    }

    pub fn reference_graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    // CDDL

    pub fn cddl_definitions(&self) -> &CddlDefinitions {
        &self.spec.cddl
    }

    /// A declared or synthesized definition. A synthesized definition that
    /// failed returns its synthesis error.
    pub fn cddl_definition(&self, name: &str) -> SpecResult<&CddlDefinition> {
        self.spec.cddl.get(name)
    }

    /// A complete CDDL file for `root` with every dependency inlined once.
    pub fn cddl_file(&self, root: &str) -> SpecResult<String> {
        self.spec.cddl.cddl_file(root)
    }

    /// Synthesize a header group definition afresh, for the global header
    /// sets or for one document's headers and metadata.
    ///
    /// Signature headers are never document specific.
    pub fn synthesize(&self, kind: HeaderKind, doc: Option<&str>) -> SpecResult<CddlDefinition> {
        let doc = doc.map(|name| self.get_document(name)).transpose()?;
        let name = match kind {
            HeaderKind::Document => &self.config.document_headers_definition,
            HeaderKind::Signature => &self.config.signature_headers_definition,
            HeaderKind::Metadata => &self.config.metadata_headers_definition,
        };
        Ok(synthesize_group(&self.spec, name, kind, doc)?)
    }

    // Clusters

    pub fn clusters(&self) -> &DocClusters {
        &self.spec.clusters
    }

    pub fn cluster_of(&self, doc: &str) -> Option<&DocCluster> {
        self.spec.clusters.cluster_of(doc)
    }

    pub fn cluster_for_reference_target_set<S: AsRef<str>>(&self, names: &[S]) -> Option<&DocCluster> {
        self.spec.clusters.cluster_for_reference_target_set(names)
    }

    // COSE headers

    pub fn cose_headers(&self) -> &CoseHeaders {
        &self.spec.cose.headers
    }

    pub fn signature_headers(&self) -> &CoseHeaders {
        &self.spec.cose.signature_headers
    }

    pub fn header_formats(&self) -> &Formats {
        &self.spec.cose.header_formats
    }

    // Media types, links, authorship

    pub fn content_type(&self, name: &str) -> Option<&MediaType> {
        self.spec.content_types.get(name)
    }

    pub fn content_type_description(&self, name: &str) -> Option<&str> {
        self.content_type(name).map(|t| t.description.as_str())
    }

    pub fn encoding_type_description(&self, name: &str) -> Option<&str> {
        self.spec.encoding_types.get(name).map(|t| t.description.as_str())
    }

    pub fn links(&self) -> &DocumentationLinks {
        &self.spec.links
    }

    /// The URL of a link, by name or alias.
    pub fn link(&self, name: &str) -> Option<&str> {
        self.spec.links.resolve(name)
    }

    pub fn link_aka(&self, alias: &str) -> Option<&str> {
        self.spec.links.aka(alias)
    }

    /// All link names and aliases, longest first.
    pub fn link_names(&self) -> Vec<&str> {
        self.spec.links.link_names()
    }

    pub fn authors(&self) -> &Authors {
        &self.spec.authors
    }

    /// Authors, copyright and change log for the whole specification, or
    /// for one document.
    pub fn copyright_info(&self, doc: Option<&str>) -> SpecResult<CopyrightInfo<'_>> {
        let doc = match doc {
            Some(name) => {
                let doc = self.get_document(name)?;
                Some((&doc.authors, doc.versions.as_slice()))
            }
            None => None,
        };
        Ok(CopyrightInfo::new(&self.spec.authors, &self.spec.copyright, doc))
    }

    pub fn form_template(&self) -> Option<&Value> {
        self.spec.form_template.as_ref()
    }

    pub fn presentation_template(&self) -> Option<&Value> {
        self.spec.presentation_template.as_ref()
    }
}

fn synthesize_group(
    spec: &LoadedSpec,
    name: &str,
    kind: HeaderKind,
    doc: Option<&Document>,
) -> Result<CddlDefinition, SynthesisError> {
    let base = spec.cddl.declared(name);
    match (kind, doc) {
        (HeaderKind::Document, Some(doc)) => cddl::synthesize(name, base, doc.headers.all(), &spec.cose.header_formats),
        (HeaderKind::Document, None) => cddl::synthesize(name, base, spec.cose.headers.all(), &spec.cose.header_formats),
        (HeaderKind::Signature, _) => cddl::synthesize(
            name,
            base,
            spec.cose.signature_headers.all(),
            &spec.cose.header_formats,
        ),
        (HeaderKind::Metadata, Some(doc)) => cddl::synthesize(name, base, doc.metadata.all(), &spec.metadata.formats),
        (HeaderKind::Metadata, None) => cddl::synthesize(name, base, spec.metadata.headers.all(), &spec.metadata.formats),
    }
}
