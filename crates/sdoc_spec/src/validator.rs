//! Cross-entity validation of a loaded specification.

use std::collections::HashMap;
use std::fmt;

use crate::config::SpecConfig;
use crate::document::Documents;
use crate::error::{SpecError, SpecResult};
use crate::header::{Formats, Header, MetadataHeaders};
use crate::ordered::OrderedFieldSet;
use crate::reader::LoadedSpec;

/// The class of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Wrong shape or type, unknown enum value, missing section.
    Structural,
    /// A name that should resolve to another entity does not.
    Referential,
    /// Entities that each look fine but contradict one another.
    Invariant,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Structural => "structural",
            IssueKind::Referential => "referential",
            IssueKind::Invariant => "invariant",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding, located by a dotted path into the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "[{}] {}", self.kind, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.kind, self.path, self.message)
        }
    }
}

/// Validation result with details.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, kind: IssueKind, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(Issue {
            kind,
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, kind: IssueKind, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Issue {
            kind,
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Merge `other`, skipping its issues at or beneath a path this result
    /// already has an error for.
    pub fn merge_unreported(&mut self, other: ValidationResult) {
        let reported: Vec<String> = self
            .errors
            .iter()
            .filter(|issue| !issue.path.is_empty())
            .map(|issue| issue.path.clone())
            .collect();
        let fresh = |issue: &Issue| {
            !reported
                .iter()
                .any(|path| issue.path == *path || issue.path.starts_with(&format!("{path}.")))
        };

        for issue in other.errors.into_iter().filter(|issue| fresh(issue)) {
            self.valid = false;
            self.errors.push(issue);
        }
        self.warnings.extend(other.warnings.into_iter().filter(|issue| fresh(issue)));
    }

    /// Errors of one kind.
    pub fn errors_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.errors.iter().filter(move |issue| issue.kind == kind)
    }

    /// Turn a failed result into [`SpecError::Rejected`].
    pub fn into_result(self) -> SpecResult<Self> {
        if self.valid {
            Ok(self)
        } else {
            Err(SpecError::Rejected(Box::new(self)))
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.errors {
            writeln!(f, "  - {issue}")?;
        }
        Ok(())
    }
}

/// Validator for loaded specifications.
pub struct SpecValidator;

impl SpecValidator {
    /// Run every cross-entity check.
    pub fn validate(spec: &LoadedSpec, config: &SpecConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.merge(Self::validate_doc_types(spec));
        result.merge(Self::validate_versions(spec));
        result.merge(Self::validate_formats(spec));
        result.merge(Self::validate_orders(spec));
        result.merge(Self::validate_exclusivity(spec));
        result.merge(Self::validate_references(spec, config));
        result.merge(Self::validate_linked_refs(spec, config));
        result.merge(Self::validate_cddl(spec, config));
        result.merge(Self::validate_clusters(spec));
        result.merge(Self::validate_links(spec));
        if config.validate_payload_examples {
            result.merge(Self::validate_payloads(&spec.docs));
        }

        result
    }

    /// Every document has a type, made of registered base types.
    pub fn validate_doc_types(spec: &LoadedSpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        for doc in spec.docs.iter() {
            let path = format!("docs.{}.type", doc.name());
            if doc.doc_type.ids().is_empty() {
                result.add_error(IssueKind::Structural, path, "document type cannot be empty");
                continue;
            }
            for id in doc.doc_type.ids() {
                if spec.base_types.name_for(id).is_none() {
                    result.add_warning(
                        IssueKind::Referential,
                        path.clone(),
                        format!("type id {id} is not a registered base type"),
                    );
                }
            }
        }

        result
    }

    /// Change logs cannot be empty.
    pub fn validate_versions(spec: &LoadedSpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        if spec.copyright.versions.is_empty() {
            result.add_error(IssueKind::Structural, "copyright.versions", "change log cannot be empty");
        }
        for doc in spec.docs.iter() {
            if doc.versions.is_empty() {
                result.add_error(
                    IssueKind::Structural,
                    format!("docs.{}.versions", doc.name()),
                    "change log cannot be empty",
                );
            }
        }

        result
    }

    /// Every header uses a format of its own registry.
    pub fn validate_formats(spec: &LoadedSpec) -> ValidationResult {
        let mut result = ValidationResult::new();
        let metadata_formats = &spec.metadata.formats;
        let header_formats = &spec.cose.header_formats;

        check_formats(&mut result, "metadata.headers", &spec.metadata.headers, metadata_formats);
        check_formats(&mut result, "cose.headers", &spec.cose.headers, header_formats);
        check_formats(
            &mut result,
            "cose.signature_headers",
            &spec.cose.signature_headers,
            header_formats,
        );
        for doc in spec.docs.iter() {
            let prefix = format!("docs.{}", doc.name());
            check_formats(&mut result, &format!("{prefix}.metadata"), &doc.metadata, metadata_formats);
            check_formats(&mut result, &format!("{prefix}.headers"), &doc.headers, header_formats);
        }

        result
    }

    /// Ordering lists should only name known fields.
    pub fn validate_orders(spec: &LoadedSpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        for name in &spec.metadata.order {
            if !spec.metadata.headers.contains(name) {
                result.add_warning(
                    IssueKind::Referential,
                    "metadata.order",
                    format!("`{name}` is not a metadata header"),
                );
            }
        }
        for name in &spec.cose.headers_order {
            if !spec.cose.headers.contains(name) {
                result.add_warning(
                    IssueKind::Referential,
                    "cose.headersOrder",
                    format!("`{name}` is not a COSE header"),
                );
            }
        }

        result
    }

    /// Exclusive groups name fields of the same scope and are symmetric.
    pub fn validate_exclusivity(spec: &LoadedSpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        check_exclusive(&mut result, "metadata.headers", &spec.metadata.headers);
        check_exclusive(&mut result, "cose.headers", &spec.cose.headers);
        check_exclusive(&mut result, "cose.signature_headers", &spec.cose.signature_headers);
        for doc in spec.docs.iter() {
            let prefix = format!("docs.{}", doc.name());
            check_exclusive(&mut result, &format!("{prefix}.metadata"), &doc.metadata);
            check_exclusive(&mut result, &format!("{prefix}.headers"), &doc.headers);
        }

        result
    }

    /// Every document reference targets an existing document.
    pub fn validate_references(spec: &LoadedSpec, config: &SpecConfig) -> ValidationResult {
        let mut result = ValidationResult::new();
        let reference_format = config.document_reference_format.as_str();

        check_targets(&mut result, "metadata.headers", &spec.metadata.headers, &spec.docs, reference_format);
        for doc in spec.docs.iter() {
            check_targets(
                &mut result,
                &format!("docs.{}.metadata", doc.name()),
                &doc.metadata,
                &spec.docs,
                reference_format,
            );
        }

        result
    }

    /// Linked references name reference fields of the same scope, and each
    /// referenced document defines the linking field.
    pub fn validate_linked_refs(spec: &LoadedSpec, config: &SpecConfig) -> ValidationResult {
        let mut result = ValidationResult::new();
        let reference_format = config.document_reference_format.as_str();

        for field in spec.metadata.headers.all() {
            for linked in &field.linked_refs {
                if !spec.metadata.headers.contains(linked) {
                    result.add_error(
                        IssueKind::Referential,
                        format!("metadata.headers.{}.linked_refs", field.name()),
                        format!("linked reference `{linked}` is not a metadata header"),
                    );
                }
            }
        }

        for doc in spec.docs.iter() {
            for field in doc.metadata.all() {
                if field.required.is_excluded() {
                    continue;
                }
                let path = format!("docs.{}.metadata.{}.linked_refs", doc.name(), field.name());

                for linked in &field.linked_refs {
                    let Some(reference) = doc.metadata.get(linked) else {
                        result.add_error(
                            IssueKind::Referential,
                            path.clone(),
                            format!("linked reference `{linked}` is not a metadata field of this document"),
                        );
                        continue;
                    };
                    if !reference.is_reference(reference_format) {
                        result.add_error(
                            IssueKind::Referential,
                            path.clone(),
                            format!("linked reference `{linked}` is not a document reference"),
                        );
                        continue;
                    }

                    for target in &reference.doc_types {
                        // Unknown targets are reported by the reference check.
                        let Some(target_doc) = spec.docs.get(target) else {
                            continue;
                        };
                        let defines_field = target_doc
                            .metadata
                            .get(field.name())
                            .is_some_and(|f| !f.required.is_excluded());
                        if !defines_field {
                            result.add_error(
                                IssueKind::Referential,
                                path.clone(),
                                format!(
                                    "document `{target}` referenced by `{linked}` does not define `{}`",
                                    field.name()
                                ),
                            );
                        }
                    }
                }
            }
        }

        result
    }

    /// Every CDDL dependency, and every format's CDDL type, resolves.
    pub fn validate_cddl(spec: &LoadedSpec, config: &SpecConfig) -> ValidationResult {
        let mut result = ValidationResult::new();
        let synthesized = config.synthesized_definitions();

        for (name, required) in spec.cddl.unresolved_requires(&synthesized) {
            result.add_error(
                IssueKind::Referential,
                format!("cddlDefinitions.{name}.requires"),
                format!("required definition `{required}` does not exist"),
            );
        }

        let known = |cddl: &str| spec.cddl.contains(cddl) || synthesized.contains(&cddl);
        for (section, formats) in [
            ("metadata.formats", &spec.metadata.formats),
            ("cose.headerFormats", &spec.cose.header_formats),
        ] {
            for (name, format) in formats {
                if !known(&format.cddl) {
                    result.add_error(
                        IssueKind::Referential,
                        format!("{section}.{name}.cddl"),
                        format!("CDDL definition `{}` does not exist", format.cddl),
                    );
                }
            }
        }

        result
    }

    /// Cluster members exist and no document is claimed twice.
    pub fn validate_clusters(spec: &LoadedSpec) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();

        for cluster in spec.clusters.iter() {
            let path = format!("docClusters.{}.docs", cluster.name());
            for member in &cluster.docs {
                if !spec.docs.contains(member) {
                    result.add_error(
                        IssueKind::Referential,
                        path.clone(),
                        format!("document `{member}` does not exist"),
                    );
                }
                if let Some(owner) = owners.insert(member, cluster.name()) {
                    if owner != cluster.name() {
                        result.add_error(
                            IssueKind::Invariant,
                            path.clone(),
                            format!("document `{member}` is already in cluster `{owner}`"),
                        );
                    }
                }
            }
        }

        result
    }

    /// Links are web URLs and aliases point at known links.
    pub fn validate_links(spec: &LoadedSpec) -> ValidationResult {
        let mut result = ValidationResult::new();

        match spec.links.malformed() {
            Ok(names) => {
                for name in names {
                    result.add_error(
                        IssueKind::Structural,
                        format!("documentationLinks.{name}"),
                        "link must be an absolute http(s) URL",
                    );
                }
            }
            Err(e) => result.add_error(
                IssueKind::Structural,
                "documentationLinks",
                format!("link URLs could not be checked: {e}"),
            ),
        }
        for (alias, target) in spec.links.dangling_aliases() {
            result.add_error(
                IssueKind::Referential,
                format!("linkAKA.{alias}"),
                format!("link `{target}` does not exist"),
            );
        }

        result
    }

    /// Payload examples match their inline schema.
    pub fn validate_payloads(docs: &Documents) -> ValidationResult {
        let mut result = ValidationResult::new();

        for doc in docs.iter() {
            let Some(payload) = &doc.payload else {
                continue;
            };
            let path = format!("docs.{}.payload.examples", doc.name());
            for message in payload.example_errors() {
                result.add_error(IssueKind::Structural, path.clone(), message);
            }
        }

        result
    }
}

fn check_formats<H: Header>(
    result: &mut ValidationResult,
    prefix: &str,
    headers: &OrderedFieldSet<H>,
    formats: &Formats,
) {
    for header in headers.all() {
        if !formats.contains_key(header.format()) {
            result.add_error(
                IssueKind::Referential,
                format!("{prefix}.{}.format", header.name()),
                format!("format `{}` does not exist", header.format()),
            );
        }
    }
}

fn check_exclusive<H: Header>(result: &mut ValidationResult, prefix: &str, headers: &OrderedFieldSet<H>) {
    for header in headers.all() {
        let path = format!("{prefix}.{}.exclusive", header.name());
        for member in header.exclusive() {
            if member == header.name() {
                result.add_error(IssueKind::Invariant, path.clone(), "a field cannot exclude itself");
                continue;
            }
            match headers.get(member) {
                None => result.add_error(
                    IssueKind::Referential,
                    path.clone(),
                    format!("exclusive field `{member}` is not defined in the same scope"),
                ),
                Some(other) if !other.exclusive().iter().any(|m| m == header.name()) => {
                    result.add_error(
                        IssueKind::Invariant,
                        path.clone(),
                        format!(
                            "`{}` excludes `{member}` but `{member}` does not exclude `{}`",
                            header.name(),
                            header.name()
                        ),
                    )
                }
                Some(_) => {}
            }
        }
    }
}

fn check_targets(
    result: &mut ValidationResult,
    prefix: &str,
    headers: &MetadataHeaders,
    docs: &Documents,
    reference_format: &str,
) {
    for header in headers.all() {
        let path = format!("{prefix}.{}.type", header.name());
        if !header.is_reference(reference_format) {
            if !header.doc_types.is_empty() {
                result.add_warning(
                    IssueKind::Structural,
                    path,
                    format!("`type` is ignored unless the format is `{reference_format}`"),
                );
            }
            continue;
        }
        for target in &header.doc_types {
            if !docs.contains(target) {
                result.add_error(
                    IssueKind::Referential,
                    path.clone(),
                    format!("referenced document `{target}` does not exist"),
                );
            }
        }
    }
}
