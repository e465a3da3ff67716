//! # sdoc_spec
//!
//! Loading, validation and querying of signed document specifications.
//!
//! A specification is one JSON document declaring base document types,
//! COSE headers, metadata fields, CDDL fragments and the documents built
//! from them. This crate turns it into an immutable, cross-referenced model.
//!
//! ## Loading
//!
//! Loading runs in fixed phases and either produces a complete model or
//! fails with every problem found:
//!
//! 1. **Read**: each section, document and header is deserialized and
//!    stamped with its name ([`SpecReader`]).
//! 2. **Validate**: references, exclusive groups, linked references,
//!    clusters, CDDL dependencies and payload examples are cross-checked
//!    ([`SpecValidator`]).
//! 3. **Derive**: the [`ReferenceGraph`] is built and the document, signature
//!    and metadata header groups are synthesized as CDDL.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sdoc_spec::SignedDocSpec;
//!
//! let spec = SignedDocSpec::from_path("signed_doc.json").unwrap();
//!
//! for name in spec.document_names() {
//!     let refs = spec.all_references_of(name).unwrap();
//!     println!("{name} references {} document type(s)", refs.len());
//! }
//!
//! let view = spec.metadata_view("ref", None).unwrap();
//! println!("{}", view.to_markdown(None));
//!
//! let cddl = spec.cddl_file("signed_document").unwrap();
//! println!("{cddl}");
//! ```

pub mod base_types;
pub mod cddl;
pub mod cluster;
pub mod config;
pub mod copyright;
pub mod document;
pub mod error;
pub mod graph;
pub mod header;
pub mod links;
pub mod ordered;
pub mod reader;
pub mod rules;
pub mod spec;
pub mod types;
pub mod validator;

pub use base_types::BaseTypes;
pub use cddl::{CddlDefinition, CddlDefinitions};
pub use cluster::{DocCluster, DocClusters};
pub use config::SpecConfig;
pub use copyright::{Copyright, CopyrightInfo};
pub use document::{Document, Documents, Payload, Signers};
pub use error::{SpecError, SpecResult, SynthesisError};
pub use graph::ReferenceGraph;
pub use header::{CoseHeader, CoseLabel, Header, HeaderKind, MetadataHeader};
pub use links::DocumentationLinks;
pub use ordered::OrderedFieldSet;
pub use reader::{LoadedSpec, SpecReader};
pub use rules::{MetadataDetail, MetadataView};
pub use spec::SignedDocSpec;
pub use types::{DocType, DocTypeId, RequirementLevel};
pub use validator::{Issue, IssueKind, SpecValidator, ValidationResult};
