//! Copyright notice and change-log summaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Authors, ChangeLogEntry};

/// The specification-wide copyright record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Copyright {
    pub publisher: String,
    pub copyright: String,
    pub license: String,
    pub created: NaiveDate,
    pub versions: Vec<ChangeLogEntry>,
}

/// Copyright details for the whole specification or for one document.
#[derive(Debug, Clone)]
pub struct CopyrightInfo<'a> {
    /// Document authors first, then the specification authors. A name listed
    /// in both keeps the specification's address.
    pub authors: Authors,
    pub copyright: &'a Copyright,
    /// The document's change log, or the specification's.
    pub versions: &'a [ChangeLogEntry],
    /// Latest modification across the specification and the document.
    pub last_modified: Option<NaiveDate>,
}

impl<'a> CopyrightInfo<'a> {
    pub(crate) fn new(
        global_authors: &Authors,
        copyright: &'a Copyright,
        doc: Option<(&Authors, &'a [ChangeLogEntry])>,
    ) -> Self {
        let mut authors = Authors::new();
        let mut versions: &'a [ChangeLogEntry] = &copyright.versions;
        let mut last_modified = latest(&copyright.versions);

        if let Some((doc_authors, doc_versions)) = doc {
            authors.extend(doc_authors.iter().map(|(k, v)| (k.clone(), v.clone())));
            versions = doc_versions;
            last_modified = last_modified.max(latest(doc_versions));
        }
        authors.extend(global_authors.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            authors,
            copyright,
            versions,
            last_modified,
        }
    }
}

fn latest(versions: &[ChangeLogEntry]) -> Option<NaiveDate> {
    versions.iter().map(|v| v.modified).max()
}
