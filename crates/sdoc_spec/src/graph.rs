//! Document reference graph, derived once from the loaded documents.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::document::Documents;

/// Who references whom, in both directions.
///
/// Every document has an entry in both maps, possibly empty. The reverse map
/// is only ever filled from the forward one, so `b` is in `references(a)`
/// exactly when `a` is in `referenced_by(b)`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    references: IndexMap<String, BTreeSet<String>>,
    referenced_by: IndexMap<String, BTreeSet<String>>,
}

impl ReferenceGraph {
    /// Build the graph from every metadata field using `reference_format`.
    pub fn build(docs: &Documents, reference_format: &str) -> Self {
        let mut graph = Self::default();
        for name in docs.names() {
            graph.references.insert(name.to_string(), BTreeSet::new());
            graph.referenced_by.insert(name.to_string(), BTreeSet::new());
        }

        for doc in docs.iter() {
            let targets: BTreeSet<String> = doc
                .metadata
                .all()
                .filter(|field| field.is_reference(reference_format))
                .flat_map(|field| field.doc_types.iter().cloned())
                .collect();

            for target in &targets {
                graph
                    .referenced_by
                    .entry(target.clone())
                    .or_default()
                    .insert(doc.name().to_string());
            }
            graph.references.insert(doc.name().to_string(), targets);
        }

        debug!("Reference graph built with {} edges", graph.edge_count());
        graph
    }

    /// Documents that `doc` references.
    pub fn references(&self, doc: &str) -> Option<&BTreeSet<String>> {
        self.references.get(doc)
    }

    /// Documents that reference `doc`.
    pub fn referenced_by(&self, doc: &str) -> Option<&BTreeSet<String>> {
        self.referenced_by.get(doc)
    }

    /// Every `(from, to)` edge, grouped by source document.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.references
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from.as_str(), to.as_str())))
    }

    pub fn edge_count(&self) -> usize {
        self.references.values().map(BTreeSet::len).sum()
    }
}
