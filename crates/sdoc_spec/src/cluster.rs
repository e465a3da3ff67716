//! Document clusters: named groups of documents drawn as one node.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named, unordered set of document names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocCluster {
    pub docs: Vec<String>,

    #[serde(skip)]
    name: String,
}

impl DocCluster {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Is this document a member of the cluster.
    pub fn contains(&self, doc_name: &str) -> bool {
        self.docs.iter().any(|d| d == doc_name)
    }

    /// Do these names, taken as a set, equal the cluster's members exactly.
    pub fn is_cluster<S: AsRef<str>>(&self, names: &[S]) -> bool {
        let members: BTreeSet<&str> = self.docs.iter().map(String::as_str).collect();
        let names: BTreeSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        members == names
    }

    /// Diagram-friendly identifier, e.g. `cluster_system_parameters`.
    pub fn label(&self) -> String {
        format!(
            "cluster_{}",
            self.name.to_lowercase().replace([' ', '-'], "_")
        )
    }
}

/// All clusters of a specification.
///
/// A document belongs to at most one cluster. That is checked when the
/// specification is loaded and assumed by the lookups here.
#[derive(Debug, Clone, Default)]
pub struct DocClusters {
    clusters: IndexMap<String, DocCluster>,
}

impl DocClusters {
    pub fn new(raw: IndexMap<String, DocCluster>) -> Self {
        let clusters = raw
            .into_iter()
            .map(|(name, mut cluster)| {
                cluster.name = name.clone();
                (name, cluster)
            })
            .collect();
        Self { clusters }
    }

    /// The cluster a document belongs to, if any.
    pub fn cluster_of(&self, doc_name: &str) -> Option<&DocCluster> {
        self.clusters.values().find(|c| c.contains(doc_name))
    }

    /// The cluster whose members are exactly `names`, if any.
    ///
    /// A reference whose target list matches a whole cluster can be drawn as
    /// a single edge to that cluster. Partial matches never qualify.
    pub fn cluster_for_reference_target_set<S: AsRef<str>>(&self, names: &[S]) -> Option<&DocCluster> {
        self.clusters.values().find(|c| c.is_cluster(names))
    }

    pub fn get(&self, name: &str) -> Option<&DocCluster> {
        self.clusters.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocCluster> {
        self.clusters.values()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters() -> DocClusters {
        let raw: IndexMap<String, DocCluster> = serde_json::from_str(
            r#"{
                "System Parameters": {"docs": ["Brand Parameters", "Campaign Parameters", "Category Parameters"]},
                "Replies": {"docs": ["Comment"]}
            }"#,
        )
        .unwrap();
        DocClusters::new(raw)
    }

    #[test]
    fn test_cluster_of() {
        let clusters = clusters();
        let cluster = clusters.cluster_of("Campaign Parameters").unwrap();
        assert_eq!(cluster.name(), "System Parameters");
        assert_eq!(cluster.label(), "cluster_system_parameters");
        assert!(clusters.cluster_of("Proposal").is_none());
    }

    #[test]
    fn test_exact_set_match() {
        let clusters = clusters();
        let all = ["Category Parameters", "Brand Parameters", "Campaign Parameters"];
        assert_eq!(
            clusters.cluster_for_reference_target_set(&all).map(DocCluster::name),
            Some("System Parameters")
        );

        let partial = ["Brand Parameters", "Campaign Parameters"];
        assert!(clusters.cluster_for_reference_target_set(&partial).is_none());

        let superset = ["Brand Parameters", "Campaign Parameters", "Category Parameters", "Proposal"];
        assert!(clusters.cluster_for_reference_target_set(&superset).is_none());
    }
}
