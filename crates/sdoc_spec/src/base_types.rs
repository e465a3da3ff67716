//! Base document types: a bijective mapping between names and type ids.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::types::DocTypeId;
use crate::validator::{IssueKind, ValidationResult};

/// All base document types, in declaration order.
///
/// Every id is used by exactly one name. A mapping that reuses an id is
/// rejected while loading.
#[derive(Debug, Clone, Default)]
pub struct BaseTypes {
    by_name: IndexMap<String, DocTypeId>,
    by_id: HashMap<DocTypeId, String>,
}

impl BaseTypes {
    /// Build the registry from the raw `base_types` section, recording every
    /// malformed id and every reused id in `result`.
    pub fn from_raw(raw: IndexMap<String, String>, result: &mut ValidationResult) -> Self {
        let mut types = Self::default();

        for (name, value) in raw {
            let path = format!("base_types.{name}");
            let id = match DocTypeId::parse_v4(&value) {
                Ok(id) => id,
                Err(message) => {
                    result.add_error(IssueKind::Structural, path, message);
                    continue;
                }
            };

            if let Some(owner) = types.by_id.get(&id) {
                result.add_error(
                    IssueKind::Invariant,
                    path,
                    format!("type id {id} is already used by base type `{owner}`"),
                );
                continue;
            }

            types.by_id.insert(id, name.clone());
            types.by_name.insert(name, id);
        }

        types
    }

    /// Get the id of a named base type.
    pub fn uuid(&self, name: &str) -> Option<&DocTypeId> {
        self.by_name.get(name)
    }

    /// Get the name of a base type given its id.
    pub fn name_for(&self, id: &DocTypeId) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// All base type names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocTypeId)> {
        self.by_name.iter().map(|(name, id)| (name.as_str(), id))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
