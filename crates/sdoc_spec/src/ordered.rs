//! Name-keyed field sets with a canonical presentation order.

use indexmap::IndexMap;

/// An entry whose name (and owning document, if any) is injected by the set
/// that holds it rather than read from its own record.
pub trait Named {
    /// Record the entry's name and, when scoped to one document, that document.
    fn stamp(&mut self, name: &str, doc_name: Option<&str>);
}

/// An insertion-ordered set of named fields plus their canonical order.
///
/// The canonical order is computed once, when the set is built: names listed
/// in the override order come first (names not present in the set are
/// dropped), followed by any unlisted names in insertion order.
#[derive(Debug, Clone)]
pub struct OrderedFieldSet<T> {
    fields: IndexMap<String, T>,
    order: Vec<String>,
}

impl<T: Named> OrderedFieldSet<T> {
    /// Build a set, stamping every field with its name and `doc_name`.
    pub fn new(mut fields: IndexMap<String, T>, order: &[String], doc_name: Option<&str>) -> Self {
        for (name, field) in fields.iter_mut() {
            field.stamp(name, doc_name);
        }
        let order = canonical_order(&fields, order);
        Self { fields, order }
    }
}

impl<T> OrderedFieldSet<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Fields in canonical order.
    pub fn all(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|name| self.fields.get(name))
    }

    /// `(name, field)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(|name| self.fields.get(name).map(|field| (name.as_str(), field)))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> Default for OrderedFieldSet<T> {
    fn default() -> Self {
        Self {
            fields: IndexMap::new(),
            order: Vec::new(),
        }
    }
}

fn canonical_order<T>(fields: &IndexMap<String, T>, preferred: &[String]) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(fields.len());
    for name in preferred {
        if fields.contains_key(name) && !order.contains(name) {
            order.push(name.clone());
        }
    }
    for name in fields.keys() {
        if !order.contains(name) {
            order.push(name.clone());
        }
    }
    order
}
