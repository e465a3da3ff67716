//! Documentation links and their aliases.

use indexmap::IndexMap;
use regex::Regex;

const URL_PATTERN: &str = r"^https?://[^\s/$.?#][^\s]*$";

/// Named external links plus alternative names for some of them.
#[derive(Debug, Clone, Default)]
pub struct DocumentationLinks {
    links: IndexMap<String, String>,
    aka: IndexMap<String, String>,
}

impl DocumentationLinks {
    pub fn new(links: IndexMap<String, String>, aka: IndexMap<String, String>) -> Self {
        Self { links, aka }
    }

    /// The URL of a link, by name.
    pub fn link(&self, name: &str) -> Option<&str> {
        self.links.get(name).map(String::as_str)
    }

    /// The link name an alias stands for.
    pub fn aka(&self, alias: &str) -> Option<&str> {
        self.aka.get(alias).map(String::as_str)
    }

    /// The URL behind a link name or an alias.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.link(name).or_else(|| self.aka(name).and_then(|target| self.link(target)))
    }

    /// Every link name and alias, longest first.
    ///
    /// Ties keep declaration order, links before aliases. Replacing names in
    /// this order never lets a short name match inside a longer one.
    pub fn link_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .links
            .keys()
            .chain(self.aka.keys())
            .map(String::as_str)
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()));
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aka.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Names of links whose URL is not an absolute `http`/`https` URL.
    pub fn malformed(&self) -> Result<Vec<&str>, regex::Error> {
        self.not_matching(URL_PATTERN)
    }

    /// Names of links whose URL does not match `pattern`.
    pub fn not_matching(&self, pattern: &str) -> Result<Vec<&str>, regex::Error> {
        let url_re = Regex::new(pattern)?;
        Ok(self
            .links
            .iter()
            .filter(|(_, url)| !url_re.is_match(url))
            .map(|(name, _)| name.as_str())
            .collect())
    }

    /// `(alias, target)` pairs whose target is not a known link.
    pub fn dangling_aliases(&self) -> Vec<(&str, &str)> {
        self.aka
            .iter()
            .filter(|(_, target)| !self.links.contains_key(target.as_str()))
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
            .collect()
    }
}
