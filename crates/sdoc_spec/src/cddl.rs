//! CDDL definitions, header group synthesis and CDDL file assembly.
//!
//! Declared definitions come straight from the `cddlDefinitions` section.
//! Three more are synthesized from the header sets after loading (document
//! headers, signature headers and metadata headers). A synthesized definition
//! shadows a declared one of the same name, whose description and comment it
//! keeps.
//!
//! Synthesis failures are stored against the definition name and surface only
//! when that definition is requested.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SpecError, SpecResult, SynthesisError};
use crate::header::{Formats, Header};

/// A named CDDL fragment and the definitions it depends on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CddlDefinition {
    #[serde(rename = "def")]
    pub definition: String,
    pub requires: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,

    #[serde(skip)]
    name: String,
}

impl CddlDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

/// All CDDL definitions of a specification.
#[derive(Debug, Clone, Default)]
pub struct CddlDefinitions {
    declared: IndexMap<String, CddlDefinition>,
    synthesized: IndexMap<String, Result<CddlDefinition, SynthesisError>>,
}

impl CddlDefinitions {
    /// Build the registry from the raw section, stamping each definition's name.
    pub fn new(raw: IndexMap<String, CddlDefinition>) -> Self {
        let declared = raw
            .into_iter()
            .map(|(name, def)| {
                let def = def.named(&name);
                (name, def)
            })
            .collect();
        Self {
            declared,
            synthesized: IndexMap::new(),
        }
    }

    /// Store the outcome of synthesizing `name`.
    pub fn add_synthesized(&mut self, name: &str, outcome: Result<CddlDefinition, SynthesisError>) {
        match &outcome {
            Ok(def) => debug!("Synthesized CDDL definition {} ({} requires)", name, def.requires.len()),
            Err(e) => debug!("CDDL definition {} could not be synthesized: {}", name, e),
        }
        self.synthesized.insert(name.to_string(), outcome);
    }

    /// The declared definition of this name, ignoring synthesis.
    pub fn declared(&self, name: &str) -> Option<&CddlDefinition> {
        self.declared.get(name)
    }

    /// Get a definition by name.
    ///
    /// A definition whose synthesis failed returns that failure.
    pub fn get(&self, name: &str) -> SpecResult<&CddlDefinition> {
        if let Some(outcome) = self.synthesized.get(name) {
            return outcome.as_ref().map_err(|e| SpecError::Synthesis(e.clone()));
        }
        self.declared
            .get(name)
            .ok_or_else(|| SpecError::DefinitionNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.synthesized.contains_key(name) || self.declared.contains_key(name)
    }

    /// All definition names: declared ones in declaration order, then any
    /// synthesized name that was not declared.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.declared.keys().map(String::as_str).collect();
        for name in self.synthesized.keys() {
            if !self.declared.contains_key(name) {
                names.push(name);
            }
        }
        names
    }

    /// Every `(definition, required name)` pair among the declared definitions
    /// whose required name is neither declared nor in `extra_known`.
    pub fn unresolved_requires<'a>(&'a self, extra_known: &[&str]) -> Vec<(&'a str, &'a str)> {
        let mut missing = Vec::new();
        for (name, def) in &self.declared {
            for required in &def.requires {
                if !self.declared.contains_key(required) && !extra_known.contains(&required.as_str()) {
                    missing.push((name.as_str(), required.as_str()));
                }
            }
        }
        missing
    }

    /// The definitions needed to fully describe `root`, each exactly once.
    ///
    /// The root comes first; every definition is followed by the ones it
    /// requires (depth first, in `requires` order) that have not already been
    /// visited. Cycles terminate because a definition is marked visited before
    /// its requirements are walked.
    pub fn resolution_order(&self, root: &str) -> SpecResult<Vec<&CddlDefinition>> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.visit(root, &mut visited, &mut order)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        visited: &mut HashSet<&'a str>,
        order: &mut Vec<&'a CddlDefinition>,
    ) -> SpecResult<()> {
        let def = self.get(name)?;
        visited.insert(def.name());
        order.push(def);

        for required in &def.requires {
            if !visited.contains(required.as_str()) {
                self.visit(required, visited, order)?;
            }
        }
        Ok(())
    }

    /// Assemble a complete CDDL file for the definition named `root`, with
    /// every dependency inlined once.
    pub fn cddl_file(&self, root: &str) -> SpecResult<String> {
        let order = self.resolution_order(root)?;

        let description = order
            .first()
            .and_then(|def| def.description.as_deref())
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(root);

        let blocks: Vec<String> = order.iter().map(|def| render_definition(def)).collect();

        Ok(format!(
            "{}\n\n\n{}\n",
            cddl_comment(description),
            blocks.join("\n\n")
        ))
    }
}

/// Prefix every line of `text` with a CDDL comment marker.
fn cddl_comment(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| format!("; {line}").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one `name = definition` rule, with its comment above it.
fn render_definition(def: &CddlDefinition) -> String {
    let body = def.definition.trim();
    match def.comment.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(comment) => format!("{}\n{} = {body}", cddl_comment(comment), def.name()),
        None => format!("{} = {body}", def.name()),
    }
}

/// Build a CDDL group describing every header of a set.
///
/// Headers without an exclusive group become one entry each, optional unless
/// required. Each distinct exclusive group becomes one optional alternation
/// placed after them, its members in header-set order. `requires` lists every
/// distinct CDDL type used, in first-use order.
///
/// Excluded headers are left out, including from the alternations of their
/// exclusive partners. A header whose partners are all excluded keeps a plain
/// entry of its own. `base` supplies the description and comment of the
/// result.
pub fn synthesize<'h, H, I>(
    name: &str,
    base: Option<&CddlDefinition>,
    headers: I,
    formats: &Formats,
) -> Result<CddlDefinition, SynthesisError>
where
    H: Header + 'h,
    I: IntoIterator<Item = &'h H>,
{
    let declared: Vec<&H> = headers.into_iter().collect();
    let headers: Vec<&H> = declared
        .iter()
        .copied()
        .filter(|h| !h.required().is_excluded())
        .collect();
    let mut requires: Vec<String> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<&H>> = Vec::new();

    for header in &headers {
        if let Some(member) = header
            .exclusive()
            .iter()
            .find(|member| !declared.iter().any(|h| h.name() == member.as_str()))
        {
            return Err(SynthesisError::UnknownExclusive {
                header: header.name().to_string(),
                member: member.clone(),
            });
        }

        let group: Vec<&H> = headers
            .iter()
            .filter(|h| h.name() == header.name() || header.exclusive().iter().any(|m| m == h.name()))
            .copied()
            .collect();
        if group.len() == 1 {
            let cddl = cddl_type(*header, formats)?;
            let optional = if header.required().is_required() { "" } else { "?" };
            lines.push(format!("{optional}{} => {cddl}", header.label()));
            push_unique(&mut requires, cddl);
            continue;
        }
        let is_new = !groups.iter().any(|existing| {
            existing.len() == group.len()
                && existing.iter().zip(&group).all(|(a, b)| a.name() == b.name())
        });
        if is_new {
            groups.push(group);
        }
    }

    for group in groups {
        let mut entries = Vec::with_capacity(group.len());
        for header in group {
            let cddl = cddl_type(header, formats)?;
            entries.push(format!("{} => {cddl}", header.label()));
            push_unique(&mut requires, cddl);
        }
        lines.push(format!("? (\n  {}\n)", entries.join(" //\n  ")));
    }

    let body = lines
        .join("\n")
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(CddlDefinition {
        definition: format!("(\n{body}\n)"),
        requires,
        description: base.and_then(|b| b.description.clone()),
        comment: base.and_then(|b| b.comment.clone()),
        name: name.to_string(),
    })
}

fn cddl_type<H: Header + ?Sized>(header: &H, formats: &Formats) -> Result<String, SynthesisError> {
    formats
        .get(header.format())
        .map(|format| format.cddl.clone())
        .ok_or_else(|| SynthesisError::UnknownFormat {
            header: header.name().to_string(),
            format: header.format().to_string(),
        })
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{MetadataHeader, MetadataHeaders};
    use crate::types::Format;

    fn def(body: &str, requires: &[&str]) -> CddlDefinition {
        CddlDefinition {
            definition: body.to_string(),
            requires: requires.iter().map(|r| r.to_string()).collect(),
            description: None,
            comment: None,
            name: String::new(),
        }
    }

    fn registry(defs: Vec<(&str, CddlDefinition)>) -> CddlDefinitions {
        CddlDefinitions::new(defs.into_iter().map(|(n, d)| (n.to_string(), d)).collect())
    }

    fn formats() -> Formats {
        let mut formats = Formats::new();
        for (name, cddl) in [("UUIDv7", "uuid_v7"), ("Document Reference", "document_ref"), ("Text", "tstr_def")] {
            formats.insert(
                name.to_string(),
                Format {
                    cddl: cddl.to_string(),
                    description: String::new(),
                },
            );
        }
        formats
    }

    fn headers(json: &str) -> MetadataHeaders {
        let raw: IndexMap<String, MetadataHeader> = serde_json::from_str(json).unwrap();
        MetadataHeaders::new(raw, &[], None)
    }

    #[test]
    fn test_resolution_visits_each_definition_once() {
        // diamond: root -> a, b; a -> shared; b -> shared
        let defs = registry(vec![
            ("root", def("[a, b]", &["a", "b"])),
            ("a", def("shared", &["shared"])),
            ("b", def("shared", &["shared"])),
            ("shared", def("tstr", &[])),
        ]);
        let order: Vec<&str> = defs
            .resolution_order("root")
            .unwrap()
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(order, vec!["root", "a", "shared", "b"]);
    }

    #[test]
    fn test_resolution_terminates_on_cycles() {
        let defs = registry(vec![
            ("tree", def("[* node]", &["node"])),
            ("node", def("tree / leaf", &["tree", "leaf"])),
            ("leaf", def("uint", &["leaf"])),
        ]);
        let order: Vec<&str> = defs
            .resolution_order("tree")
            .unwrap()
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(order, vec!["tree", "node", "leaf"]);
    }

    #[test]
    fn test_missing_requirement_is_reported() {
        let defs = registry(vec![("root", def("missing", &["missing"]))]);
        assert!(matches!(
            defs.cddl_file("root"),
            Err(SpecError::DefinitionNotFound(name)) if name == "missing"
        ));
        assert_eq!(defs.unresolved_requires(&[]), vec![("root", "missing")]);
        assert!(defs.unresolved_requires(&["missing"]).is_empty());
    }

    #[test]
    fn test_cddl_file_layout() {
        let mut root = def("{ 1 => id }", &["id"]);
        root.description = Some("Root document".to_string());
        let mut id = def("uuid", &[]);
        id.comment = Some("A UUID".to_string());
        let mut entry = def("(\n  a: id\n)", &[]);
        entry.comment = Some("first line\nsecond line".to_string());
        let mut with_entry = root.clone();
        with_entry.requires.push("entry".to_string());

        let defs = registry(vec![("root", with_entry), ("id", id), ("entry", entry)]);
        let file = defs.cddl_file("root").unwrap();

        assert_eq!(
            file,
            "; Root document\n\n\n\
             root = { 1 => id }\n\n\
             ; A UUID\nid = uuid\n\n\
             ; first line\n; second line\nentry = (\n  a: id\n)\n"
        );
    }

    #[test]
    fn test_single_line_comment_sits_above_its_rule() {
        let mut id = def("uuid", &[]);
        id.comment = Some("A UUID".to_string());
        let defs = registry(vec![("root", def("id", &["id"])), ("id", id)]);
        let file = defs.cddl_file("root").unwrap();

        assert!(file.contains("; A UUID\nid = uuid"));
        assert!(!file.contains("uuid ;"));
    }

    #[test]
    fn test_cddl_file_defaults_description_to_root_name() {
        let defs = registry(vec![("root", def("uint", &[]))]);
        assert_eq!(defs.cddl_file("root").unwrap(), "; root\n\n\nroot = uint\n");
    }

    #[test]
    fn test_synthesize_plain_headers() {
        let set = headers(
            r#"{
                "id": {"description": "", "required": "required", "format": "UUIDv7"},
                "ref": {"description": "", "required": "optional", "format": "Document Reference"},
                "ver": {"description": "", "required": "required", "format": "UUIDv7"}
            }"#,
        );
        let def = synthesize("Headers", None, set.all(), &formats()).unwrap();
        assert_eq!(
            def.definition,
            "(\n  \"id\" => uuid_v7\n  ?\"ref\" => document_ref\n  \"ver\" => uuid_v7\n)"
        );
        assert_eq!(def.requires, vec!["uuid_v7", "document_ref"]);
        assert_eq!(def.name(), "Headers");
    }

    #[test]
    fn test_synthesize_exclusive_pair_as_single_alternation() {
        let set = headers(
            r#"{
                "id": {"description": "", "required": "required", "format": "UUIDv7"},
                "A": {"description": "", "required": "required", "format": "Text", "exclusive": ["B"]},
                "B": {"description": "", "required": "optional", "format": "Document Reference", "exclusive": ["A"]}
            }"#,
        );
        let def = synthesize("Headers", None, set.all(), &formats()).unwrap();
        assert_eq!(
            def.definition,
            "(\n  \"id\" => uuid_v7\n  ? (\n    \"A\" => tstr_def //\n    \"B\" => document_ref\n  )\n)"
        );
        assert_eq!(def.definition.matches("? (").count(), 1);
        assert_eq!(def.requires, vec!["uuid_v7", "tstr_def", "document_ref"]);
    }

    #[test]
    fn test_synthesize_drops_excluded_exclusive_partner() {
        let set = headers(
            r#"{
                "A": {"description": "", "required": "optional", "format": "Text", "exclusive": ["B"]},
                "B": {"description": "", "required": "excluded", "format": "UUIDv7", "exclusive": ["A"]}
            }"#,
        );
        let def = synthesize("H", None, set.all(), &formats()).unwrap();
        assert_eq!(def.definition, "(\n  ?\"A\" => tstr_def\n)");
        assert_eq!(def.requires, vec!["tstr_def"]);

        let set = headers(r#"{"A": {"description": "", "required": "optional", "format": "Text", "exclusive": ["Z"]}}"#);
        let err = synthesize("H", None, set.all(), &formats()).unwrap_err();
        assert!(matches!(err, SynthesisError::UnknownExclusive { .. }));
    }

    #[test]
    fn test_synthesize_keeps_required_when_partners_are_excluded() {
        let set = headers(
            r#"{
                "A": {"description": "", "required": "required", "format": "Text", "exclusive": ["B"]},
                "B": {"description": "", "required": "excluded", "format": "UUIDv7", "exclusive": ["A"]},
                "C": {"description": "", "required": "optional", "format": "UUIDv7"}
            }"#,
        );
        let def = synthesize("H", None, set.all(), &formats()).unwrap();
        assert_eq!(def.definition, "(\n  \"A\" => tstr_def\n  ?\"C\" => uuid_v7\n)");
        assert!(!def.definition.contains("? ("));
        assert_eq!(def.requires, vec!["tstr_def", "uuid_v7"]);
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let set = headers(
            r#"{
                "c": {"description": "", "required": "optional", "format": "Text", "exclusive": ["a", "b"]},
                "a": {"description": "", "required": "optional", "format": "Text", "exclusive": ["b", "c"]},
                "b": {"description": "", "required": "optional", "format": "UUIDv7", "exclusive": ["c", "a"]}
            }"#,
        );
        let first = synthesize("H", None, set.all(), &formats()).unwrap();
        let second = synthesize("H", None, set.all(), &formats()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.definition.matches("? (").count(), 1);
    }

    #[test]
    fn test_synthesize_unknown_format() {
        let set = headers(r#"{"x": {"description": "", "required": "optional", "format": "Nope"}}"#);
        let err = synthesize("H", None, set.all(), &formats()).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::UnknownFormat {
                header: "x".to_string(),
                format: "Nope".to_string()
            }
        );
    }

    #[test]
    fn test_failed_synthesis_only_affects_its_definition() {
        let mut defs = registry(vec![("plain", def("uint", &[]))]);
        defs.add_synthesized(
            "Broken",
            Err(SynthesisError::UnknownFormat {
                header: "x".to_string(),
                format: "Nope".to_string(),
            }),
        );
        assert!(matches!(defs.get("Broken"), Err(SpecError::Synthesis(_))));
        assert!(defs.cddl_file("plain").is_ok());
        assert_eq!(defs.names(), vec!["plain", "Broken"]);
    }
}
