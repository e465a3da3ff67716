//! Metadata rule evaluation: requirement level, reference targets and the
//! validation narrative of a metadata field.

use crate::header::{Header, MetadataHeader};
use crate::types::RequirementLevel;

/// Everything a consumer needs to describe one metadata field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataView<'a> {
    pub name: &'a str,
    pub doc_name: Option<&'a str>,
    pub required: RequirementLevel,
    /// Absent for excluded fields, which must never look defined.
    pub detail: Option<MetadataDetail<'a>>,
}

/// Format and validation detail of a field that may be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDetail<'a> {
    pub format: &'a str,
    pub description: &'a str,
    pub multiple: bool,
    /// Documents the field may reference; empty unless it is a reference.
    pub references: Vec<&'a str>,
    pub linked_refs: &'a [String],
    pub exclusive: &'a [String],
    /// The declared validation text followed by the generated clauses.
    pub validation: String,
}

impl<'a> MetadataView<'a> {
    /// Evaluate a field. `reference_format` marks document reference fields.
    pub fn new(field: &'a MetadataHeader, reference_format: &str) -> Self {
        let detail = (!field.required.is_excluded()).then(|| MetadataDetail {
            format: &field.format,
            description: &field.description,
            multiple: field.multiple(),
            references: if field.is_reference(reference_format) {
                field.doc_types.iter().map(String::as_str).collect()
            } else {
                Vec::new()
            },
            linked_refs: &field.linked_refs,
            exclusive: &field.exclusive,
            validation: validation_narrative(field),
        });

        Self {
            name: field.name(),
            doc_name: field.doc_name(),
            required: field.required,
            detail,
        }
    }

    /// Render the field as a Markdown parameter table and validation section.
    ///
    /// `doc_type_ids` is shown against the `type` field when documenting one
    /// document.
    pub fn to_markdown(&self, doc_type_ids: Option<&str>) -> String {
        let mut out = format!(
            "### `{}`\n\n<!-- markdownlint-disable MD033 -->\n| Parameter | Value |\n| --- | --- |\n| Required | {} |\n",
            self.name, self.required
        );

        let Some(detail) = &self.detail else {
            out.push_str("<!-- markdownlint-enable MD033 -->\n");
            return out;
        };

        out.push_str(&format!("| Format | `{}` |\n", detail.format));
        if let (Some(ids), "type") = (doc_type_ids, self.name) {
            out.push_str(&format!("| Type | {ids} |\n"));
        }
        if detail.multiple {
            out.push_str("| Multiple References | true |\n");
        }
        table_rows(&mut out, "Valid References", detail.references.iter().map(|r| format!("`{r}`")));
        table_rows(
            &mut out,
            "Linked Reference Metadata",
            detail.linked_refs.iter().map(|r| format!("[`{r}`](#{r})")),
        );
        table_rows(&mut out, "Exclusive", detail.exclusive.iter().map(|r| format!("`{r}`")));

        out.push_str(&format!(
            "<!-- markdownlint-enable MD033 -->\n{}\n\n#### `{}` Validation\n\n{}\n",
            detail.description.trim(),
            self.name,
            detail.validation
        ));
        out
    }
}

/// One row per value, with the heading only on the first.
fn table_rows(out: &mut String, heading: &str, values: impl Iterator<Item = String>) {
    for (i, value) in values.enumerate() {
        let heading = if i == 0 { heading } else { "" };
        out.push_str(&format!("| {heading} | {value} |\n"));
    }
}

/// The field's own validation text plus one clause for its exclusive group
/// and one per linked reference.
pub fn validation_narrative(field: &MetadataHeader) -> String {
    let mut validation = field.validation.clone().unwrap_or_default();

    if let Some(clause) = exclusive_clause(&field.exclusive) {
        validation.push('\n');
        validation.push_str(&clause);
    }
    for linked in &field.linked_refs {
        validation.push('\n');
        validation.push_str(&linked_ref_clause(field.name(), linked));
    }

    validation.trim().to_string()
}

/// The clause forbidding co-occurrence with the exclusive group members.
pub fn exclusive_clause(members: &[String]) -> Option<String> {
    if members.is_empty() {
        return None;
    }
    Some(format!(
        "* MUST NOT be present in any document that also contains metadata {}.",
        oxford_join(members)
    ))
}

/// The clause tying `field` to the document referenced by `linked`.
pub fn linked_ref_clause(field: &str, linked: &str) -> String {
    format!(
        "* The Document referenced by `{linked}`\n  * MUST contain `{field}` metadata; AND\n  * MUST match the referencing documents `{field}` value."
    )
}

/// Backtick-quote each item and join with commas and a final "and".
pub fn oxford_join<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("`{}`", i.as_ref())).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MetadataHeaders;
    use indexmap::IndexMap;

    fn headers(raw: &str) -> MetadataHeaders {
        let raw: IndexMap<String, MetadataHeader> = serde_json::from_str(raw).unwrap();
        MetadataHeaders::new(raw, &[], Some("Proposal"))
    }

    #[test]
    fn test_oxford_join() {
        assert_eq!(oxford_join(&["a"]), "`a`");
        assert_eq!(oxford_join(&["a", "b"]), "`a` and `b`");
        assert_eq!(oxford_join(&["a", "b", "c"]), "`a`, `b`, and `c`");
        assert_eq!(oxford_join::<&str>(&[]), "");
    }

    #[test]
    fn test_single_exclusive_partner_has_no_and() {
        let clause = exclusive_clause(&["chain".to_string()]).unwrap();
        assert_eq!(
            clause,
            "* MUST NOT be present in any document that also contains metadata `chain`."
        );
        assert!(exclusive_clause(&[]).is_none());
    }

    #[test]
    fn test_narrative_appends_clauses() {
        let set = headers(
            r#"{
                "template": {"description": "", "required": "required", "format": "Document Reference", "type": "Proposal Form Template"},
                "category_id": {
                    "description": "Category",
                    "required": "optional",
                    "format": "Document Reference",
                    "type": "Category Parameters",
                    "validation": "Must be a valid category.",
                    "linked_refs": ["campaign_id"],
                    "exclusive": ["brand_id", "campaign_id"]
                }
            }"#,
        );
        let field = set.get("category_id").unwrap();

        assert_eq!(
            validation_narrative(field),
            "Must be a valid category.\n\
             * MUST NOT be present in any document that also contains metadata `brand_id` and `campaign_id`.\n\
             * The Document referenced by `campaign_id`\n  \
             * MUST contain `category_id` metadata; AND\n  \
             * MUST match the referencing documents `category_id` value."
        );

        let view = MetadataView::new(field, "Document Reference");
        assert_eq!(view.doc_name, Some("Proposal"));
        let detail = view.detail.unwrap();
        assert_eq!(detail.references, vec!["Category Parameters"]);
    }

    #[test]
    fn test_excluded_field_has_no_detail() {
        let set = headers(
            r#"{"reply": {"description": "A reply", "required": "excluded", "format": "Document Reference", "type": "Comment", "validation": "Never shown"}}"#,
        );
        let view = MetadataView::new(set.get("reply").unwrap(), "Document Reference");
        assert!(view.detail.is_none());

        let markdown = view.to_markdown(None);
        assert!(markdown.contains("| Required | excluded |"));
        assert!(!markdown.contains("Format"));
        assert!(!markdown.contains("Never shown"));
        assert!(!markdown.contains("Validation"));
    }

    #[test]
    fn test_markdown_rows() {
        let set = headers(
            r#"{"ref": {"description": "Reference", "required": "optional", "format": "Document Reference", "type": ["Proposal", "Comment"], "multiple": true}}"#,
        );
        let markdown = MetadataView::new(set.get("ref").unwrap(), "Document Reference").to_markdown(None);

        assert!(markdown.starts_with("### `ref`\n"));
        assert!(markdown.contains("| Format | `Document Reference` |\n"));
        assert!(markdown.contains("| Multiple References | true |\n"));
        assert!(markdown.contains("| Valid References | `Proposal` |\n|  | `Comment` |\n"));
        assert!(markdown.contains("#### `ref` Validation"));
    }
}
