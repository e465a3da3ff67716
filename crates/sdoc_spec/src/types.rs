//! Primitive value types shared by every registry.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// A UUID identifying a base document type.
///
/// Renders either as the canonical hyphenated string or as the CBOR
/// diagnostic notation of a tag-37 UUID (`37(h'<hex>')`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocTypeId(Uuid);

impl DocTypeId {
    /// Parse a base type id, which must be a version 4 UUID.
    pub fn parse_v4(value: &str) -> Result<Self, String> {
        let id = Self::from_str(value)?;
        match id.0.get_version_num() {
            4 => Ok(id),
            other => Err(format!("`{value}` is a version {other} UUID, expected version 4")),
        }
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Canonical hyphenated string form.
    pub fn as_uuid_str(&self) -> String {
        self.0.hyphenated().to_string()
    }

    /// CBOR diagnostic notation form, e.g. `37(h'7808d2bad51140af84e8c0d1625fdfdc')`.
    pub fn as_cbor(&self) -> String {
        format!("37(h'{}')", self.0.simple())
    }
}

impl FromStr for DocTypeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("`{s}` is not a valid UUID: {e}"))
    }
}

impl fmt::Display for DocTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl Serialize for DocTypeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocTypeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The composite type of one document: an ordered list of base type ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocType(Vec<DocTypeId>);

impl DocType {
    pub fn new(ids: Vec<DocTypeId>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[DocTypeId] {
        &self.0
    }

    /// Slash-joined base type names, using `name_of` to resolve each id.
    pub fn formatted_names(&self, name_of: impl Fn(&DocTypeId) -> String) -> String {
        self.0.iter().map(name_of).collect::<Vec<_>>().join("/")
    }

    /// The type rendered as a CBOR array of tag-37 UUID literals.
    pub fn formatted_cbor(&self) -> String {
        let items: Vec<String> = self.0.iter().map(DocTypeId::as_cbor).collect();
        format!("[{}]", items.join(", "))
    }

    /// The type rendered as a list of canonical UUID strings.
    pub fn formatted_ids(&self) -> String {
        self.0
            .iter()
            .map(|id| format!("`{id}`"))
            .collect::<Vec<_>>()
            .join(",<br/>")
    }
}

/// Whether a header or metadata field must, may or must not be present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RequirementLevel {
    #[serde(alias = "yes")]
    Required,
    Optional,
    Excluded,
}

impl RequirementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementLevel::Required => "required",
            RequirementLevel::Optional => "optional",
            RequirementLevel::Excluded => "excluded",
        }
    }

    pub fn is_required(&self) -> bool {
        *self == RequirementLevel::Required
    }

    pub fn is_excluded(&self) -> bool {
        *self == RequirementLevel::Excluded
    }
}

impl fmt::Display for RequirementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a change log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChangeLogEntry {
    pub version: String,
    pub modified: NaiveDate,
    pub changes: String,
}

/// Authors, keyed by name, valued by contact address.
pub type Authors = IndexMap<String, String>;

/// A content or encoding type description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MediaType {
    pub description: String,
    #[serde(default)]
    pub coap_type: Option<u32>,
}

/// A header/metadata value format, mapping a format name onto a CDDL type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Format {
    pub cddl: String,
    pub description: String,
}

/// Accepts either a single string or a list of strings.
pub(crate) fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(one)) => vec![one],
        Some(OneOrMany::Many(many)) => many,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPOSAL: &str = "7808d2ba-d511-40af-84e8-c0d1625fdfdc";

    #[test]
    fn test_doc_type_id_renderings() {
        let id = DocTypeId::parse_v4(PROPOSAL).unwrap();
        assert_eq!(id.as_uuid_str(), PROPOSAL);
        assert_eq!(id.as_cbor(), "37(h'7808d2bad51140af84e8c0d1625fdfdc')");
        assert_eq!(id.to_string(), PROPOSAL);
    }

    #[test]
    fn test_doc_type_id_rejects_other_versions() {
        // version 7
        let err = DocTypeId::parse_v4("01948f6e-8b1a-7c3d-9e2f-0123456789ab").unwrap_err();
        assert!(err.contains("version 7"));
        assert!(DocTypeId::parse_v4("not-a-uuid").is_err());
    }

    #[test]
    fn test_doc_type_renderings() {
        let ids = vec![
            DocTypeId::parse_v4(PROPOSAL).unwrap(),
            DocTypeId::parse_v4("0ce8ab38-9258-4fbc-a62e-7faa6e58318f").unwrap(),
        ];
        let doc_type = DocType::new(ids);
        assert_eq!(
            doc_type.formatted_cbor(),
            "[37(h'7808d2bad51140af84e8c0d1625fdfdc'), 37(h'0ce8ab3892584fbca62e7faa6e58318f')]"
        );
        let names = doc_type.formatted_names(|id| {
            if id.as_uuid_str() == PROPOSAL {
                "Proposal".to_string()
            } else {
                "Template".to_string()
            }
        });
        assert_eq!(names, "Proposal/Template");
    }

    #[test]
    fn test_requirement_level_parsing() {
        let level: RequirementLevel = serde_json::from_str("\"yes\"").unwrap();
        assert_eq!(level, RequirementLevel::Required);
        let level: RequirementLevel = serde_json::from_str("\"excluded\"").unwrap();
        assert!(level.is_excluded());
        assert!(serde_json::from_str::<RequirementLevel>("\"maybe\"").is_err());
    }

    #[test]
    fn test_string_or_list() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "string_or_list")]
            items: Vec<String>,
        }

        let one: Holder = serde_json::from_str(r#"{"items": "a"}"#).unwrap();
        assert_eq!(one.items, vec!["a"]);
        let many: Holder = serde_json::from_str(r#"{"items": ["a", "b"]}"#).unwrap();
        assert_eq!(many.items, vec!["a", "b"]);
        let none: Holder = serde_json::from_str("{}").unwrap();
        assert!(none.items.is_empty());
    }
}
