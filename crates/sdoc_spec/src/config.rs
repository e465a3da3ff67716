//! Loader configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SpecError, SpecResult};

/// Names the model treats specially, and optional load-time checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecConfig {
    /// Metadata format marking a field as a reference to other documents.
    pub document_reference_format: String,
    /// Name of the synthesized definition covering all metadata headers.
    pub metadata_headers_definition: String,
    /// Name of the synthesized definition covering the COSE document headers.
    pub document_headers_definition: String,
    /// Name of the synthesized definition covering the COSE signature headers.
    pub signature_headers_definition: String,
    pub validate_payload_examples: bool,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            document_reference_format: "Document Reference".to_string(),
            metadata_headers_definition: "Signed_Document_Metadata_Headers".to_string(),
            document_headers_definition: "COSE_Document_Standard_Headers".to_string(),
            signature_headers_definition: "COSE_Signature_Standard_Headers".to_string(),
            validate_payload_examples: true,
        }
    }
}

impl SpecConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> SpecResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> SpecResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpecError::NotFound(path.to_path_buf()));
        }
        debug!("Reading configuration from {:?}", path);

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Names of the three definitions synthesized after loading.
    pub fn synthesized_definitions(&self) -> [&str; 3] {
        [
            &self.document_headers_definition,
            &self.signature_headers_definition,
            &self.metadata_headers_definition,
        ]
    }
}
