//! CLI command definitions.
//!
//! Every subcommand loads one specification file, so loading and the
//! optional configuration file are handled here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use sdoc_spec::{SignedDocSpec, SpecConfig};

pub mod cddl;
pub mod metadata;
pub mod refs;
pub mod validate;

/// sdoc - signed document specification tool
#[derive(Parser)]
#[command(name = "sdoc")]
#[command(version, about = "sdoc - signed document specification tool")]
#[command(long_about = r#"
sdoc loads a signed document specification, checks it for consistency
and answers questions about the documents it defines.

COMMANDS:
  validate  → Load and cross-check a specification
  cddl      → Print a complete CDDL file or a synthesized header group
  refs      → Show which documents reference which
  metadata  → Render metadata field rules as Markdown

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Loader configuration file (TOML)
    #[arg(short, long, global = true, env = "SDOC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a specification file
    Validate(validate::ValidateArgs),

    /// Print CDDL for a definition or a document
    Cddl(cddl::CddlArgs),

    /// Show the document reference graph
    Refs(refs::RefsArgs),

    /// Render metadata rules as Markdown
    Metadata(metadata::MetadataArgs),
}

/// Load a specification, with the configuration file when one is given.
pub fn load(spec: &Path, config: Option<&Path>) -> Result<SignedDocSpec> {
    let config = match config {
        Some(path) => SpecConfig::from_path(path)
            .with_context(|| format!("Failed to read configuration {:?}", path))?,
        None => SpecConfig::default(),
    };
    debug!("Loading {:?} with {:?}", spec, config);

    SignedDocSpec::from_path_with(spec, config).with_context(|| format!("Failed to load {:?}", spec))
}
