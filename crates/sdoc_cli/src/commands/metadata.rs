//! Metadata command - Render metadata field rules as Markdown.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct MetadataArgs {
    /// Specification file
    spec: PathBuf,

    /// Document whose metadata to render; the global fields otherwise
    #[arg(short, long)]
    doc: Option<String>,

    /// Render a single field
    #[arg(short, long)]
    field: Option<String>,
}

pub fn execute(args: MetadataArgs, config: Option<&Path>) -> Result<()> {
    let spec = super::load(&args.spec, config)?;
    let doc = args.doc.as_deref();

    let markdown = match &args.field {
        Some(field) => {
            let ids = doc
                .map(|name| spec.document_type(name).map(|t| t.formatted_ids()))
                .transpose()?;
            spec.metadata_view(field, doc)?.to_markdown(ids.as_deref())
        }
        None => spec.metadata_as_markdown(doc)?,
    };

    println!("{}", markdown.trim_end());
    Ok(())
}
