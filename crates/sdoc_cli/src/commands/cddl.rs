//! CDDL command - Print a complete CDDL file or a document's header groups.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use sdoc_spec::HeaderKind;

#[derive(Args)]
pub struct CddlArgs {
    /// Specification file
    spec: PathBuf,

    /// Root definition of the CDDL file
    #[arg(default_value = "signed_document")]
    root: String,

    /// Print the header groups synthesized for one document instead
    #[arg(short, long)]
    doc: Option<String>,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn execute(args: CddlArgs, config: Option<&Path>) -> Result<()> {
    let spec = super::load(&args.spec, config)?;

    let content = match &args.doc {
        Some(doc) => {
            info!("Synthesizing header groups for {}", doc);
            let mut blocks = Vec::new();
            for kind in [HeaderKind::Document, HeaderKind::Metadata] {
                let def = spec.synthesize(kind, Some(doc.as_str()))?;
                blocks.push(format!("{} = {}", def.name(), def.definition));
            }
            format!("; {doc}\n\n{}\n", blocks.join("\n\n"))
        }
        None => {
            info!("Assembling CDDL for {}", args.root);
            spec.cddl_file(&args.root)?
        }
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &content).with_context(|| format!("Failed to write {:?}", path))?;
            println!("✅ CDDL written to {:?}", path);
        }
        None => print!("{content}"),
    }

    Ok(())
}
