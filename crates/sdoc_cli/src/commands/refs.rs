//! Refs command - Show the document reference graph.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use sdoc_spec::{Header, SignedDocSpec};

#[derive(Args)]
pub struct RefsArgs {
    /// Specification file
    spec: PathBuf,

    /// Only show this document
    #[arg(short, long)]
    doc: Option<String>,
}

pub fn execute(args: RefsArgs, config: Option<&Path>) -> Result<()> {
    let spec = super::load(&args.spec, config)?;

    let names: Vec<String> = match args.doc {
        Some(doc) => vec![spec.get_document(&doc)?.name().to_string()],
        None => spec.document_names().map(str::to_string).collect(),
    };

    for name in &names {
        print_document(&spec, name)?;
    }

    Ok(())
}

fn print_document(spec: &SignedDocSpec, name: &str) -> Result<()> {
    println!("📄 {name}");
    if let Some(cluster) = spec.cluster_of(name) {
        println!("   cluster: {}", cluster.name());
    }

    let reference_format = &spec.config().document_reference_format;
    let doc = spec.get_document(name)?;
    for field in doc.metadata.all() {
        if field.required.is_excluded() || !field.is_reference(reference_format) {
            continue;
        }
        let target = match spec.cluster_for_reference_target_set(&field.doc_types) {
            Some(cluster) => format!("[{}]", cluster.name()),
            None => field.doc_types.join(", "),
        };
        println!("   {} → {}", field.name(), target);
    }

    println!("   referenced by: {}", joined(spec.all_docs_referencing(name)?));
    println!();
    Ok(())
}

fn joined(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}
