//! Validate command - Load and cross-check a specification.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use tracing::info;

use sdoc_spec::{SpecError, ValidationResult};

#[derive(Args)]
pub struct ValidateArgs {
    /// Specification file
    spec: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,
}

pub fn execute(args: ValidateArgs, config: Option<&Path>) -> Result<()> {
    info!("Validating specification: {:?}", args.spec);

    let spec = super::load(&args.spec, config)?;

    println!("📋 {:?}", args.spec);
    println!("   {} documents", spec.documents().len());
    println!("   {} base types", spec.base_types().len());
    println!("   {} CDDL definitions", spec.cddl_definitions().names().len());
    println!("   {} reference edges", spec.reference_graph().edge_count());

    for warning in spec.warnings() {
        println!("   ⚠️  {}", warning);
    }

    println!();
    if args.strict && !spec.warnings().is_empty() {
        let mut result = ValidationResult::new();
        for warning in spec.warnings() {
            result.add_error(warning.kind, warning.path.clone(), warning.message.clone());
        }
        return Err(SpecError::Rejected(Box::new(result)).into());
    }
    println!("✅ Specification is valid");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_parse_strict() {
        let cli = Cli::try_parse_from(["sdoc", "validate", "signed_doc.json", "--strict"]).unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert!(args.strict);
        assert_eq!(args.spec, PathBuf::from("signed_doc.json"));
    }
}
