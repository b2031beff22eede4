//! Template command implementation.

use crate::cli::TemplateArgs;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use dias_core::PackageMetadata;
use std::fs;

pub fn execute(args: &TemplateArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    if args.output.exists() {
        if !args.force {
            bail!(
                "'{}' already exists\nHINT: Use --force to overwrite it.",
                args.output.display()
            );
        }
        formatter.format_warning(&format!("Overwriting {}", args.output.display()));
    }

    fs::write(&args.output, PackageMetadata::template_toml())
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;

    formatter.format_success(&format!(
        "Metadata template written to {}",
        args.output.display()
    ));
    Ok(())
}
