//! Validate command implementation.

use crate::cli::ValidateArgs;
use crate::commands::load_config;
use crate::error::Reported;
use crate::error::add_package_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use dias_core::PackageValidator;
use std::path::Path;

pub fn execute(
    args: &ValidateArgs,
    config_path: Option<&Path>,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;

    let result = PackageValidator::new()
        .with_config(&config)
        .with_full_fixity(args.full_fixity)
        .validate(&args.package);

    formatter.format_validation_result(&args.package, &result)?;

    if let Some(report) = &args.report {
        add_package_context(result.write_report(report), report)?;
        formatter.format_success(&format!("Report written to {}", report.display()));
    }

    // Findings are already on screen; only the exit code is left.
    if result.is_valid() {
        Ok(())
    } else {
        Err(Reported("package validation failed").into())
    }
}
