//! Inspect command implementation.

use crate::cli::InspectArgs;
use crate::error::add_package_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use dias_core::PackageInspector;

pub fn execute(args: &InspectArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let description = add_package_context(
        PackageInspector::new().inspect(&args.package),
        &args.package,
    )?;

    formatter.format_description(&description)?;

    if let Some(report) = &args.report {
        add_package_context(description.write_report(report), report)?;
        formatter.format_success(&format!("Description written to {}", report.display()));
    }

    Ok(())
}
