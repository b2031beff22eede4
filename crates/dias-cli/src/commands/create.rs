//! Create command implementation.

use crate::cli::CreateArgs;
use crate::commands::load_config;
use crate::error::add_package_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use dias_core::AssemblyObserver;
use dias_core::AssemblyOutcome;
use dias_core::AssemblyRequest;
use dias_core::DirectorySchemaSource;
use dias_core::JobRunner;
use dias_core::NoopObserver;
use dias_core::PackageAssembler;
use dias_core::PackageMetadata;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;

pub fn execute(
    args: &CreateArgs,
    config_path: Option<&Path>,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
    verbose: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let metadata = add_package_context(PackageMetadata::from_file(&args.metadata), &args.metadata)?;

    // The assembler already logs through tracing; a second sink would only
    // repeat every line.
    let observer: Arc<dyn AssemblyObserver> = if show_progress && CliProgress::should_show() {
        Arc::new(CliProgress::new("Creating", verbose))
    } else {
        Arc::new(NoopObserver)
    };

    let schemas = DirectorySchemaSource::new(args.schema_dir.as_deref(), &config);
    let assembler = PackageAssembler::new(config)
        .with_observer(observer)
        .with_schema_source(Box::new(schemas));
    let request = AssemblyRequest::new(
        &args.source,
        &args.output_dir,
        args.name.clone(),
        metadata,
    );

    let runner = JobRunner::new();
    let (tx, rx) = mpsc::channel();
    add_package_context(
        runner.submit_assembly(assembler, request, move |outcome| {
            // The receiver only goes away if the main thread already bailed.
            let _ = tx.send(outcome);
        }),
        &args.source,
    )?;

    let outcome = rx
        .recv()
        .context("package job ended without reporting an outcome")?;
    runner.wait();

    match outcome {
        AssemblyOutcome::Succeeded(summary) => formatter.format_assembly_result(&summary),
        AssemblyOutcome::Failed { message } | AssemblyOutcome::Cancelled { message } => {
            bail!(message)
        }
    }
}
