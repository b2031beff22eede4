//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dias")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Packager configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Progress bars only make sense for interactive human output.
    pub const fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a DIAS package from a file or directory
    Create(CreateArgs),
    /// Validate the structure and fixity of a package
    Validate(ValidateArgs),
    /// Describe the metadata and content of a package
    Inspect(InspectArgs),
    /// Write a metadata template to fill in
    Template(TemplateArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// File or directory to package
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory that receives the package
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Package name, also used as label when the metadata has none
    #[arg(short, long)]
    pub name: String,

    /// Metadata record (TOML, JSON or XML)
    #[arg(short, long, value_name = "FILE")]
    pub metadata: PathBuf,

    /// Directory containing dias_mets.xsd and dias_premis.xsd
    #[arg(long, value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Package (container) directory
    #[arg(value_name = "PACKAGE")]
    pub package: PathBuf,

    /// Recompute every checksum instead of only checking presence
    #[arg(long)]
    pub full_fixity: bool,

    /// Also write a text report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct InspectArgs {
    /// Package (container) directory
    #[arg(value_name = "PACKAGE")]
    pub package: PathBuf,

    /// Also write the description to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct TemplateArgs {
    /// Where to write the template
    #[arg(value_name = "FILE")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_quiet_and_json_hide_progress() {
        let cli = Cli::parse_from(["dias", "--json", "template", "m.toml"]);
        assert!(!cli.show_progress());
        let cli = Cli::parse_from(["dias", "template", "m.toml"]);
        assert!(cli.show_progress());
    }
}
