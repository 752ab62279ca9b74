//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use apimap::InstallPathStrategy;

/// apimap - resolve third-party API calls to exported function signatures
#[derive(Parser)]
#[command(name = "apimap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of <workspace_root>/.apimap/config.toml
    #[arg(long, global = true, env = "APIMAP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by commands that read the configuration.
pub struct GlobalArgs {
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the dependency index from package-manager manifests
    Index(IndexArgs),

    /// List first-party workspace modules from an install path listing
    Modules(ModulesArgs),

    /// Collect package.json files for every install path
    Configs(ConfigsArgs),

    /// Resolve call-usage documents against function catalogs
    Resolve(ResolveArgs),

    /// Narrow ambiguous matches with the ranking service
    Filter(FilterArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct IndexArgs {
    /// Directory of manifest listings (*.json)
    pub manifest_dir: PathBuf,

    /// Where to write the dependency index
    pub index_out: PathBuf,

    /// Where to write the unique install path listing
    pub paths_out: PathBuf,
}

#[derive(Args)]
pub struct ModulesArgs {
    /// Install path listing, one path per line
    pub input: PathBuf,

    /// Where to write the workspace module listing
    pub output: PathBuf,
}

#[derive(Args)]
pub struct ConfigsArgs {
    /// Install path listing, one path per line
    pub paths_file: PathBuf,

    /// Root of the analyzed project
    pub workspace_root: PathBuf,

    /// Directory to collect package configs into
    pub out_dir: PathBuf,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Directory of call-usage documents (*.json)
    pub input_dir: PathBuf,

    /// Directory to write enriched documents into
    pub output_dir: PathBuf,

    /// Root of the analyzed project
    pub workspace_root: PathBuf,

    /// Dependency index written by `apimap index`
    pub index_file: PathBuf,

    /// Directory of per-package function catalogs
    pub catalog_dir: PathBuf,

    /// Install path tie-break (first, all, nearest)
    #[arg(long)]
    pub install_path: Option<InstallPathStrategy>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print statistics as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Directory of enriched documents (*.json)
    pub input_dir: PathBuf,

    /// Directory to write filtered documents into
    pub output_dir: PathBuf,

    /// Root of the analyzed project
    pub workspace_root: PathBuf,

    /// Directory of package configs collected by `apimap configs`
    pub config_dir: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
