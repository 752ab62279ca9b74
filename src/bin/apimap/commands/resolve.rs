//! `apimap resolve` command

use anyhow::Result;

use crate::cli::{GlobalArgs, ResolveArgs};
use crate::commands::{load_workspace_config, progress_bar};
use apimap::ops::{enhance_dir, Aggregator, EnhanceOptions};
use apimap::util::fs::json_files;
use apimap::{CatalogDir, DependencyIndex, SignatureResolver};

pub fn execute(args: ResolveArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_workspace_config(global, &args.workspace_root);

    let index = DependencyIndex::load(&args.index_file)?;
    tracing::debug!("loaded {} packages from {}", index.len(), args.index_file.display());

    // CLI overrides config
    let strategy = args
        .install_path
        .unwrap_or_else(|| config.install_path_strategy());

    let catalogs = CatalogDir::new(&args.catalog_dir);
    let resolver =
        SignatureResolver::new(&index, &catalogs, &args.workspace_root).with_strategy(strategy);
    let aggregator = Aggregator::new(&resolver, &config.policy);

    let total = json_files(&args.input_dir)?.len();
    let opts = EnhanceOptions {
        jobs: args.jobs,
        progress: progress_bar(total, global.verbose || args.json)?,
    };

    let report = enhance_dir(&aggregator, &args.input_dir, &args.output_dir, &opts)?;

    if let Some(pb) = &opts.progress {
        pb.finish_with_message("done");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.stats)?);
    } else {
        println!("{}", report.stats);
    }

    if !report.failed.is_empty() {
        eprintln!("     Skipped {} unreadable file(s):", report.failed.len());
        for path in &report.failed {
            eprintln!("       {}", path.display());
        }
    }

    Ok(())
}
