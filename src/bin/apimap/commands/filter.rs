//! `apimap filter` command

use anyhow::Result;

use crate::cli::{FilterArgs, GlobalArgs};
use crate::commands::{load_workspace_config, progress_bar};
use apimap::ops::{filter_dir, ModuleFilter};
use apimap::ranking::{HttpRanker, NoRanker, RankError, Ranker};
use apimap::util::fs::json_files;

pub fn execute(args: FilterArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_workspace_config(global, &args.workspace_root);

    let http;
    let ranker: &dyn Ranker = match HttpRanker::from_config(&config.ranker) {
        Ok(r) => {
            tracing::debug!("ranking through {}", r.endpoint());
            http = r;
            &http
        }
        Err(RankError::NotConfigured(key)) => {
            tracing::warn!("{} is not set, ambiguous matches keep every candidate", key);
            &NoRanker
        }
        Err(e) => return Err(e.into()),
    };

    let filter = ModuleFilter::new(ranker, &args.config_dir, &args.workspace_root);

    let pb = progress_bar(json_files(&args.input_dir)?.len(), global.verbose)?;
    let report = filter_dir(&filter, &args.input_dir, &args.output_dir, pb.as_ref())?;
    if let Some(pb) = &pb {
        pb.finish_with_message("done");
    }

    eprintln!(
        "    Filtered {}/{} file(s): {} module(s), {} ranked, {} kept all candidates",
        report.files - report.failed.len(),
        report.files,
        report.stats.modules,
        report.stats.ranked,
        report.stats.fallbacks
    );

    Ok(())
}
