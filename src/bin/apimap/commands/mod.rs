//! Command implementations

pub mod completions;
pub mod configs;
pub mod filter;
pub mod index;
pub mod modules;
pub mod resolve;

use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use apimap::util::config::{global_config_path, load_config, project_config_path};
use apimap::Config;

use crate::cli::GlobalArgs;

/// Load global config, then the `--config` file or the workspace's project config.
pub fn load_workspace_config(global: &GlobalArgs, workspace_root: &Path) -> Config {
    let project = global
        .config
        .clone()
        .unwrap_or_else(|| project_config_path(workspace_root));
    tracing::debug!("loading config from {}", project.display());
    load_config(global_config_path().as_deref(), &project)
}

/// A progress bar for `total` items, unless verbose or there is only one.
pub fn progress_bar(total: usize, verbose: bool) -> Result<Option<ProgressBar>> {
    if verbose || total <= 1 {
        return Ok(None);
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(Some(pb))
}
