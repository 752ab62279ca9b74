//! `apimap configs` command

use anyhow::Result;

use crate::cli::ConfigsArgs;
use apimap::ops::collect_configs;
use apimap::util::fs::read_lines;

pub fn execute(args: ConfigsArgs) -> Result<()> {
    let paths = read_lines(&args.paths_file)?;
    let report = collect_configs(paths, &args.workspace_root, &args.out_dir)?;

    eprintln!(
        "   Collected {} package config(s) into {}",
        report.written,
        args.out_dir.display()
    );
    if report.skipped > 0 {
        eprintln!("     Skipped {} install path(s) without a readable package.json", report.skipped);
    }
    Ok(())
}
