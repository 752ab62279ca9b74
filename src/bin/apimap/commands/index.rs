//! `apimap index` command

use anyhow::Result;

use crate::cli::IndexArgs;
use apimap::ops::write_index;

pub fn execute(args: IndexArgs) -> Result<()> {
    let report = write_index(&args.manifest_dir, &args.index_out, &args.paths_out)?;

    eprintln!(
        "     Indexed {} manifest(s): {} package(s), {} install path(s)",
        report.manifests, report.packages, report.unique_paths
    );
    if report.skipped > 0 {
        eprintln!("     Skipped {} unreadable manifest(s)", report.skipped);
    }
    eprintln!("      Digest {}", report.digest);

    Ok(())
}
