//! `apimap modules` command

use anyhow::Result;

use crate::cli::ModulesArgs;
use apimap::ops::workspace_modules;
use apimap::util::fs::{read_lines, write_lines};

pub fn execute(args: ModulesArgs) -> Result<()> {
    let modules = workspace_modules(read_lines(&args.input)?);
    write_lines(&args.output, &modules)?;

    eprintln!(
        "     Wrote {} workspace module(s) to {}",
        modules.len(),
        args.output.display()
    );
    Ok(())
}
