//! Init command implementation.

use crate::cli::InitArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the init command.
pub fn execute_init(args: InitArgs, formatter: &Formatter) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(CliError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        )));
    }

    Config::default().save_to(&args.path)?;
    println!(
        "{}",
        formatter.success(&format!("Wrote {}", args.path.display()))
    );
    Ok(())
}
