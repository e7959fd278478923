//! `config`: print the effective configuration

use anyhow::Result;
use clap::Args;

use super::table::TableArgs;

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[clap(flatten)]
    pub table: TableArgs,
}

/// Print the merged configuration as TOML
pub fn execute(args: &ConfigArgs) -> Result<()> {
    let config = args.table.resolve()?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}
