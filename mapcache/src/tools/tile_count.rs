use anyhow::Result;
use clap::Args;
use mapcache::config::Config;
use std::{io::Write, path::PathBuf};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// offline database file
	#[arg(required = true)]
	database: PathBuf,
}

pub fn run(arguments: &Subcommand, config: &Config, out: &mut dyn Write) -> Result<()> {
	let db = super::open_database(config, &arguments.database)?;
	writeln!(out, "{}", db.get_offline_mapbox_tile_count()?)?;
	Ok(())
}
