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

	writeln!(out, "entries: {}", db.entry_count()?)?;
	match db.maximum_cache_size() {
		Some(limit) => writeln!(out, "cache size: {} of {limit} bytes", db.cache_size()?)?,
		None => writeln!(out, "cache size: {} bytes (unlimited)", db.cache_size()?)?,
	}
	writeln!(out, "regions: {}", db.list_regions()?.len())?;

	let count = db.get_offline_mapbox_tile_count()?;
	match db.offline_mapbox_tile_count_limit() {
		Some(limit) if db.offline_mapbox_tile_count_limit_exceeded()? => {
			writeln!(out, "hosted tiles: {count} of {limit} (limit reached)")?;
		}
		Some(limit) => writeln!(out, "hosted tiles: {count} of {limit}")?,
		None => writeln!(out, "hosted tiles: {count} (unlimited)")?,
	}
	Ok(())
}
