use anyhow::Result;
use clap::Args;
use mapcache::{config::Config, core::OfflineRegion, database::OfflineDatabase};
use std::{io::Write, path::PathBuf};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// offline database file
	#[arg(required = true)]
	database: PathBuf,
}

fn describe(db: &OfflineDatabase, region: &OfflineRegion) -> Result<String> {
	let definition = region.definition();
	let bounds = definition.bounds;
	let status = db.get_region_status(region.id())?;
	let max_zoom = if definition.has_unbounded_zoom() {
		String::from("∞")
	} else {
		definition.max_zoom.to_string()
	};
	Ok(format!(
		"{}: {} [{},{},{},{}] z{}-{} @{}x, metadata: '{}', {} resources ({} bytes), {} tiles ({} bytes)",
		region.id(),
		definition.style_url,
		bounds.west,
		bounds.south,
		bounds.east,
		bounds.north,
		definition.min_zoom,
		max_zoom,
		definition.pixel_ratio,
		region.metadata().to_string_lossy(),
		status.completed_resource_count,
		status.completed_resource_size,
		status.completed_tile_count,
		status.completed_tile_size,
	))
}

pub fn run(arguments: &Subcommand, config: &Config, out: &mut dyn Write) -> Result<()> {
	let db = super::open_database(config, &arguments.database)?;
	for region in db.list_regions()? {
		writeln!(out, "{}", describe(&db, &region)?)?;
	}
	Ok(())
}
