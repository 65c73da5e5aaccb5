use anyhow::{Context, Result, ensure};
use clap::Args;
use mapcache::{
	config::Config,
	core::{LatLngBounds, RegionDefinition, RegionMetadata},
};
use std::{io::Write, path::PathBuf};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// offline database file
	#[arg(required = true)]
	database: PathBuf,

	/// url of the style the region is rendered with
	#[arg(long, required = true)]
	style: String,

	/// bounding box of the region: "west,south,east,north"
	#[arg(long, required = true, value_name = "W,S,E,N", allow_hyphen_values = true)]
	bbox: String,

	/// minimum zoom level
	#[arg(long, default_value_t = 0.0)]
	min_zoom: f64,

	/// maximum zoom level, unbounded if omitted
	#[arg(long)]
	max_zoom: Option<f64>,

	/// pixel ratio of the tiles and sprites to download
	#[arg(long, default_value_t = 1.0)]
	pixel_ratio: f32,

	/// metadata stored with the region, for example its display name
	#[arg(long, default_value = "")]
	metadata: String,
}

fn parse_bbox(value: &str) -> Result<LatLngBounds> {
	let numbers = value
		.split(',')
		.map(|part| part.trim().parse::<f64>())
		.collect::<Result<Vec<f64>, _>>()
		.with_context(|| format!("parsing bbox '{value}'"))?;
	ensure!(numbers.len() == 4, "bbox must be \"west,south,east,north\", got '{value}'");
	LatLngBounds::new(numbers[1], numbers[0], numbers[3], numbers[2])
}

pub fn run(arguments: &Subcommand, config: &Config, out: &mut dyn Write) -> Result<()> {
	let definition = RegionDefinition::new(
		&arguments.style,
		parse_bbox(&arguments.bbox)?,
		arguments.min_zoom,
		arguments.max_zoom.unwrap_or(f64::INFINITY),
		arguments.pixel_ratio,
	)?;
	let db = super::open_database(config, &arguments.database)?;
	let region = db.create_region(&definition, &RegionMetadata::from(arguments.metadata.as_str()))?;
	log::info!("created region {} for '{}'", region.id(), arguments.style);
	writeln!(out, "{}", region.id())?;
	Ok(())
}
