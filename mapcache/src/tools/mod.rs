pub mod create_region;
pub mod delete_region;
pub mod get;
pub mod put;
pub mod regions;
pub mod stats;
pub mod tile_count;

use anyhow::{Result, bail};
use clap::Args;
use mapcache::{
	config::Config,
	core::{Resource, ResourceKind},
	database::OfflineDatabase,
};
use std::path::Path;

pub fn open_database(config: &Config, path: &Path) -> Result<OfflineDatabase> {
	config.database_builder().path(path).build()
}

/// Identifies a single resource on the command line.
#[derive(Args, Debug)]
pub struct ResourceArgs {
	/// url of the resource, or the url template when --tile is given
	#[arg(required = true)]
	url: String,

	/// kind of resource (ignored for tiles)
	#[arg(long, value_enum, default_value_t = ResourceKind::Unknown)]
	kind: ResourceKind,

	/// tile coordinates as Z/X/Y
	#[arg(long, value_name = "Z/X/Y", value_parser = parse_tile_coord)]
	tile: Option<(u8, u32, u32)>,

	/// pixel ratio of the tile
	#[arg(long, default_value_t = 1.0)]
	pixel_ratio: f32,
}

impl ResourceArgs {
	pub fn resource(&self) -> Resource {
		match self.tile {
			Some((z, x, y)) => Resource::tile(&self.url, self.pixel_ratio, x, y, z),
			None => Resource::new(self.kind, &self.url),
		}
	}
}

fn parse_tile_coord(value: &str) -> Result<(u8, u32, u32)> {
	let parts: Vec<&str> = value.split('/').collect();
	if parts.len() != 3 {
		bail!("expected Z/X/Y, got '{value}'");
	}
	let z: u8 = parts[0].parse()?;
	let x: u32 = parts[1].parse()?;
	let y: u32 = parts[2].parse()?;
	if z > 31 || u64::from(x) >= 1u64 << z || u64::from(y) >= 1u64 << z {
		bail!("tile {z}/{x}/{y} does not exist");
	}
	Ok((z, x, y))
}
