use super::ResourceArgs;
use anyhow::{Context, Result, bail};
use clap::Args;
use mapcache::{
	config::Config,
	core::{Blob, RegionId, Response},
};
use std::{io::Write, path::PathBuf};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// offline database file
	#[arg(required = true)]
	database: PathBuf,

	#[command(flatten)]
	resource: ResourceArgs,

	/// file holding the payload
	file: Option<PathBuf>,

	/// store the resource for this offline region, which pins it
	#[arg(long)]
	region: Option<RegionId>,

	/// store an empty "no content" answer instead of a payload
	#[arg(long, conflicts_with = "file")]
	no_content: bool,

	/// etag sent by the server
	#[arg(long)]
	etag: Option<String>,
}

pub fn run(arguments: &Subcommand, config: &Config, out: &mut dyn Write) -> Result<()> {
	let mut response = match (&arguments.file, arguments.no_content) {
		(Some(path), _) => {
			let data = std::fs::read(path).with_context(|| format!("reading '{}'", path.display()))?;
			Response::from_data(Blob::from(data))
		}
		(None, true) => Response::no_content(),
		(None, false) => bail!("either a payload file or --no-content is required"),
	};
	if let Some(etag) = &arguments.etag {
		response = response.with_etag(etag);
	}

	let db = super::open_database(config, &arguments.database)?;
	let resource = arguments.resource.resource();
	let result = match arguments.region {
		Some(region_id) => db.put_region_resource(region_id, &resource, &response)?,
		None => db.put(&resource, &response)?,
	};
	let action = if result.inserted { "inserted" } else { "updated" };
	writeln!(out, "{action} '{}' ({} bytes stored)", resource.url, result.stored_size)?;
	Ok(())
}
