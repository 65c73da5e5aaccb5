use anyhow::Result;
use clap::Args;
use mapcache::{
	config::Config,
	core::RegionId,
	database::CacheError,
};
use std::{io::Write, path::PathBuf};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// offline database file
	#[arg(required = true)]
	database: PathBuf,

	/// id of the region to delete
	#[arg(required = true)]
	id: RegionId,
}

pub fn run(arguments: &Subcommand, config: &Config, out: &mut dyn Write) -> Result<()> {
	let db = super::open_database(config, &arguments.database)?;
	let Some(region) = db.list_regions()?.into_iter().find(|region| region.id() == arguments.id) else {
		return Err(CacheError::UnknownRegion(arguments.id).into());
	};
	db.delete_region(region)?;
	writeln!(out, "deleted region {}", arguments.id)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::tests::run_command;
	use assert_fs::TempDir;

	#[test]
	fn deletes_region() {
		let dir = TempDir::new().unwrap();
		let db = dir.path().join("cache.db");
		let db = db.to_str().unwrap();
		run_command(vec!["mapcache", "create-region", db, "--style", "s", "--bbox", "0,0,1,1"]).unwrap();

		assert_eq!(
			run_command(vec!["mapcache", "delete-region", db, "1"]).unwrap(),
			"deleted region 1\n"
		);
		let err = run_command(vec!["mapcache", "delete-region", db, "1"]).unwrap_err();
		assert_eq!(err.to_string(), "unknown offline region 1");
	}
}
