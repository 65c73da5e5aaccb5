use super::ResourceArgs;
use anyhow::{Result, bail};
use clap::Args;
use log::info;
use mapcache::config::Config;
use std::{io::Write, path::PathBuf};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// offline database file
	#[arg(required = true)]
	database: PathBuf,

	#[command(flatten)]
	resource: ResourceArgs,

	/// write the payload to this file instead of stdout
	#[arg(long, short)]
	output: Option<PathBuf>,
}

pub fn run(arguments: &Subcommand, config: &Config, out: &mut dyn Write) -> Result<()> {
	let db = super::open_database(config, &arguments.database)?;
	let resource = arguments.resource.resource();
	let Some(response) = db.get(&resource)? else {
		bail!("'{}' is not cached", resource.url);
	};

	let data = response.data.unwrap_or_default();
	if response.no_content {
		info!("'{}' is cached without content", resource.url);
	}
	match &arguments.output {
		Some(path) => std::fs::write(path, data.as_slice())?,
		None => out.write_all(data.as_slice())?,
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::tests::run_command;
	use assert_fs::TempDir;

	#[test]
	fn missing_resource() {
		let dir = TempDir::new().unwrap();
		let db = dir.path().join("cache.db");
		let err = run_command(vec!["mapcache", "get", db.to_str().unwrap(), "https://example.com/style.json"])
			.unwrap_err();
		assert_eq!(err.to_string(), "'https://example.com/style.json' is not cached");
	}

	#[test]
	fn writes_to_file() {
		let dir = TempDir::new().unwrap();
		let db = dir.path().join("cache.db");
		let db = db.to_str().unwrap();
		let input = dir.path().join("sprite.json");
		let output = dir.path().join("copy.json");
		std::fs::write(&input, "{\"icon\":{}}").unwrap();

		let url = "https://example.com/sprite.json";
		run_command(vec!["mapcache", "put", db, url, input.to_str().unwrap(), "--kind", "sprite-json"]).unwrap();
		let stdout = run_command(vec!["mapcache", "get", db, url, "-o", output.to_str().unwrap()]).unwrap();

		assert_eq!(stdout, "");
		assert_eq!(std::fs::read_to_string(&output).unwrap(), "{\"icon\":{}}");
	}
}
