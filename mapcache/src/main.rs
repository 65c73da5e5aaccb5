mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use mapcache::config::{Config, Limit};
use std::{io::Write, path::PathBuf};

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
	arg_required_else_help = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// YAML config file with database settings
	#[arg(long, short, global = true, value_name = "FILE")]
	config: Option<PathBuf>,

	/// override the byte budget for unpinned entries
	#[arg(long, global = true, value_name = "BYTES")]
	maximum_cache_size: Option<u64>,

	/// override the url template prefix of hosted tiles
	#[arg(long, global = true, value_name = "PREFIX")]
	hosted_tile_prefix: Option<String>,

	#[command(flatten)]
	verbose: Verbosity<WarnLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Show statistics about an offline database
	Stats(tools::stats::Subcommand),

	/// List offline regions and their progress
	Regions(tools::regions::Subcommand),

	/// Create an offline region
	CreateRegion(tools::create_region::Subcommand),

	/// Delete an offline region and release its resources
	DeleteRegion(tools::delete_region::Subcommand),

	/// Print a cached resource
	Get(tools::get::Subcommand),

	/// Store a resource in the cache
	Put(tools::put::Subcommand),

	/// Print the number of hosted tiles pinned by offline regions
	TileCount(tools::tile_count::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli, &mut std::io::stdout().lock())
}

fn load_config(cli: &Cli) -> Result<Config> {
	let mut config = match &cli.config {
		Some(path) => Config::from_path(path)?,
		None => Config::default(),
	};
	if let Some(bytes) = cli.maximum_cache_size {
		config.maximum_cache_size = Some(Limit::Value(bytes));
	}
	if let Some(prefix) = &cli.hosted_tile_prefix {
		config.hosted_tile_prefix = Some(prefix.clone());
	}
	Ok(config)
}

fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
	let config = load_config(&cli)?;
	match &cli.command {
		Commands::Stats(arguments) => tools::stats::run(arguments, &config, out),
		Commands::Regions(arguments) => tools::regions::run(arguments, &config, out),
		Commands::CreateRegion(arguments) => tools::create_region::run(arguments, &config, out),
		Commands::DeleteRegion(arguments) => tools::delete_region::run(arguments, &config, out),
		Commands::Get(arguments) => tools::get::run(arguments, &config, out),
		Commands::Put(arguments) => tools::put::run(arguments, &config, out),
		Commands::TileCount(arguments) => tools::tile_count::run(arguments, &config, out),
	}
}
