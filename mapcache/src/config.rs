//! YAML settings for opening an offline database.
//!
//! ```yaml
//! maximum_cache_size: 52428800   # bytes, or "unlimited"
//! hosted_tile_prefix: "mapbox://"
//! offline_tile_count_limit: 6000 # tiles, or "unlimited"
//! ```
//!
//! Every key is optional; missing keys keep the database defaults.

use anyhow::{Context, Result};
use log::debug;
use mapcache_database::DatabaseBuilder;
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

/// A numeric limit or `unlimited`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
	Unlimited,
	#[serde(untagged)]
	Value(u64),
}

impl Limit {
	pub fn as_option(self) -> Option<u64> {
		match self {
			Limit::Unlimited => None,
			Limit::Value(value) => Some(value),
		}
	}
}

#[derive(Default, Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// Byte budget for entries not pinned by a region
	#[serde(default)]
	pub maximum_cache_size: Option<Limit>,

	/// Url template prefix that marks a tile as hosted
	#[serde(default)]
	pub hosted_tile_prefix: Option<String>,

	/// Number of hosted tiles offline regions may pin
	#[serde(default)]
	pub offline_tile_count_limit: Option<Limit>,
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("opening config '{}'", path.display()))?;
		let config =
			Config::from_reader(BufReader::new(file)).with_context(|| format!("parsing config '{}'", path.display()))?;
		debug!("loaded config '{}': {config:?}", path.display());
		Ok(config)
	}

	/// A database builder carrying these settings.
	pub fn database_builder(&self) -> DatabaseBuilder {
		let mut builder = DatabaseBuilder::new();
		match self.maximum_cache_size.map(Limit::as_option) {
			Some(Some(bytes)) => builder = builder.maximum_cache_size(bytes),
			Some(None) => builder = builder.unlimited_cache_size(),
			None => {}
		}
		if let Some(prefix) = &self.hosted_tile_prefix {
			builder = builder.hosted_tile_prefix(prefix);
		}
		if let Some(limit) = self.offline_tile_count_limit {
			builder = builder.offline_tile_count_limit(limit.as_option());
		}
		builder
	}
}
