//! Builder pattern for opening [`OfflineDatabase`] handles

use crate::{
	EventBus, OfflineDatabase,
	schema::{Location, open_pool},
	usage::encode_limit,
};
use anyhow::Result;
use std::path::Path;

/// Default budget for unpinned entries: 50 MiB.
pub const DEFAULT_MAXIMUM_CACHE_SIZE: u64 = 50 * 1024 * 1024;

/// Template prefix that marks a tile as hosted (metered).
pub const DEFAULT_HOSTED_TILE_PREFIX: &str = "mapbox://";

/// Default number of hosted tiles regions may pin.
pub const DEFAULT_OFFLINE_TILE_COUNT_LIMIT: u64 = 6000;

/// Builder for customized [`OfflineDatabase`] handles
///
/// # Examples
///
/// ```no_run
/// use mapcache_database::OfflineDatabase;
///
/// let db = OfflineDatabase::builder()
///     .path("/var/cache/map/offline.db")
///     .maximum_cache_size(100 * 1024 * 1024)
///     .offline_tile_count_limit(None)
///     .build()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct DatabaseBuilder {
	location: Location,
	maximum_cache_size: Option<u64>,
	hosted_tile_prefix: String,
	offline_tile_count_limit: Option<u64>,
	event_bus: Option<EventBus>,
}

impl DatabaseBuilder {
	/// Create a builder for an in-memory database with default settings
	pub fn new() -> Self {
		Self {
			location: Location::Memory,
			maximum_cache_size: Some(DEFAULT_MAXIMUM_CACHE_SIZE),
			hosted_tile_prefix: DEFAULT_HOSTED_TILE_PREFIX.to_string(),
			offline_tile_count_limit: Some(DEFAULT_OFFLINE_TILE_COUNT_LIMIT),
			event_bus: None,
		}
	}

	/// Store the database in a file
	pub fn path(mut self, path: impl AsRef<Path>) -> Self {
		self.location = Location::File(path.as_ref().to_path_buf());
		self
	}

	/// Keep the database in memory (default)
	pub fn in_memory(mut self) -> Self {
		self.location = Location::Memory;
		self
	}

	/// Set the byte budget for unpinned entries
	pub fn maximum_cache_size(mut self, bytes: u64) -> Self {
		self.maximum_cache_size = Some(bytes);
		self
	}

	/// Never evict
	pub fn unlimited_cache_size(mut self) -> Self {
		self.maximum_cache_size = None;
		self
	}

	/// Set the url template prefix of hosted tiles
	pub fn hosted_tile_prefix(mut self, prefix: &str) -> Self {
		self.hosted_tile_prefix = prefix.to_string();
		self
	}

	/// Set the hosted tile limit, `None` for no limit
	pub fn offline_tile_count_limit(mut self, limit: Option<u64>) -> Self {
		self.offline_tile_count_limit = limit;
		self
	}

	/// Share an existing event bus
	pub fn event_bus(mut self, event_bus: EventBus) -> Self {
		self.event_bus = Some(event_bus);
		self
	}

	/// Open the database
	///
	/// Incompatible files are reset, which is reported on the event bus passed in.
	pub fn build(self) -> Result<OfflineDatabase> {
		let event_bus = self.event_bus.unwrap_or_default();
		let pool = open_pool(&self.location, &event_bus)?;
		Ok(OfflineDatabase {
			pool,
			location: self.location,
			maximum_cache_size: self.maximum_cache_size,
			hosted_tile_prefix: self.hosted_tile_prefix,
			offline_tile_count_limit: encode_limit(self.offline_tile_count_limit).into(),
			event_bus,
		})
	}
}

impl Default for DatabaseBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::events::tests::{record, warnings};
	use assert_fs::TempDir;
	use std::fs;

	#[test]
	fn defaults() -> Result<()> {
		let db = DatabaseBuilder::default().build()?;
		assert_eq!(db.location(), &Location::Memory);
		assert_eq!(db.maximum_cache_size(), Some(DEFAULT_MAXIMUM_CACHE_SIZE));
		assert_eq!(db.hosted_tile_prefix(), "mapbox://");
		assert_eq!(db.offline_mapbox_tile_count_limit(), Some(6000));
		Ok(())
	}

	#[test]
	fn custom_settings() -> Result<()> {
		let dir = TempDir::new()?;
		let db = DatabaseBuilder::new()
			.path(dir.path().join("cache.db"))
			.maximum_cache_size(1024)
			.hosted_tile_prefix("hosted://")
			.offline_tile_count_limit(None)
			.build()?;
		assert_eq!(db.location(), &Location::File(dir.path().join("cache.db")));
		assert_eq!(db.maximum_cache_size(), Some(1024));
		assert_eq!(db.hosted_tile_prefix(), "hosted://");
		assert_eq!(db.offline_mapbox_tile_count_limit(), None);
		assert_eq!(
			DatabaseBuilder::new().unlimited_cache_size().build()?.maximum_cache_size(),
			None
		);
		Ok(())
	}

	#[test]
	fn reset_is_reported_on_given_bus() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("cache.db");
		fs::write(&path, "this is an invalid file")?;

		let bus = EventBus::new();
		let events = record(&bus);
		let db = DatabaseBuilder::new().path(&path).event_bus(bus).build()?;
		assert_eq!(warnings(&events).len(), 1);
		assert_eq!(db.entry_count()?, 0);
		Ok(())
	}
}
