//! Counting of hosted tiles pinned by offline regions.
//!
//! A tile is hosted when its url template starts with the configured prefix. The count is derived from the
//! membership links every time it is asked for, so it cannot drift from the stored data.

use crate::OfflineDatabase;
use anyhow::Result;
use r2d2_sqlite::rusqlite::{Connection, params};
use std::sync::atomic::Ordering;

const NO_LIMIT: u64 = u64::MAX;

pub(crate) fn encode_limit(limit: Option<u64>) -> u64 {
	limit.unwrap_or(NO_LIMIT)
}

/// Number of distinct hosted tiles linked to at least one region.
pub(crate) fn hosted_tile_count(conn: &Connection, prefix: &str) -> Result<u64> {
	let count: i64 = conn
		.prepare_cached(
			"SELECT COUNT(DISTINCT e.id) FROM region_entries r JOIN entries e ON e.id = r.entry_id
			WHERE e.url_template IS NOT NULL AND substr(e.url_template, 1, length(?1)) = ?1",
		)?
		.query_row(params![prefix], |row| row.get(0))?;
	Ok(count as u64)
}

impl OfflineDatabase {
	/// Number of distinct hosted tiles pinned by any region.
	pub fn get_offline_mapbox_tile_count(&self) -> Result<u64> {
		self.read(|conn| hosted_tile_count(conn, &self.hosted_tile_prefix))
	}

	pub fn set_offline_mapbox_tile_count_limit(&self, limit: Option<u64>) {
		self
			.offline_tile_count_limit
			.store(encode_limit(limit), Ordering::Relaxed);
	}

	pub fn offline_mapbox_tile_count_limit(&self) -> Option<u64> {
		let limit = self.offline_tile_count_limit.load(Ordering::Relaxed);
		(limit != NO_LIMIT).then_some(limit)
	}

	/// Whether regions already pin as many hosted tiles as the limit allows.
	pub fn offline_mapbox_tile_count_limit_exceeded(&self) -> Result<bool> {
		Ok(match self.offline_mapbox_tile_count_limit() {
			Some(limit) => self.get_offline_mapbox_tile_count()? >= limit,
			None => false,
		})
	}
}
