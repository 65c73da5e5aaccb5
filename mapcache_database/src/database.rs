//! The [`OfflineDatabase`] handle and its unscoped cache operations.
//!
//! Every public operation takes one pooled connection and, when it mutates anything (a `get` bumps recency),
//! runs inside a single `IMMEDIATE` transaction. Derived figures such as the unpinned footprint are computed
//! from the rows inside that transaction, never kept in memory.

use crate::{
	CacheError, DatabaseBuilder, EventBus,
	entry::{self, PendingEntry},
	eviction::{Eviction, make_space, unpinned_footprint},
	schema::{Location, with_retry},
};
use anyhow::Result;
use log::{debug, warn};
use mapcache_core::{Resource, Response};
use mapcache_derive::context;
use r2d2::Pool;
use r2d2_sqlite::{
	SqliteConnectionManager,
	rusqlite::{Connection, TransactionBehavior},
};
use std::{path::Path, sync::atomic::AtomicU64};

/// Outcome of a `put`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PutResult {
	/// `true` if the entry did not exist before.
	pub inserted: bool,
	/// Payload bytes as stored, after compression.
	pub stored_size: u64,
}

/// A handle on an offline cache database.
///
/// Handles are `Send + Sync`. Several handles, in this process or others, may share one file.
///
/// ```
/// use mapcache_core::{Resource, Response};
/// use mapcache_database::OfflineDatabase;
///
/// let db = OfflineDatabase::in_memory()?;
/// let style = Resource::style("http://example.com/style.json");
/// assert!(db.get(&style)?.is_none());
///
/// let result = db.put(&style, &Response::from_data("{}"))?;
/// assert!(result.inserted);
/// assert_eq!(db.get(&style)?.unwrap().data.unwrap().as_str(), "{}");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct OfflineDatabase {
	pub(crate) pool: Pool<SqliteConnectionManager>,
	pub(crate) location: Location,
	pub(crate) maximum_cache_size: Option<u64>,
	pub(crate) hosted_tile_prefix: String,
	pub(crate) offline_tile_count_limit: AtomicU64,
	pub(crate) event_bus: EventBus,
}

impl std::fmt::Debug for OfflineDatabase {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OfflineDatabase")
			.field("location", &self.location)
			.field("maximum_cache_size", &self.maximum_cache_size)
			.field("hosted_tile_prefix", &self.hosted_tile_prefix)
			.finish_non_exhaustive()
	}
}

impl OfflineDatabase {
	pub fn builder() -> DatabaseBuilder {
		DatabaseBuilder::new()
	}

	/// Opens the database at `path` with default settings.
	pub fn open(path: &Path) -> Result<OfflineDatabase> {
		DatabaseBuilder::new().path(path).build()
	}

	/// Opens a fresh in-memory database with default settings.
	pub fn in_memory() -> Result<OfflineDatabase> {
		DatabaseBuilder::new().build()
	}

	pub fn location(&self) -> &Location {
		&self.location
	}

	pub fn maximum_cache_size(&self) -> Option<u64> {
		self.maximum_cache_size
	}

	pub fn hosted_tile_prefix(&self) -> &str {
		&self.hosted_tile_prefix
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Runs `operation` in an immediate transaction that is committed if it succeeds.
	pub(crate) fn write_transaction<T, F>(&self, mut operation: F) -> Result<T>
	where
		F: FnMut(&Connection) -> Result<T>,
	{
		with_retry(|| {
			let mut conn = self.pool.get()?;
			let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
			let result = operation(&tx)?;
			tx.commit()?;
			Ok(result)
		})
	}

	/// Runs a read-only `operation`.
	pub(crate) fn read<T, F>(&self, mut operation: F) -> Result<T>
	where
		F: FnMut(&Connection) -> Result<T>,
	{
		with_retry(|| {
			let conn = self.pool.get()?;
			operation(&conn)
		})
	}

	pub(crate) fn report_eviction(&self, eviction: Eviction) {
		if eviction.entries > 0 {
			debug!("evicted {} entries ({} bytes)", eviction.entries, eviction.bytes);
			self.event_bus.eviction(eviction.entries, eviction.bytes);
		}
	}

	/// Logs and emits a capacity failure found in `err`.
	pub(crate) fn report_failure(&self, err: &anyhow::Error) {
		if let Some(failure @ CacheError::Capacity { .. }) = CacheError::find(err) {
			warn!("{failure}");
			self.event_bus.warn(failure.to_string());
		}
	}

	/// Looks up a resource. A hit makes the entry the most recently used one.
	#[context("getting resource '{}'", resource.url)]
	pub fn get(&self, resource: &Resource) -> Result<Option<Response>> {
		let key = resource.key();
		self.write_transaction(|tx| {
			let found = entry::find_response(tx, &key)?;
			if let Some((id, _)) = &found {
				entry::touch(tx, *id)?;
			}
			Ok(found.map(|(_, response)| response))
		})
	}

	/// Stores a response, evicting least recently used entries if the cache budget requires it.
	///
	/// Error responses are not stored. A `not_modified` response refreshes an existing entry and leaves its
	/// payload alone. If the entry cannot fit, a [`CacheError::Capacity`] is returned and the store is unchanged.
	#[context("putting resource '{}'", resource.url)]
	pub fn put(&self, resource: &Resource, response: &Response) -> Result<PutResult> {
		if let Some(error) = &response.error {
			debug!("not caching '{}': {error}", resource.url);
			return Ok(PutResult::default());
		}
		let pending = PendingEntry::new(resource, response)?;

		let outcome = self.write_transaction(|tx| {
			let existing = entry::find_id(tx, &pending.key)?;
			if response.not_modified {
				if let Some(id) = existing {
					entry::refresh(tx, id, response)?;
				}
				return Ok((PutResult::default(), Eviction::default()));
			}

			let mut eviction = Eviction::default();
			if let Some(budget) = self.maximum_cache_size {
				let pinned = match existing {
					Some(id) => entry::is_pinned(tx, id)?,
					None => false,
				};
				if !pinned {
					eviction = make_space(tx, budget, pending.footprint(), existing)?;
				}
			}

			let (_, inserted) = entry::write(tx, existing, &pending)?;
			Ok((
				PutResult {
					inserted,
					stored_size: pending.stored_size(),
				},
				eviction,
			))
		});

		match outcome {
			Ok((result, eviction)) => {
				self.report_eviction(eviction);
				Ok(result)
			}
			Err(err) => {
				self.report_failure(&err);
				Err(err)
			}
		}
	}

	/// Current footprint of all unpinned entries, the figure bounded by `maximum_cache_size`.
	pub fn cache_size(&self) -> Result<u64> {
		self.read(|conn| unpinned_footprint(conn, None))
	}

	pub fn entry_count(&self) -> Result<u64> {
		self.read(|conn| {
			let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
			Ok(count as u64)
		})
	}
}
