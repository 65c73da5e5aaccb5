//! Database file layout, open-time validation and transient failure handling.
//!
//! A file whose `user_version` does not match [`SCHEMA_VERSION`], that claims the current version without holding
//! its tables, that holds foreign tables without a version, or that is not an SQLite database at all, is removed
//! together with its `-wal`/`-shm` companions and recreated empty.

use crate::EventBus;
use anyhow::{Context, Result};
use log::{debug, trace, warn};
use mapcache_derive::context;
use r2d2::Pool;
use r2d2_sqlite::{
	SqliteConnectionManager,
	rusqlite::{Connection, ErrorCode, TransactionBehavior},
};
use std::{
	fs::remove_file,
	path::{Path, PathBuf},
	thread::sleep,
	time::Duration,
};

pub const SCHEMA_VERSION: i64 = 1;

pub(crate) const RESET_WARNING: &str = "Removing existing incompatible offline database";

const BUSY_TIMEOUT_MS: u32 = 5000;
const MAX_ATTEMPTS: u32 = 5;
const POOL_SIZE: u32 = 4;

const SCHEMA: &str = "
	CREATE TABLE entries (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		kind INTEGER NOT NULL,
		url TEXT NOT NULL,
		url_template TEXT,
		pixel_ratio INTEGER,
		x INTEGER,
		y INTEGER,
		z INTEGER,
		data BLOB,
		compressed INTEGER NOT NULL DEFAULT 0,
		no_content INTEGER NOT NULL DEFAULT 0,
		size INTEGER NOT NULL DEFAULT 0,
		footprint INTEGER NOT NULL DEFAULT 0,
		etag TEXT,
		expires INTEGER,
		modified INTEGER,
		accessed INTEGER NOT NULL
	);
	CREATE UNIQUE INDEX entries_url ON entries (url) WHERE url_template IS NULL;
	CREATE UNIQUE INDEX entries_tile ON entries (url_template, pixel_ratio, z, x, y) WHERE url_template IS NOT NULL;
	CREATE INDEX entries_accessed ON entries (accessed, id);
	CREATE TABLE regions (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		style_url TEXT NOT NULL,
		south REAL NOT NULL,
		west REAL NOT NULL,
		north REAL NOT NULL,
		east REAL NOT NULL,
		min_zoom REAL NOT NULL,
		max_zoom REAL,
		pixel_ratio REAL NOT NULL,
		metadata BLOB NOT NULL
	);
	CREATE TABLE region_entries (
		region_id INTEGER NOT NULL REFERENCES regions (id) ON DELETE CASCADE,
		entry_id INTEGER NOT NULL REFERENCES entries (id),
		UNIQUE (region_id, entry_id)
	);
	CREATE INDEX region_entries_entry ON region_entries (entry_id);
";

/// Where the database lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
	Memory,
	File(PathBuf),
}

/// Opens (and if necessary resets and initialises) the database and returns a connection pool.
#[context("opening offline database ({location:?})")]
pub(crate) fn open_pool(location: &Location, event_bus: &EventBus) -> Result<Pool<SqliteConnectionManager>> {
	let init = format!("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};");

	let pool = match location {
		Location::Memory => {
			// every in-memory connection is a separate database, so the pool must never replace its one connection
			let manager = SqliteConnectionManager::memory().with_init(move |conn| conn.execute_batch(&init));
			Pool::builder()
				.max_size(1)
				.idle_timeout(None)
				.max_lifetime(None)
				.build(manager)?
		}
		Location::File(path) => {
			if path.exists() && !is_compatible(path) {
				warn!("{RESET_WARNING} '{}'", path.display());
				event_bus.warn(format!("{RESET_WARNING} '{}'", path.display()));
				remove_database_files(path)?;
			}
			let init = format!("{init} PRAGMA journal_mode = WAL;");
			let manager = SqliteConnectionManager::file(path).with_init(move |conn| conn.execute_batch(&init));
			Pool::builder().max_size(POOL_SIZE).build(manager)?
		}
	};

	with_retry(|| {
		let mut conn = pool.get()?;
		initialize(&mut conn)
	})?;
	debug!("opened offline database ({location:?})");
	Ok(pool)
}

/// Whether `path` is an SQLite file that is either empty or carries the complete current schema.
fn is_compatible(path: &Path) -> bool {
	let inspected = Connection::open(path).and_then(|conn| {
		conn.busy_timeout(Duration::from_millis(u64::from(BUSY_TIMEOUT_MS)))?;
		let version = conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))?;
		let tables = conn.query_row(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
			[],
			|row| row.get::<_, i64>(0),
		)?;
		let known = conn.query_row(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('entries', 'regions', 'region_entries')",
			[],
			|row| row.get::<_, i64>(0),
		)?;
		Ok((version, tables, known))
	});
	match inspected {
		Ok((0, tables, _)) => tables == 0,
		Ok((version, _, known)) => version == SCHEMA_VERSION && known == 3,
		Err(err) => {
			debug!("cannot read '{}': {err}", path.display());
			false
		}
	}
}

#[context("removing database files at '{}'", path.display())]
fn remove_database_files(path: &Path) -> Result<()> {
	remove_file(path)?;
	for suffix in ["-wal", "-shm"] {
		let mut companion = path.as_os_str().to_owned();
		companion.push(suffix);
		let companion = PathBuf::from(companion);
		if companion.exists() {
			remove_file(&companion)?;
		}
	}
	Ok(())
}

/// Creates the tables of an empty database. Does nothing if the schema is already in place.
#[context("initialising schema")]
fn initialize(conn: &mut Connection) -> Result<()> {
	let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
	let version: i64 = tx.query_row("PRAGMA user_version", [], |row| row.get(0))?;
	if version == 0 {
		trace!("creating schema version {SCHEMA_VERSION}");
		tx.execute_batch(SCHEMA)?;
		tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
	}
	tx.commit()?;
	Ok(())
}

/// Whether `err` was caused by another connection holding a lock.
pub(crate) fn is_transient(err: &anyhow::Error) -> bool {
	err.chain().any(|cause| {
		cause
			.downcast_ref::<r2d2_sqlite::rusqlite::Error>()
			.and_then(|err| err.sqlite_error_code())
			.is_some_and(|code| matches!(code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked))
	})
}

/// Runs `operation`, retrying a bounded number of times while the database is busy or locked.
pub(crate) fn with_retry<T, F>(mut operation: F) -> Result<T>
where
	F: FnMut() -> Result<T>,
{
	let mut attempt = 1;
	loop {
		match operation() {
			Err(err) if attempt < MAX_ATTEMPTS && is_transient(&err) => {
				trace!("database busy (attempt {attempt}/{MAX_ATTEMPTS}): {err:#}");
				sleep(Duration::from_millis(10 << attempt));
				attempt += 1;
			}
			result => return result.context("accessing offline database"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::events::tests::{record, warnings};
	use assert_fs::TempDir;
	use r2d2_sqlite::rusqlite::ffi;
	use std::{cell::Cell, fs};

	fn user_version(path: &Path) -> i64 {
		Connection::open(path)
			.unwrap()
			.query_row("PRAGMA user_version", [], |row| row.get(0))
			.unwrap()
	}

	#[test]
	fn creates_schema() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("cache.db");
		let bus = EventBus::new();
		let events = record(&bus);

		let pool = open_pool(&Location::File(path.clone()), &bus)?;
		let tables: i64 = pool.get()?.query_row(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('entries', 'regions', 'region_entries')",
			[],
			|row| row.get(0),
		)?;
		assert_eq!(tables, 3);
		drop(pool);

		assert_eq!(user_version(&path), SCHEMA_VERSION);
		assert!(warnings(&events).is_empty());
		Ok(())
	}

	#[test]
	fn reopening_keeps_data() -> Result<()> {
		let dir = TempDir::new()?;
		let location = Location::File(dir.path().join("cache.db"));
		let bus = EventBus::new();
		let events = record(&bus);

		open_pool(&location, &bus)?.get()?.execute(
			"INSERT INTO entries (kind, url, accessed) VALUES (1, 'http://example.com/', 1)",
			[],
		)?;
		let count: i64 = open_pool(&location, &bus)?
			.get()?
			.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
		assert_eq!(count, 1);
		assert!(warnings(&events).is_empty());
		Ok(())
	}

	#[test]
	fn resets_other_schema_version() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("cache.db");
		{
			let conn = Connection::open(&path)?;
			conn.execute_batch("CREATE TABLE legacy (id INTEGER); PRAGMA user_version = 7;")?;
		}
		let bus = EventBus::new();
		let events = record(&bus);

		let pool = open_pool(&Location::File(path.clone()), &bus)?;
		let legacy: i64 = pool.get()?.query_row(
			"SELECT COUNT(*) FROM sqlite_master WHERE name = 'legacy'",
			[],
			|row| row.get(0),
		)?;
		assert_eq!(legacy, 0);
		drop(pool);

		assert_eq!(user_version(&path), SCHEMA_VERSION);
		let warnings = warnings(&events);
		assert_eq!(warnings.len(), 1);
		assert!(warnings[0].starts_with(RESET_WARNING));
		Ok(())
	}

	fn assert_reset_once(path: &Path, events: &std::sync::Mutex<Vec<crate::Event>>) {
		assert_eq!(user_version(path), SCHEMA_VERSION);
		let warnings = warnings(events);
		assert_eq!(warnings.len(), 1, "{warnings:?}");
		assert!(warnings[0].starts_with(RESET_WARNING));
	}

	#[test]
	fn resets_current_version_without_tables() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("cache.db");
		Connection::open(&path)?.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
		let bus = EventBus::new();
		let events = record(&bus);

		let pool = open_pool(&Location::File(path.clone()), &bus)?;
		pool.get()?.execute(
			"INSERT INTO entries (kind, url, accessed) VALUES (1, 'http://example.com/', 1)",
			[],
		)?;
		drop(pool);

		assert_reset_once(&path, &events);
		Ok(())
	}

	#[test]
	fn resets_unversioned_foreign_tables() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("cache.db");
		Connection::open(&path)?.execute_batch("CREATE TABLE entries (id INTEGER, payload BLOB);")?;
		let bus = EventBus::new();
		let events = record(&bus);

		let pool = open_pool(&Location::File(path.clone()), &bus)?;
		let columns: i64 =
			pool.get()?.query_row("SELECT COUNT(*) FROM pragma_table_info('entries')", [], |row| row.get(0))?;
		assert_eq!(columns, 17);
		drop(pool);

		assert_reset_once(&path, &events);
		Ok(())
	}

	#[test]
	fn keeps_empty_file() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("cache.db");
		drop(Connection::open(&path)?);
		let bus = EventBus::new();
		let events = record(&bus);

		drop(open_pool(&Location::File(path.clone()), &bus)?);
		assert_eq!(user_version(&path), SCHEMA_VERSION);
		assert!(warnings(&events).is_empty());
		Ok(())
	}

	#[test]
	fn resets_invalid_file() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("cache.db");
		fs::write(&path, "this is an invalid file")?;
		let bus = EventBus::new();
		let events = record(&bus);

		drop(open_pool(&Location::File(path.clone()), &bus)?);

		assert_eq!(user_version(&path), SCHEMA_VERSION);
		assert_eq!(warnings(&events).len(), 1);
		Ok(())
	}

	#[test]
	fn memory_pool_keeps_its_database() -> Result<()> {
		let pool = open_pool(&Location::Memory, &EventBus::new())?;
		pool.get()?.execute(
			"INSERT INTO entries (kind, url, accessed) VALUES (1, 'http://example.com/', 1)",
			[],
		)?;
		let count: i64 = pool.get()?.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
		assert_eq!(count, 1);
		Ok(())
	}

	#[test]
	fn foreign_keys_are_enforced() -> Result<()> {
		let pool = open_pool(&Location::Memory, &EventBus::new())?;
		let conn = pool.get()?;
		let result = conn.execute("INSERT INTO region_entries (region_id, entry_id) VALUES (1, 1)", []);
		assert!(result.is_err());
		Ok(())
	}

	fn busy_error() -> anyhow::Error {
		r2d2_sqlite::rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None).into()
	}

	#[test]
	fn retries_busy_errors() -> Result<()> {
		let calls = Cell::new(0);
		let value = with_retry(|| {
			calls.set(calls.get() + 1);
			if calls.get() < 3 { Err(busy_error()) } else { Ok(42) }
		})?;
		assert_eq!(value, 42);
		assert_eq!(calls.get(), 3);
		Ok(())
	}

	#[test]
	fn gives_up_after_max_attempts() {
		let calls = Cell::new(0);
		let result: Result<()> = with_retry(|| {
			calls.set(calls.get() + 1);
			Err(busy_error().context("writing entry"))
		});
		assert!(is_transient(&result.unwrap_err()));
		assert_eq!(calls.get(), MAX_ATTEMPTS);
	}

	#[test]
	fn does_not_retry_other_errors() {
		let calls = Cell::new(0);
		let result: Result<()> = with_retry(|| {
			calls.set(calls.get() + 1);
			Err(anyhow::anyhow!("no such table"))
		});
		assert!(result.is_err());
		assert_eq!(calls.get(), 1);
	}
}
