//! Row-level access to the `entries` table.

use anyhow::Result;
use log::trace;
use mapcache_core::{Blob, Resource, ResourceKey, Response, compression::StoredPayload};
use mapcache_derive::context;
use r2d2_sqlite::rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;

pub(crate) type EntryId = i64;

const NEXT_ACCESSED: &str = "(SELECT COALESCE(MAX(accessed), 0) + 1 FROM entries)";

/// A resource about to be written, with its payload already prepared for storage.
pub(crate) struct PendingEntry<'a> {
	pub resource: &'a Resource,
	pub key: ResourceKey,
	pub response: &'a Response,
	pub payload: Option<StoredPayload>,
}

impl<'a> PendingEntry<'a> {
	#[context("preparing entry for '{}'", resource.url)]
	pub fn new(resource: &'a Resource, response: &'a Response) -> Result<PendingEntry<'a>> {
		let payload = match (&response.data, response.no_content) {
			(Some(data), false) => Some(StoredPayload::from_raw(data)?),
			_ => None,
		};
		Ok(PendingEntry {
			resource,
			key: resource.key(),
			response,
			payload,
		})
	}

	pub fn stored_size(&self) -> u64 {
		self.payload.as_ref().map_or(0, StoredPayload::stored_size)
	}

	/// Bytes this entry counts against the cache budget.
	pub fn footprint(&self) -> u64 {
		self.stored_size() + self.key.encoded_len()
	}
}

/// Runs a single-row query against the entry identified by `key`.
fn lookup<T, F>(conn: &Connection, columns: &str, key: &ResourceKey, map: F) -> Result<Option<T>>
where
	F: FnOnce(&Row<'_>) -> r2d2_sqlite::rusqlite::Result<T>,
{
	Ok(match key {
		ResourceKey::Url(url) => conn
			.prepare_cached(&format!(
				"SELECT {columns} FROM entries WHERE url_template IS NULL AND url = ?1"
			))?
			.query_row(params![url], map)
			.optional()?,
		ResourceKey::Tile(tile) => conn
			.prepare_cached(&format!(
				"SELECT {columns} FROM entries WHERE url_template = ?1 AND pixel_ratio = ?2 AND z = ?3 AND x = ?4 AND y = ?5"
			))?
			.query_row(
				params![tile.url_template, tile.pixel_ratio, tile.z, tile.x, tile.y],
				map,
			)
			.optional()?,
	})
}

pub(crate) fn find_id(conn: &Connection, key: &ResourceKey) -> Result<Option<EntryId>> {
	lookup(conn, "id", key, |row| row.get(0))
}

/// Stored size of the entry, if present.
pub(crate) fn find_size(conn: &Connection, key: &ResourceKey) -> Result<Option<(EntryId, u64)>> {
	lookup(conn, "id, size", key, |row| {
		Ok((row.get(0)?, row.get::<_, i64>(1)? as u64))
	})
}

/// Reads the entry identified by `key` back into a response.
#[context("reading entry '{key}'")]
pub(crate) fn find_response(conn: &Connection, key: &ResourceKey) -> Result<Option<(EntryId, Response)>> {
	let row = lookup(
		conn,
		"id, data, compressed, no_content, etag, expires, modified",
		key,
		|row| {
			Ok((
				row.get::<_, EntryId>(0)?,
				row.get::<_, Option<Vec<u8>>>(1)?,
				row.get::<_, bool>(2)?,
				row.get::<_, bool>(3)?,
				row.get::<_, Option<String>>(4)?,
				row.get::<_, Option<i64>>(5)?,
				row.get::<_, Option<i64>>(6)?,
			))
		},
	)?;
	let Some((id, data, compressed, no_content, etag, expires, modified)) = row else {
		return Ok(None);
	};

	let data = match data {
		Some(data) if !no_content => Some(
			StoredPayload {
				blob: Blob::from(data),
				compressed,
			}
			.into_raw()?,
		),
		_ => None,
	};
	Ok(Some((
		id,
		Response {
			error: None,
			no_content,
			not_modified: false,
			data,
			modified: from_timestamp(modified)?,
			expires: from_timestamp(expires)?,
			etag,
		},
	)))
}

/// Marks the entry as the most recently used one.
pub(crate) fn touch(conn: &Connection, id: EntryId) -> Result<()> {
	conn
		.prepare_cached(&format!("UPDATE entries SET accessed = {NEXT_ACCESSED} WHERE id = ?1"))?
		.execute(params![id])?;
	Ok(())
}

/// Applies a 304 answer: the payload stays, recency and validation metadata are refreshed.
pub(crate) fn refresh(conn: &Connection, id: EntryId, response: &Response) -> Result<()> {
	conn
		.prepare_cached(&format!(
			"UPDATE entries SET accessed = {NEXT_ACCESSED}, expires = ?2, etag = COALESCE(?3, etag) WHERE id = ?1"
		))?
		.execute(params![id, to_timestamp(response.expires), response.etag])?;
	Ok(())
}

/// Inserts the entry or updates `existing` in place. Returns `true` for an insert.
#[context("writing entry '{}'", entry.key)]
pub(crate) fn write(conn: &Connection, existing: Option<EntryId>, entry: &PendingEntry) -> Result<(EntryId, bool)> {
	let response = entry.response;
	let (data, compressed) = match &entry.payload {
		Some(payload) => (Some(payload.blob.as_slice()), payload.compressed),
		None => (None, false),
	};
	let kind = entry.resource.kind.to_i64();
	let size = entry.stored_size() as i64;
	let footprint = entry.footprint() as i64;
	let expires = to_timestamp(response.expires);
	let modified = to_timestamp(response.modified);

	if let Some(id) = existing {
		trace!("updating entry {id} ({size} bytes)");
		conn
			.prepare_cached(&format!(
				"UPDATE entries SET kind = ?2, url = ?3, data = ?4, compressed = ?5, no_content = ?6, size = ?7,
				footprint = ?8, etag = ?9, expires = ?10, modified = ?11, accessed = {NEXT_ACCESSED} WHERE id = ?1"
			))?
			.execute(params![
				id,
				kind,
				entry.resource.url,
				data,
				compressed,
				response.no_content,
				size,
				footprint,
				response.etag,
				expires,
				modified
			])?;
		return Ok((id, false));
	}

	let (url_template, pixel_ratio, x, y, z) = match &entry.key {
		ResourceKey::Tile(tile) => (
			Some(tile.url_template.as_str()),
			Some(tile.pixel_ratio),
			Some(tile.x),
			Some(tile.y),
			Some(tile.z),
		),
		ResourceKey::Url(_) => (None, None, None, None, None),
	};
	trace!("inserting entry '{}' ({size} bytes)", entry.key);
	conn
		.prepare_cached(&format!(
			"INSERT INTO entries (kind, url, url_template, pixel_ratio, x, y, z, data, compressed, no_content, size,
			footprint, etag, expires, modified, accessed)
			VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, {NEXT_ACCESSED})"
		))?
		.execute(params![
			kind,
			entry.resource.url,
			url_template,
			pixel_ratio,
			x,
			y,
			z,
			data,
			compressed,
			response.no_content,
			size,
			footprint,
			response.etag,
			expires,
			modified
		])?;
	Ok((conn.last_insert_rowid(), true))
}

pub(crate) fn is_pinned(conn: &Connection, id: EntryId) -> Result<bool> {
	Ok(conn
		.prepare_cached("SELECT EXISTS (SELECT 1 FROM region_entries WHERE entry_id = ?1)")?
		.query_row(params![id], |row| row.get(0))?)
}

fn to_timestamp(value: Option<OffsetDateTime>) -> Option<i64> {
	value.map(OffsetDateTime::unix_timestamp)
}

fn from_timestamp(value: Option<i64>) -> Result<Option<OffsetDateTime>> {
	Ok(value.map(OffsetDateTime::from_unix_timestamp).transpose()?)
}
