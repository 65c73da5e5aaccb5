//! Least recently used eviction of unpinned entries.

use crate::{CacheError, entry::EntryId};
use anyhow::Result;
use log::trace;
use r2d2_sqlite::rusqlite::{Connection, params};

/// What an eviction pass removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Eviction {
	pub entries: u64,
	pub bytes: u64,
}

/// Sum of footprints of all unpinned entries except `exclude`.
pub(crate) fn unpinned_footprint(conn: &Connection, exclude: Option<EntryId>) -> Result<u64> {
	let sum: i64 = conn
		.prepare_cached(
			"SELECT COALESCE(SUM(footprint), 0) FROM entries e
			WHERE NOT EXISTS (SELECT 1 FROM region_entries r WHERE r.entry_id = e.id) AND e.id IS NOT ?1",
		)?
		.query_row(params![exclude], |row| row.get(0))?;
	Ok(sum as u64)
}

/// Removes least recently used unpinned entries until `incoming` more bytes fit into `budget`.
///
/// `exclude` is the entry about to be overwritten; its current footprint is not counted and it is never
/// removed. Nothing is deleted if enough room cannot be made, in which case [`CacheError::Capacity`] is
/// returned.
pub(crate) fn make_space(
	conn: &Connection,
	budget: u64,
	incoming: u64,
	exclude: Option<EntryId>,
) -> Result<Eviction> {
	let shortfall = CacheError::Capacity {
		needed: incoming,
		budget,
	};
	if incoming > budget {
		return Err(shortfall.into());
	}

	let used = unpinned_footprint(conn, exclude)?;
	if used + incoming <= budget {
		return Ok(Eviction::default());
	}
	let mut excess = used + incoming - budget;

	let mut statement = conn.prepare_cached(
		"SELECT id, footprint FROM entries e
		WHERE NOT EXISTS (SELECT 1 FROM region_entries r WHERE r.entry_id = e.id) AND e.id IS NOT ?1
		ORDER BY accessed, id",
	)?;
	let mut rows = statement.query(params![exclude])?;
	let mut victims: Vec<EntryId> = Vec::new();
	let mut freed = 0u64;
	while excess > 0 {
		let Some(row) = rows.next()? else {
			return Err(shortfall.into());
		};
		let footprint = row.get::<_, i64>(1)? as u64;
		victims.push(row.get(0)?);
		freed += footprint;
		excess = excess.saturating_sub(footprint);
	}
	drop(rows);

	let mut delete = conn.prepare_cached("DELETE FROM entries WHERE id = ?1")?;
	for id in &victims {
		delete.execute(params![id])?;
	}
	trace!("evicted {} entries ({freed} bytes)", victims.len());

	Ok(Eviction {
		entries: victims.len() as u64,
		bytes: freed,
	})
}
