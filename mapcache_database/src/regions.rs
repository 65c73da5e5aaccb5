//! Offline regions and their pinned resources.
//!
//! A region owns membership links in `region_entries`, never the entries themselves. Region-scoped puts add
//! links and never evict. Deleting a region removes its links (by cascade) and collects the hosted tiles no
//! other region links to; other entries it leaves unpinned become ordinary cache content again.

use crate::{
	CacheError, OfflineDatabase, PutResult,
	entry::{self, EntryId, PendingEntry},
	eviction::{Eviction, make_space},
};
use anyhow::Result;
use log::debug;
use mapcache_core::{
	LatLngBounds, OfflineRegion, RegionDefinition, RegionId, RegionMetadata, RegionStatus, Resource, Response,
};
use mapcache_derive::context;
use r2d2_sqlite::rusqlite::{Connection, OptionalExtension, Row, params};

const REGION_COLUMNS: &str = "id, style_url, south, west, north, east, min_zoom, max_zoom, pixel_ratio, metadata";

fn region_from_row(row: &Row<'_>) -> r2d2_sqlite::rusqlite::Result<OfflineRegion> {
	let definition = RegionDefinition {
		style_url: row.get(1)?,
		bounds: LatLngBounds {
			south: row.get(2)?,
			west: row.get(3)?,
			north: row.get(4)?,
			east: row.get(5)?,
		},
		min_zoom: row.get(6)?,
		// NULL stands for an unbounded zoom range
		max_zoom: row.get::<_, Option<f64>>(7)?.unwrap_or(f64::INFINITY),
		pixel_ratio: row.get::<_, f64>(8)? as f32,
	};
	Ok(OfflineRegion::new(
		row.get(0)?,
		definition,
		RegionMetadata::from(row.get::<_, Vec<u8>>(9)?),
	))
}

fn ensure_region(conn: &Connection, id: RegionId) -> Result<()> {
	let exists: bool = conn
		.prepare_cached("SELECT EXISTS (SELECT 1 FROM regions WHERE id = ?1)")?
		.query_row(params![id], |row| row.get(0))?;
	if exists {
		Ok(())
	} else {
		Err(CacheError::UnknownRegion(id).into())
	}
}

fn link(conn: &Connection, region_id: RegionId, entry_id: EntryId) -> Result<()> {
	conn
		.prepare_cached("INSERT OR IGNORE INTO region_entries (region_id, entry_id) VALUES (?1, ?2)")?
		.execute(params![region_id, entry_id])?;
	Ok(())
}

impl OfflineDatabase {
	#[context("creating offline region for '{}'", definition.style_url)]
	pub fn create_region(&self, definition: &RegionDefinition, metadata: &RegionMetadata) -> Result<OfflineRegion> {
		let bounds = &definition.bounds;
		let max_zoom = definition.max_zoom.is_finite().then_some(definition.max_zoom);
		let id = self.write_transaction(|tx| {
			tx.prepare_cached(
				"INSERT INTO regions (style_url, south, west, north, east, min_zoom, max_zoom, pixel_ratio, metadata)
				VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
			)?
			.execute(params![
				definition.style_url,
				bounds.south,
				bounds.west,
				bounds.north,
				bounds.east,
				definition.min_zoom,
				max_zoom,
				f64::from(definition.pixel_ratio),
				metadata.as_slice()
			])?;
			Ok(tx.last_insert_rowid())
		})?;
		debug!("created offline region {id}");
		Ok(OfflineRegion::new(id, definition.clone(), metadata.clone()))
	}

	/// All regions, ordered by id.
	#[context("listing offline regions")]
	pub fn list_regions(&self) -> Result<Vec<OfflineRegion>> {
		self.read(|conn| {
			let mut statement = conn.prepare_cached(&format!("SELECT {REGION_COLUMNS} FROM regions ORDER BY id"))?;
			let regions = statement
				.query_map([], region_from_row)?
				.collect::<Result<Vec<_>, _>>()?;
			Ok(regions)
		})
	}

	#[context("getting definition of offline region {id}")]
	pub fn get_region_definition(&self, id: RegionId) -> Result<RegionDefinition> {
		let region = self.read(|conn| {
			Ok(conn
				.prepare_cached(&format!("SELECT {REGION_COLUMNS} FROM regions WHERE id = ?1"))?
				.query_row(params![id], region_from_row)
				.optional()?)
		})?;
		match region {
			Some(region) => Ok(region.definition().clone()),
			None => Err(CacheError::UnknownRegion(id).into()),
		}
	}

	/// Replaces the metadata of a region and returns what is now stored.
	#[context("updating metadata of offline region {id}")]
	pub fn update_region_metadata(&self, id: RegionId, metadata: &RegionMetadata) -> Result<RegionMetadata> {
		self.write_transaction(|tx| {
			let changed = tx
				.prepare_cached("UPDATE regions SET metadata = ?2 WHERE id = ?1")?
				.execute(params![id, metadata.as_slice()])?;
			if changed == 0 {
				return Err(CacheError::UnknownRegion(id).into());
			}
			Ok(())
		})?;
		Ok(metadata.clone())
	}

	/// Deletes a region and its links. Hosted tiles that no other region links to are removed as well.
	#[context("deleting offline region {}", region.id())]
	pub fn delete_region(&self, region: OfflineRegion) -> Result<()> {
		let id = region.id();
		let (collected, eviction) = self.write_transaction(|tx| {
			ensure_region(tx, id)?;
			let hosted = tx
				.prepare_cached(
					"SELECT e.id FROM region_entries r JOIN entries e ON e.id = r.entry_id
					WHERE r.region_id = ?1 AND substr(e.url_template, 1, length(?2)) = ?2",
				)?
				.query_map(params![id, self.hosted_tile_prefix], |row| row.get::<_, EntryId>(0))?
				.collect::<Result<Vec<_>, _>>()?;

			tx.prepare_cached("DELETE FROM regions WHERE id = ?1")?
				.execute(params![id])?;

			let mut collect = tx.prepare_cached(
				"DELETE FROM entries WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM region_entries WHERE entry_id = ?1)",
			)?;
			let mut collected = 0;
			for entry_id in hosted {
				collected += collect.execute(params![entry_id])?;
			}

			// entries that lost their last link count against the budget again
			let eviction = match self.maximum_cache_size {
				Some(budget) => make_space(tx, budget, 0, None)?,
				None => Eviction::default(),
			};
			Ok((collected, eviction))
		})?;
		debug!("deleted offline region {id}, collected {collected} hosted tiles");
		self.report_eviction(eviction);
		Ok(())
	}

	/// Stores a response for a region: the entry is written without eviction and linked to the region.
	///
	/// An existing unscoped entry is updated in place and becomes pinned.
	#[context("putting resource '{}' into offline region {region_id}", resource.url)]
	pub fn put_region_resource(
		&self,
		region_id: RegionId,
		resource: &Resource,
		response: &Response,
	) -> Result<PutResult> {
		let pending = if response.is_error() {
			None
		} else {
			Some(PendingEntry::new(resource, response)?)
		};
		let key = resource.key();

		self.write_transaction(|tx| {
			ensure_region(tx, region_id)?;
			let Some(pending) = &pending else {
				debug!("not caching '{}' for region {region_id}", resource.url);
				return Ok(PutResult::default());
			};
			let existing = entry::find_id(tx, &key)?;

			if response.not_modified {
				if let Some(id) = existing {
					entry::refresh(tx, id, response)?;
					link(tx, region_id, id)?;
				}
				return Ok(PutResult::default());
			}

			let (id, inserted) = entry::write(tx, existing, pending)?;
			link(tx, region_id, id)?;
			Ok(PutResult {
				inserted,
				stored_size: pending.stored_size(),
			})
		})
	}

	/// Like [`get`](OfflineDatabase::get), and links a hit to the region.
	#[context("getting resource '{}' for offline region {region_id}", resource.url)]
	pub fn get_region_resource(&self, region_id: RegionId, resource: &Resource) -> Result<Option<Response>> {
		let key = resource.key();
		self.write_transaction(|tx| {
			ensure_region(tx, region_id)?;
			let found = entry::find_response(tx, &key)?;
			if let Some((id, _)) = &found {
				entry::touch(tx, *id)?;
				link(tx, region_id, *id)?;
			}
			Ok(found.map(|(_, response)| response))
		})
	}

	/// Stored size of a resource, linking it to the region when present. Recency is left alone.
	#[context("checking resource '{}' for offline region {region_id}", resource.url)]
	pub fn has_region_resource(&self, region_id: RegionId, resource: &Resource) -> Result<Option<u64>> {
		let key = resource.key();
		self.write_transaction(|tx| {
			ensure_region(tx, region_id)?;
			let found = entry::find_size(tx, &key)?;
			if let Some((id, _)) = found {
				link(tx, region_id, id)?;
			}
			Ok(found.map(|(_, size)| size))
		})
	}

	#[context("getting status of offline region {id}")]
	pub fn get_region_status(&self, id: RegionId) -> Result<RegionStatus> {
		self.read(|conn| {
			ensure_region(conn, id)?;
			let counts: (i64, i64, i64, i64) = conn
				.prepare_cached(
					"SELECT COUNT(*), COALESCE(SUM(e.size), 0), COUNT(e.url_template),
					COALESCE(SUM(CASE WHEN e.url_template IS NOT NULL THEN e.size ELSE 0 END), 0)
					FROM region_entries r JOIN entries e ON e.id = r.entry_id WHERE r.region_id = ?1",
				)?
				.query_row(params![id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?;
			Ok(RegionStatus {
				completed_resource_count: counts.0 as u64,
				completed_resource_size: counts.1 as u64,
				completed_tile_count: counts.2 as u64,
				completed_tile_size: counts.3 as u64,
			})
		})
	}
}
