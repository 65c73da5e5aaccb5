//! Offline region definitions and handles.

use crate::{Blob, LatLngBounds};
use anyhow::{Result, ensure};

/// Row id of a stored region.
pub type RegionId = i64;

/// Caller-owned opaque bytes attached to a region, typically a serialized name or settings object.
pub type RegionMetadata = Blob;

/// What a region covers: a style, a bounding box, a zoom range and a pixel ratio.
///
/// `max_zoom` may be `f64::INFINITY`, meaning "every zoom level the sources provide".
#[derive(Clone, Debug, PartialEq)]
pub struct RegionDefinition {
	pub style_url: String,
	pub bounds: LatLngBounds,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub pixel_ratio: f32,
}

impl RegionDefinition {
	pub fn new(
		style_url: &str,
		bounds: LatLngBounds,
		min_zoom: f64,
		max_zoom: f64,
		pixel_ratio: f32,
	) -> Result<RegionDefinition> {
		ensure!(min_zoom >= 0.0, "min_zoom must be >= 0, got {min_zoom}");
		ensure!(!max_zoom.is_nan(), "max_zoom must be a number");
		ensure!(
			max_zoom >= min_zoom,
			"max_zoom ({max_zoom}) must be >= min_zoom ({min_zoom})"
		);
		ensure!(pixel_ratio > 0.0, "pixel_ratio must be > 0, got {pixel_ratio}");
		Ok(RegionDefinition {
			style_url: style_url.to_string(),
			bounds,
			min_zoom,
			max_zoom,
			pixel_ratio,
		})
	}

	pub fn has_unbounded_zoom(&self) -> bool {
		self.max_zoom.is_infinite()
	}
}

/// A stored region. Handles are issued by the database and consumed when the region is deleted.
#[derive(Debug, PartialEq)]
pub struct OfflineRegion {
	id: RegionId,
	definition: RegionDefinition,
	metadata: RegionMetadata,
}

impl OfflineRegion {
	pub fn new(id: RegionId, definition: RegionDefinition, metadata: RegionMetadata) -> OfflineRegion {
		OfflineRegion {
			id,
			definition,
			metadata,
		}
	}

	pub fn id(&self) -> RegionId {
		self.id
	}

	pub fn definition(&self) -> &RegionDefinition {
		&self.definition
	}

	pub fn metadata(&self) -> &RegionMetadata {
		&self.metadata
	}
}

/// Download progress of a region, as far as the cache can tell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionStatus {
	/// Resources linked to the region.
	pub completed_resource_count: u64,
	/// Stored bytes of those resources.
	pub completed_resource_size: u64,
	/// Linked tiles.
	pub completed_tile_count: u64,
	/// Stored bytes of those tiles.
	pub completed_tile_size: u64,
}
