use anyhow::{Result, ensure};
use std::fmt::Debug;

/// A geographic rectangle in degrees, as used by offline region definitions.
///
/// ```
/// use mapcache_core::LatLngBounds;
///
/// let bounds = LatLngBounds::hull((3.0, 4.0), (1.0, 2.0)).unwrap();
/// assert_eq!((bounds.south, bounds.west, bounds.north, bounds.east), (1.0, 2.0, 3.0, 4.0));
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct LatLngBounds {
	pub south: f64,
	pub west: f64,
	pub north: f64,
	pub east: f64,
}

impl LatLngBounds {
	/// Creates bounds from `south, west, north, east`.
	pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<LatLngBounds> {
		LatLngBounds {
			south,
			west,
			north,
			east,
		}
		.checked()
	}

	/// The smallest bounds containing both `(lat, lng)` points, in any order.
	pub fn hull(a: (f64, f64), b: (f64, f64)) -> Result<LatLngBounds> {
		LatLngBounds::new(a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
	}

	fn checked(self) -> Result<Self> {
		ensure!(
			self.south >= -90. && self.north <= 90.,
			"latitudes must be within [-90, 90], got {} and {}",
			self.south,
			self.north
		);
		ensure!(
			self.west >= -180. && self.east <= 180.,
			"longitudes must be within [-180, 180], got {} and {}",
			self.west,
			self.east
		);
		ensure!(
			self.south <= self.north,
			"south ({}) must be <= north ({})",
			self.south,
			self.north
		);
		ensure!(
			self.west <= self.east,
			"west ({}) must be <= east ({})",
			self.west,
			self.east
		);
		Ok(self)
	}
}

impl Debug for LatLngBounds {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"LatLngBounds({}, {}, {}, {})",
			self.south, self.west, self.north, self.east
		)
	}
}
