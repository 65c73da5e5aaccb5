//! A durable, size-bounded offline cache for map resources, stored in SQLite.
//!
//! [`OfflineDatabase`] combines three policies over one set of entries:
//! - opportunistic caching of fetched resources under a byte budget, with least recently used eviction,
//! - pinning of resources into offline regions, which eviction never touches,
//! - counting of hosted tiles pinned by regions, for quota enforcement by the caller.
//!
//! ```
//! use mapcache_core::{LatLngBounds, RegionDefinition, RegionMetadata, Resource, Response};
//! use mapcache_database::OfflineDatabase;
//!
//! let db = OfflineDatabase::builder().maximum_cache_size(10 * 1024 * 1024).build()?;
//! let definition = RegionDefinition::new(
//! 	"mapbox://styles/streets",
//! 	LatLngBounds::hull((37.66, -122.57), (37.83, -122.32))?,
//! 	0.0,
//! 	f64::INFINITY,
//! 	2.0,
//! )?;
//! let region = db.create_region(&definition, &RegionMetadata::from("San Francisco"))?;
//!
//! let tile = Resource::tile("mapbox://tiles/{z}/{x}/{y}.vector.pbf", 2.0, 163, 395, 10);
//! db.put_region_resource(region.id(), &tile, &Response::from_data("tile"))?;
//! assert_eq!(db.get_offline_mapbox_tile_count()?, 1);
//!
//! db.delete_region(region)?;
//! assert_eq!(db.get_offline_mapbox_tile_count()?, 0);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod builder;
mod database;
mod entry;
mod error;
mod events;
mod eviction;
mod regions;
mod schema;
mod usage;

pub use builder::*;
pub use database::{OfflineDatabase, PutResult};
pub use error::CacheError;
pub use events::{Event, EventBus, ListenerId};
pub use schema::{Location, SCHEMA_VERSION};

