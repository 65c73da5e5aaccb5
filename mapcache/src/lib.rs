//! # mapcache
//!
//! A durable offline cache for map resources: styles, tiles, sprites and glyph ranges fetched from the
//! network are kept in one SQLite file under a byte budget, and offline regions pin the resources they need
//! so that eviction never touches them.
//!
//! This crate bundles the building blocks and the YAML configuration used by the `mapcache` command-line tool:
//! - [`core`]: value types (resources, responses, region definitions) and payload compression
//! - [`database`]: the [`OfflineDatabase`](database::OfflineDatabase) itself
//! - [`config`]: settings for opening a database
//!
//! ## Usage Example
//!
//! ```rust
//! use mapcache::{config::Config, core::*};
//!
//! let config = Config::from_string("maximum_cache_size: 1048576")?;
//! let db = config.database_builder().build()?;
//!
//! let glyphs = Resource::glyphs("https://example.com/fonts/{fontstack}/{range}.pbf", "Noto Sans", (0, 255));
//! db.put(&glyphs, &Response::from_data(vec![0u8; 2048]))?;
//! assert!(db.cache_size()? < 1024);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;

pub use mapcache_core as core;
pub use mapcache_database as database;
