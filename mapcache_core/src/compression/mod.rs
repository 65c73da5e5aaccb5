//! # Compression
//!
//! Payloads are stored zlib-compressed when that actually saves space. The accounted size of an entry is
//! whatever ends up in the database, so compressible styles and vector tiles put less pressure on the cache
//! budget than already-compressed raster tiles of the same length.
//!
//! ```rust
//! use mapcache_core::{Blob, compression::*};
//!
//! let data = Blob::new_sized(1024);
//! let stored = StoredPayload::from_raw(&data)?;
//! assert!(stored.compressed);
//! assert!(stored.blob.len() < 64);
//! assert_eq!(stored.into_raw()?, data);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod zlib;

pub use zlib::*;

use crate::Blob;
use anyhow::Result;
use mapcache_derive::context;

/// A payload as it is kept in the database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredPayload {
	pub blob: Blob,
	pub compressed: bool,
}

impl StoredPayload {
	/// Compresses `raw` with zlib and keeps the compressed form only if it is strictly smaller.
	#[context("preparing payload ({} bytes) for storage", raw.len())]
	pub fn from_raw(raw: &Blob) -> Result<StoredPayload> {
		if raw.is_empty() {
			return Ok(StoredPayload {
				blob: Blob::new_empty(),
				compressed: false,
			});
		}
		let compressed = compress_zlib(raw)?;
		Ok(if compressed.len() < raw.len() {
			StoredPayload {
				blob: compressed,
				compressed: true,
			}
		} else {
			StoredPayload {
				blob: raw.clone(),
				compressed: false,
			}
		})
	}

	/// Number of bytes this payload occupies in storage.
	pub fn stored_size(&self) -> u64 {
		self.blob.len()
	}

	/// Restores the original bytes.
	#[context("restoring stored payload (compressed: {})", self.compressed)]
	pub fn into_raw(self) -> Result<Blob> {
		if self.compressed {
			decompress_zlib(&self.blob)
		} else {
			Ok(self.blob)
		}
	}
}
