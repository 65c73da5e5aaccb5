//! This module provides the [`Blob`] struct, a wrapper around [`Vec<u8>`] used for every payload that passes
//! through the cache: raw response bodies, compressed database values and region metadata.
//!
//! # Examples
//!
//! ```rust
//! use mapcache_core::Blob;
//!
//! let blob = Blob::from("first");
//! assert_eq!(blob.len(), 5);
//! assert_eq!(blob.as_str(), "first");
//! assert_eq!(blob.into_vec(), b"first".to_vec());
//! ```

use std::fmt::Debug;

/// A simple wrapper around [`Vec<u8>`] that provides additional methods for working with byte data.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob`.
	///
	/// ```rust
	/// use mapcache_core::Blob;
	///
	/// let empty_blob = Blob::new_empty();
	/// assert!(empty_blob.is_empty());
	/// ```
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	/// Creates a `Blob` of `length` zero bytes.
	///
	/// ```rust
	/// use mapcache_core::Blob;
	///
	/// let blob = Blob::new_sized(3);
	/// assert_eq!(blob.as_slice(), &[0, 0, 0]);
	/// ```
	#[must_use]
	pub fn new_sized(length: usize) -> Blob {
		Blob(vec![0u8; length])
	}

	/// Returns a reference to the underlying byte slice.
	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		self.0.as_ref()
	}

	/// Consumes this [`Blob`] and returns the underlying `Vec<u8>`.
	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Returns the bytes as a string slice. Invalid UTF-8 yields an empty string.
	///
	/// ```rust
	/// use mapcache_core::Blob;
	///
	/// assert_eq!(Blob::from("Xylofön").as_str(), "Xylofön");
	/// assert_eq!(Blob::from(&[0xff, 0xfe]).as_str(), "");
	/// ```
	#[must_use]
	pub fn as_str(&self) -> &str {
		std::str::from_utf8(&self.0).unwrap_or_default()
	}

	/// Returns a lossy string view, useful for printing payloads of unknown encoding.
	#[must_use]
	pub fn to_string_lossy(&self) -> String {
		String::from_utf8_lossy(&self.0).into_owned()
	}

	/// Returns the length in bytes.
	#[must_use]
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	/// Returns `true` if the blob holds no bytes.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for Blob {
	fn from(item: Vec<u8>) -> Self {
		Blob(item)
	}
}

impl From<&[u8]> for Blob {
	fn from(item: &[u8]) -> Self {
		Blob(item.to_vec())
	}
}

impl<const N: usize> From<&[u8; N]> for Blob {
	fn from(item: &[u8; N]) -> Self {
		Blob(item.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(item: &str) -> Self {
		Blob(item.as_bytes().to_vec())
	}
}

impl From<String> for Blob {
	fn from(item: String) -> Self {
		Blob(item.into_bytes())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		const PREVIEW: usize = 16;
		let head = &self.0[..self.0.len().min(PREVIEW)];
		let hex = head.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ");
		if self.0.len() > PREVIEW {
			write!(f, "Blob({} bytes: {hex} ...)", self.0.len())
		} else {
			write!(f, "Blob({} bytes: {hex})", self.0.len())
		}
	}
}
