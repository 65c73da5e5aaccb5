//! Helpers for tests, also used by the tests of dependent crates through the `test` feature.

use crate::Blob;
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Reproducible bytes that zlib cannot shrink.
pub fn random_data(size: usize) -> Blob {
	let mut data = vec![0u8; size];
	StdRng::seed_from_u64(size as u64).fill_bytes(&mut data);
	Blob::from(data)
}
