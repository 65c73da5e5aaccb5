//! Value types shared by the mapcache crates: byte blobs, geographic bounds, resource descriptors, network
//! responses and offline region definitions, plus the zlib helpers used to store payloads.

pub mod compression;

pub mod types;
pub use types::*;

#[cfg(any(test, feature = "test"))]
pub mod test_utils;
