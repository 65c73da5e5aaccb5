use crate::Blob;
use anyhow::{Context, Result};
use flate2::{
	Compression,
	bufread::{ZlibDecoder, ZlibEncoder},
};
use mapcache_derive::context;
use std::io::Read;

/// Compresses data using zlib with the default level.
#[context("compressing blob ({} bytes) using zlib", blob.len())]
pub fn compress_zlib(blob: &Blob) -> Result<Blob> {
	let mut encoder = ZlibEncoder::new(blob.as_slice(), Compression::default());
	let mut compressed_data = Vec::new();
	encoder
		.read_to_end(&mut compressed_data)
		.context("failed to compress data using zlib")?;
	Ok(Blob::from(compressed_data))
}

/// Decompresses zlib data.
#[context("decompressing blob ({} bytes) using zlib", blob.len())]
pub fn decompress_zlib(blob: &Blob) -> Result<Blob> {
	let mut decoder = ZlibDecoder::new(blob.as_slice());
	let mut decompressed_data = Vec::new();
	decoder
		.read_to_end(&mut decompressed_data)
		.context("failed to decompress data using zlib")?;
	Ok(Blob::from(decompressed_data))
}
