use mapcache_core::RegionId;
use thiserror::Error;

/// Failures callers are expected to tell apart. They travel inside [`anyhow::Error`]; use
/// [`CacheError::find`] to recover them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
	#[error("Unable to make space for entry: {needed} bytes needed, budget is {budget} bytes")]
	Capacity { needed: u64, budget: u64 },

	#[error("unknown offline region {0}")]
	UnknownRegion(RegionId),
}

impl CacheError {
	/// Searches the error chain for a `CacheError`.
	pub fn find(err: &anyhow::Error) -> Option<&CacheError> {
		err.chain().find_map(|cause| cause.downcast_ref::<CacheError>())
	}
}
