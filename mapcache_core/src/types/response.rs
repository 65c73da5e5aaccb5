use crate::Blob;
use std::fmt::Display;
use time::OffsetDateTime;

/// Why a fetch failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorReason {
	NotFound,
	Server,
	Connection,
	RateLimit,
	Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseError {
	pub reason: ErrorReason,
	pub message: String,
}

impl Display for ResponseError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}: {}", self.reason, self.message)
	}
}

/// The outcome of fetching a resource, or what the cache returns for a hit.
///
/// Exactly one of `error`, `no_content`, `not_modified` or `data` describes the body. Timestamps have whole
/// second precision once they have been through the cache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
	pub error: Option<ResponseError>,
	pub no_content: bool,
	pub not_modified: bool,
	pub data: Option<Blob>,
	pub modified: Option<OffsetDateTime>,
	pub expires: Option<OffsetDateTime>,
	pub etag: Option<String>,
}

impl Response {
	pub fn from_data(data: impl Into<Blob>) -> Response {
		Response {
			data: Some(data.into()),
			..Default::default()
		}
	}

	/// A successful response that intentionally has no body.
	pub fn no_content() -> Response {
		Response {
			no_content: true,
			..Default::default()
		}
	}

	/// A revalidation answer: the cached body is still current.
	pub fn not_modified() -> Response {
		Response {
			not_modified: true,
			..Default::default()
		}
	}

	pub fn error(reason: ErrorReason, message: &str) -> Response {
		Response {
			error: Some(ResponseError {
				reason,
				message: message.to_string(),
			}),
			..Default::default()
		}
	}

	pub fn with_etag(mut self, etag: &str) -> Response {
		self.etag = Some(etag.to_string());
		self
	}

	pub fn with_expires(mut self, expires: OffsetDateTime) -> Response {
		self.expires = Some(expires);
		self
	}

	pub fn with_modified(mut self, modified: OffsetDateTime) -> Response {
		self.modified = Some(modified);
		self
	}

	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn constructors() {
		let response = Response::from_data("first").with_etag("abc");
		assert_eq!(response.data, Some(Blob::from("first")));
		assert_eq!(response.etag.as_deref(), Some("abc"));
		assert!(!response.is_error());

		assert!(Response::no_content().no_content);
		assert!(Response::not_modified().not_modified);

		let error = Response::error(ErrorReason::Server, "boom");
		assert!(error.is_error());
		assert_eq!(error.error.unwrap().to_string(), "Server: boom");
	}

	#[test]
	fn timestamps() {
		let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
		let response = Response::no_content().with_expires(at).with_modified(at);
		assert_eq!(response.expires, Some(at));
		assert_eq!(response.modified, Some(at));
	}
}
