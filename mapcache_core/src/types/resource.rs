//! Resource descriptors and their canonical cache identity.
//!
//! A [`Resource`] is what a caller asks for: a kind, the URL that would be fetched and, for tiles, the
//! [`TileData`] it was built from. The cache never stores by URL alone for tiles: two requests built from the
//! same template and coordinates share one entry even when their constructed URLs differ (for example a
//! different `{prefix}` expansion or an access token appended by the caller). [`Resource::key`] returns that
//! identity as a [`ResourceKey`].

#[cfg(feature = "cli")]
use clap::ValueEnum;
use std::fmt::Display;

/// The kind of a cacheable resource. The discriminants are persisted and must not change.
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
	#[default]
	Unknown,
	Style,
	Source,
	Tile,
	Glyphs,
	SpriteImage,
	#[cfg_attr(feature = "cli", value(name = "sprite-json"))]
	SpriteJSON,
}

impl ResourceKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ResourceKind::Unknown => "unknown",
			ResourceKind::Style => "style",
			ResourceKind::Source => "source",
			ResourceKind::Tile => "tile",
			ResourceKind::Glyphs => "glyphs",
			ResourceKind::SpriteImage => "sprite-image",
			ResourceKind::SpriteJSON => "sprite-json",
		}
	}

	pub fn to_i64(self) -> i64 {
		self as i64
	}
}

impl Display for ResourceKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Canonical identity of a tile: the template it was expanded from plus its coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileData {
	pub url_template: String,
	pub pixel_ratio: u8,
	pub x: u32,
	pub y: u32,
	pub z: u8,
}

/// The key an entry is stored under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
	Url(String),
	Tile(TileData),
}

impl ResourceKey {
	/// Byte length of the identity as stored: the URL, or the template plus the packed ratio and coordinates.
	pub fn encoded_len(&self) -> u64 {
		match self {
			ResourceKey::Url(url) => url.len() as u64,
			ResourceKey::Tile(tile) => tile.url_template.len() as u64 + 10,
		}
	}
}

impl Display for ResourceKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ResourceKey::Url(url) => f.write_str(url),
			ResourceKey::Tile(t) => write!(f, "{} @{}x {}/{}/{}", t.url_template, t.pixel_ratio, t.z, t.x, t.y),
		}
	}
}

/// A request for a single cacheable resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
	pub kind: ResourceKind,
	pub url: String,
	pub tile_data: Option<TileData>,
}

impl Resource {
	/// A resource of `kind` identified by its URL.
	pub fn new(kind: ResourceKind, url: &str) -> Resource {
		Resource {
			kind,
			url: url.to_string(),
			tile_data: None,
		}
	}

	pub fn style(url: &str) -> Resource {
		Resource::new(ResourceKind::Style, url)
	}

	pub fn source(url: &str) -> Resource {
		Resource::new(ResourceKind::Source, url)
	}

	pub fn sprite_image(base: &str, pixel_ratio: f32) -> Resource {
		Resource::new(
			ResourceKind::SpriteImage,
			&format!("{base}{}.png", ratio_suffix(pixel_ratio)),
		)
	}

	pub fn sprite_json(base: &str, pixel_ratio: f32) -> Resource {
		Resource::new(
			ResourceKind::SpriteJSON,
			&format!("{base}{}.json", ratio_suffix(pixel_ratio)),
		)
	}

	/// A glyph range request; `range` is the inclusive `(first, last)` code point span.
	pub fn glyphs(url_template: &str, font_stack: &str, range: (u16, u16)) -> Resource {
		let url = replace_tokens(url_template, |token| match token {
			"fontstack" => font_stack.to_string(),
			"range" => format!("{}-{}", range.0, range.1),
			_ => String::new(),
		});
		Resource::new(ResourceKind::Glyphs, &url)
	}

	/// A tile request expanded from `url_template`.
	///
	/// The pixel ratio only becomes part of the identity when the template contains `{ratio}`; otherwise
	/// the same bytes are served for every ratio and the entry is shared.
	///
	/// ```
	/// use mapcache_core::Resource;
	///
	/// let tile = Resource::tile("mapbox://tiles/{z}/{x}/{y}{ratio}.png", 2.0, 3, 5, 4);
	/// assert_eq!(tile.url, "mapbox://tiles/4/3/5@2x.png");
	/// assert_eq!(tile.tile_data.unwrap().pixel_ratio, 2);
	/// ```
	pub fn tile(url_template: &str, pixel_ratio: f32, x: u32, y: u32, z: u8) -> Resource {
		let supports_ratio = url_template.contains("{ratio}");
		let url = replace_tokens(url_template, |token| match token {
			"z" => z.to_string(),
			"x" => x.to_string(),
			"y" => y.to_string(),
			"prefix" => format!("{:x}{:x}", x % 16, y % 16),
			"ratio" => ratio_suffix(pixel_ratio).to_string(),
			_ => String::new(),
		});
		Resource {
			kind: ResourceKind::Tile,
			url,
			tile_data: Some(TileData {
				url_template: url_template.to_string(),
				pixel_ratio: if supports_ratio && pixel_ratio > 1.0 { 2 } else { 1 },
				x,
				y,
				z,
			}),
		}
	}

	/// The identity this resource is stored under.
	pub fn key(&self) -> ResourceKey {
		match (&self.kind, &self.tile_data) {
			(ResourceKind::Tile, Some(tile)) => ResourceKey::Tile(tile.clone()),
			_ => ResourceKey::Url(self.url.clone()),
		}
	}
}

fn ratio_suffix(pixel_ratio: f32) -> &'static str {
	if pixel_ratio > 1.0 { "@2x" } else { "" }
}

/// Replaces every `{token}` in `template`. An unterminated `{` is copied verbatim.
fn replace_tokens<F>(template: &str, lookup: F) -> String
where
	F: Fn(&str) -> String,
{
	let mut result = String::with_capacity(template.len());
	let mut rest = template;
	while let Some(start) = rest.find('{') {
		result.push_str(&rest[..start]);
		match rest[start..].find('}') {
			Some(len) => {
				result.push_str(&lookup(&rest[start + 1..start + len]));
				rest = &rest[start + len + 1..];
			}
			None => {
				rest = &rest[start..];
				break;
			}
		}
	}
	result.push_str(rest);
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case("http://example.com/{z}/{x}/{y}.pbf", 1.0, "http://example.com/6/10/20.pbf")]
	#[case("http://{prefix}.example.com/{z}/{x}/{y}.pbf", 1.0, "http://a4.example.com/6/10/20.pbf")]
	#[case("http://example.com/{z}/{x}/{y}{ratio}.png", 2.0, "http://example.com/6/10/20@2x.png")]
	#[case("http://example.com/{z}/{x}/{y}{ratio}.png", 1.0, "http://example.com/6/10/20.png")]
	#[case("http://example.com/{z}/{x}/{y}.png?{unknown}", 1.0, "http://example.com/6/10/20.png?")]
	#[case("http://example.com/{z", 1.0, "http://example.com/{z")]
	fn tile_urls(#[case] template: &str, #[case] ratio: f32, #[case] url: &str) {
		assert_eq!(Resource::tile(template, ratio, 10, 20, 6).url, url);
	}

	#[test]
	fn tile_identity_ignores_url() {
		let a = Resource::tile("mapbox://tiles/{z}/{x}/{y}.pbf", 1.0, 1, 2, 3);
		let mut b = a.clone();
		b.url.push_str("?access_token=secret");
		assert_ne!(a.url, b.url);
		assert_eq!(a.key(), b.key());
	}

	#[test]
	fn pixel_ratio_only_counts_with_ratio_token() {
		let plain1 = Resource::tile("http://example.com/{z}/{x}/{y}.pbf", 1.0, 0, 0, 0);
		let plain2 = Resource::tile("http://example.com/{z}/{x}/{y}.pbf", 2.0, 0, 0, 0);
		assert_eq!(plain1.key(), plain2.key());

		let retina1 = Resource::tile("http://example.com/{z}/{x}/{y}{ratio}.png", 1.0, 0, 0, 0);
		let retina2 = Resource::tile("http://example.com/{z}/{x}/{y}{ratio}.png", 2.0, 0, 0, 0);
		assert_ne!(retina1.key(), retina2.key());
	}

	#[test]
	fn non_tiles_key_on_url() {
		assert_eq!(
			Resource::style("http://example.com/").key(),
			ResourceKey::Url("http://example.com/".to_string())
		);
		// a kind mismatch does not split the entry
		assert_eq!(
			Resource::source("http://example.com/").key(),
			Resource::style("http://example.com/").key()
		);
	}

	#[test]
	fn sprites_and_glyphs() {
		assert_eq!(
			Resource::sprite_image("http://example.com/sprite", 2.0).url,
			"http://example.com/sprite@2x.png"
		);
		assert_eq!(
			Resource::sprite_json("http://example.com/sprite", 1.0).url,
			"http://example.com/sprite.json"
		);
		let glyphs = Resource::glyphs("http://example.com/{fontstack}/{range}.pbf", "Open Sans", (256, 511));
		assert_eq!(glyphs.url, "http://example.com/Open Sans/256-511.pbf");
		assert_eq!(glyphs.kind, ResourceKind::Glyphs);
	}

	#[test]
	fn kind_codes() {
		assert_eq!(ResourceKind::Unknown.to_i64(), 0);
		assert_eq!(ResourceKind::SpriteJSON.to_i64(), 6);
		assert_eq!(ResourceKind::SpriteJSON.to_string(), "sprite-json");
	}

	#[test]
	fn keys_are_ordered() {
		let mut keys = vec![
			Resource::tile("b", 1.0, 0, 0, 1).key(),
			Resource::style("z").key(),
			Resource::tile("a", 1.0, 0, 0, 1).key(),
		];
		keys.sort();
		assert_eq!(keys[0], ResourceKey::Url("z".to_string()));
		assert_eq!(keys[1].to_string(), "a @1x 1/0/0");
	}

	#[test]
	fn encoded_len() {
		assert_eq!(Resource::style("http://example.com/1").key().encoded_len(), 20);
		assert_eq!(Resource::tile("mapbox://tiles/1", 1.0, 0, 0, 0).key().encoded_len(), 26);
	}
}
