//! The three supported tile output formats.

use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

/// The encoded format of a materialized tile file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileFormat {
	Png,
	Jpeg,
	Webp,
}

impl TileFormat {
	/// Returns the file extension used for tiles of this format (no leading dot).
	#[must_use]
	pub fn extension(self) -> &'static str {
		match self {
			TileFormat::Png => "png",
			TileFormat::Jpeg => "jpeg",
			TileFormat::Webp => "webp",
		}
	}
}

impl fmt::Display for TileFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.extension())
	}
}

impl FromStr for TileFormat {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<TileFormat> {
		Ok(match s.to_ascii_lowercase().as_str() {
			"png" => TileFormat::Png,
			"jpeg" | "jpg" => TileFormat::Jpeg,
			"webp" => TileFormat::Webp,
			other => bail!("unsupported tile format: \"{other}\" (expected png, jpeg, or webp)"),
		})
	}
}
