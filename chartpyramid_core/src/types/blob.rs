//! A thin owned byte-buffer wrapper used for encoded tile payloads.

use std::ops::Deref;

/// An owned, reference-counted-free buffer of bytes.
///
/// Used throughout the image encoding/decoding path as the boundary type between
/// in-memory [`image::DynamicImage`] values and the bytes written to (or read from) a tile file.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Wraps an owned byte vector.
	#[must_use]
	pub fn new(data: Vec<u8>) -> Blob {
		Blob(data)
	}

	/// Returns the blob's contents as a byte slice.
	#[must_use]
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Consumes the blob, returning the underlying byte vector.
	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Returns the number of bytes in the blob.
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if the blob is empty.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for Blob {
	fn from(data: Vec<u8>) -> Self {
		Blob(data)
	}
}

impl From<Blob> for Vec<u8> {
	fn from(blob: Blob) -> Self {
		blob.0
	}
}

impl Deref for Blob {
	type Target = [u8];
	fn deref(&self) -> &[u8] {
		&self.0
	}
}

impl std::fmt::Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Blob({} bytes)", self.0.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrips_through_vec() {
		let data = vec![1u8, 2, 3, 4];
		let blob = Blob::new(data.clone());
		assert_eq!(blob.as_bytes(), &data[..]);
		assert_eq!(blob.len(), 4);
		assert!(!blob.is_empty());
		assert_eq!(blob.into_vec(), data);
	}

	#[test]
	fn empty_blob_is_empty() {
		assert!(Blob::default().is_empty());
	}
}
