//! Catalog configuration: the JSON file describing datasets and tilesets for a run.

mod catalog;

pub use catalog::{Catalog, Dataset, Gcp, GeoBound, Mask, Tileset};
