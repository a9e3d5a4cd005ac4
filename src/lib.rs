//! geoalign: geo-referenced n-dimensional arrays
//!
//! A [`GeoArray`] pairs an `ndarray` buffer with an [`Extent`] and keeps the two
//! consistent when arrays are sliced, combined with other arrays on different
//! grids, masked, or reprojected. File I/O and projection math are delegated to
//! a [`RasterBackend`]; with the `gdal` feature enabled, [`io::GdalBackend`]
//! provides one.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Bounds, Crs, GeoElement, GeoError, GeoResult, Operator, Policy, Resampling
};

pub use crate::core::{
    minimum_overlap, resolve, ExtractWindow, Extent, GeoArray, OverlapResult, ReprojectOptions, Window
};

pub use io::{MemorySource, RasterBackend, RasterSource, WarpOutput, WarpRequest, WriteOptions};
