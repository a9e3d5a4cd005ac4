//! Capability traits for the external raster I/O, transform and warp services.
//!
//! The core never reads files or does projection math itself; everything it
//! needs from the outside world goes through these two traits.

use crate::core::extent::Extent;
use crate::core::window::Window;
use crate::types::{Bounds, Crs, GeoElement, GeoResult, Resampling};
use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Anything that can hand out georeferenced pixels
pub trait RasterSource<T: GeoElement> {
    /// Human-readable identifier (file name, URL, ...) used in error context
    fn describe(&self) -> String;

    /// Full extent of the source, including pixel size and CRS
    fn extent(&self) -> GeoResult<Extent>;

    /// Number of bands/layers
    fn layers(&self) -> usize;

    /// Read the whole source, or only `window`, as (layers, rows, cols)
    fn read(&self, window: Option<Window>) -> GeoResult<Array3<T>>;
}

/// Options for writing rasters through a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Driver short name, e.g. "GTiff"
    pub driver: String,
    /// Compression creation option ("DEFLATE", "LZW", ...), `None` to disable
    pub compression: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            driver: "GTiff".to_string(),
            compression: Some("DEFLATE".to_string()),
        }
    }
}

/// Everything a backend needs to warp one array
#[derive(Debug)]
pub struct WarpRequest<'a, T> {
    pub data: ArrayView3<'a, T>,
    pub source_extent: &'a Extent,
    pub target_crs: &'a Crs,
    pub target_bounds: Bounds,
    /// Output (cell_x, cell_y) in target CRS units
    pub resolution: (f64, f64),
    pub no_data: T,
    pub resampling: Resampling,
    pub max_error: f64,
}

/// Warped pixels and the grid they sit on
#[derive(Debug, Clone)]
pub struct WarpOutput<T> {
    pub data: Array3<T>,
    pub extent: Extent,
}

/// Write, coordinate transform and warp services.
///
/// Implementations own any temporary resources they allocate and must release
/// them before returning.
pub trait RasterBackend<T: GeoElement>: Send + Sync {
    /// Short backend name for logs and error context
    fn name(&self) -> &str;

    fn write(
        &self,
        path: &Path,
        data: ArrayView3<'_, T>,
        extent: &Extent,
        no_data: T,
        options: &WriteOptions,
    ) -> GeoResult<()>;

    fn transform_point(&self, x: f64, y: f64, source: &Crs, target: &Crs) -> GeoResult<(f64, f64)>;

    fn warp(&self, request: WarpRequest<'_, T>) -> GeoResult<WarpOutput<T>>;
}
