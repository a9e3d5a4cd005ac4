//! Interfaces to external raster I/O, transform and warp services

pub mod backend;
pub mod memory;
#[cfg(feature = "gdal")]
pub mod gdal_io;

pub use backend::{RasterBackend, RasterSource, WarpOutput, WarpRequest, WriteOptions};
pub use memory::MemorySource;
#[cfg(feature = "gdal")]
pub use gdal_io::{GdalBackend, GdalSource};
