//! Core geo-array modules

pub mod extent;
pub mod overlap;
pub mod window;
pub mod geo_array;
pub mod algebra;
pub mod reproject;

// Re-export main types
pub use extent::Extent;
pub use overlap::{minimum_overlap, resolve, union_bounds, OverlapResult};
pub use window::Window;
pub use geo_array::{ExtractWindow, GeoArray};
pub use reproject::ReprojectOptions;
