use crate::types::{Bounds, Crs, GeoError, GeoResult};
use serde::{Deserialize, Serialize};

/// Quotients this close to an integer snap to it before flooring
const SNAP_TOLERANCE: f64 = 1e-6;

/// Spatial extent of a raster grid: bounding box, pixel size and CRS.
///
/// An `Extent` is never mutated once attached to an array; every operation that
/// changes the footprint (extract, geo-algebra, reprojection) builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    /// Pixel width in CRS units
    cell_x: f64,
    /// Pixel height in CRS units (positive, north-up)
    cell_y: f64,
    crs: Crs,
}

impl Extent {
    /// Create a new extent, validating bounds and pixel size
    pub fn new(
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
        cell_x: f64,
        cell_y: f64,
        crs: Crs,
    ) -> GeoResult<Self> {
        let values = [left, right, top, bottom, cell_x, cell_y];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeoError::InvalidExtent(format!(
                "non-finite coordinate or pixel size in {:?}",
                values
            )));
        }
        if cell_x <= 0.0 || cell_y <= 0.0 {
            return Err(GeoError::InvalidExtent(format!(
                "pixel size must be positive, got ({}, {})",
                cell_x, cell_y
            )));
        }
        if right <= left {
            return Err(GeoError::InvalidExtent(format!(
                "right ({}) must be greater than left ({})",
                right, left
            )));
        }
        if top <= bottom {
            return Err(GeoError::InvalidExtent(format!(
                "top ({}) must be greater than bottom ({})",
                top, bottom
            )));
        }

        Ok(Self { left, right, top, bottom, cell_x, cell_y, crs })
    }

    /// Create an extent from its upper-left corner and grid dimensions
    pub fn from_origin(
        left: f64,
        top: f64,
        cell_x: f64,
        cell_y: f64,
        rows: usize,
        cols: usize,
        crs: Crs,
    ) -> GeoResult<Self> {
        Self::new(
            left,
            left + cell_x * cols as f64,
            top,
            top - cell_y * rows as f64,
            cell_x,
            cell_y,
            crs,
        )
    }

    /// Create from a GDAL-style geotransform
    /// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    ///
    /// Only north-up transforms are accepted.
    pub fn from_geo_transform(
        transform: [f64; 6],
        rows: usize,
        cols: usize,
        crs: Crs,
    ) -> GeoResult<Self> {
        if transform[2] != 0.0 || transform[4] != 0.0 {
            return Err(GeoError::InvalidExtent(format!(
                "rotated geotransforms are not supported: {:?}",
                transform
            )));
        }
        Self::from_origin(
            transform[0],
            transform[3],
            transform[1],
            transform[5].abs(),
            rows,
            cols,
            crs,
        )
    }

    /// GDAL-style north-up geotransform
    pub fn to_geo_transform(&self) -> [f64; 6] {
        [self.left, self.cell_x, 0.0, self.top, 0.0, -self.cell_y]
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn cell_x(&self) -> f64 {
        self.cell_x
    }

    pub fn cell_y(&self) -> f64 {
        self.cell_y
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Width in pixels (fractional)
    pub fn width(&self) -> f64 {
        (self.right - self.left) / self.cell_x
    }

    /// Height in pixels (fractional)
    pub fn height(&self) -> f64 {
        (self.top - self.bottom) / self.cell_y
    }

    /// Number of columns covered by this extent
    pub fn columns(&self) -> usize {
        self.width().round() as usize
    }

    /// Number of rows covered by this extent
    pub fn rows(&self) -> usize {
        self.height().round() as usize
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.left, self.right, self.top, self.bottom)
    }

    /// Same grid and bounds in a different CRS
    pub fn with_crs(&self, crs: Crs) -> Self {
        Self { crs, ..self.clone() }
    }

    /// Same pixel size and CRS over new bounds
    pub fn with_bounds(&self, bounds: Bounds) -> GeoResult<Self> {
        Self::new(
            bounds.left,
            bounds.right,
            bounds.top,
            bounds.bottom,
            self.cell_x,
            self.cell_y,
            self.crs.clone(),
        )
    }

    /// Column and row offset of the pixel containing `(x, y)`.
    ///
    /// No bounds check: offsets may be negative or beyond the grid, which is
    /// what the overlap resolver relies on to locate foreign grids.
    pub fn offsets_for(&self, x: f64, y: f64) -> (isize, isize) {
        let col = snap_floor((x - self.left) / self.cell_x);
        let row = snap_floor((self.top - y) / self.cell_y);
        (col, row)
    }

    /// Geographic extent of a pixel window in this grid
    pub fn bounds_for(
        &self,
        col_start: usize,
        col_count: usize,
        row_start: usize,
        row_count: usize,
    ) -> GeoResult<Extent> {
        let left = self.left + self.cell_x * col_start as f64;
        let top = self.top - self.cell_y * row_start as f64;
        Self::from_origin(
            left,
            top,
            self.cell_x,
            self.cell_y,
            row_count,
            col_count,
            self.crs.clone(),
        )
    }

    /// Both axes share the same pixel size
    pub fn same_resolution(&self, other: &Extent) -> bool {
        (self.cell_x / other.cell_x - 1.0).abs() < SNAP_TOLERANCE
            && (self.cell_y / other.cell_y - 1.0).abs() < SNAP_TOLERANCE
    }

    /// On each axis one pixel size is an integer multiple of the other
    pub fn is_commensurate(&self, other: &Extent) -> bool {
        integer_ratio(self.cell_x, other.cell_x) && integer_ratio(self.cell_y, other.cell_y)
    }

    /// Coordinate equality within `tolerance`; CRS must match exactly
    pub fn approx_eq(&self, other: &Extent, tolerance: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance;
        close(self.left, other.left)
            && close(self.right, other.right)
            && close(self.top, other.top)
            && close(self.bottom, other.bottom)
            && close(self.cell_x, other.cell_x)
            && close(self.cell_y, other.cell_y)
            && self.crs == other.crs
    }
}

fn integer_ratio(a: f64, b: f64) -> bool {
    let ratio = a.max(b) / a.min(b);
    (ratio - ratio.round()).abs() < SNAP_TOLERANCE
}

fn snap_floor(value: f64) -> isize {
    let nearest = value.round();
    if (value - nearest).abs() < SNAP_TOLERANCE {
        nearest as isize
    } else {
        value.floor() as isize
    }
}
