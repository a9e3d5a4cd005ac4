use num_traits::{Num, NumCast};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;

/// Numeric cell type storable in a [`GeoArray`](crate::GeoArray).
///
/// Cell arithmetic wraps on integer overflow, so `u8` 200 + 100 is 44 in both
/// debug and release builds.
pub trait GeoElement: Copy + Debug + PartialOrd + Num + NumCast + Send + Sync + 'static {
    fn cell_add(self, rhs: Self) -> Self;
    fn cell_sub(self, rhs: Self) -> Self;
    fn cell_mul(self, rhs: Self) -> Self;
}

macro_rules! impl_integer_element {
    ($($t:ty),*) => {
        $(impl GeoElement for $t {
            #[inline]
            fn cell_add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            #[inline]
            fn cell_sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            #[inline]
            fn cell_mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
        })*
    };
}

macro_rules! impl_float_element {
    ($($t:ty),*) => {
        $(impl GeoElement for $t {
            #[inline]
            fn cell_add(self, rhs: Self) -> Self {
                self + rhs
            }
            #[inline]
            fn cell_sub(self, rhs: Self) -> Self {
                self - rhs
            }
            #[inline]
            fn cell_mul(self, rhs: Self) -> Self {
                self * rhs
            }
        })*
    };
}

impl_integer_element!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_float_element!(f32, f64);

/// Coordinate reference system descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG authority code (e.g. 4326)
    Epsg(u32),
    /// OGC WKT definition
    Wkt(String),
    /// PROJ string (e.g. "+proj=longlat +datum=WGS84")
    Proj(String),
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Wkt(wkt) => write!(f, "{}", wkt),
            Crs::Proj(proj) => write!(f, "{}", proj),
        }
    }
}

/// Geographic rectangle without a pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self { left, right, top, bottom }
    }

    /// True when the rectangle has positive area
    pub fn is_valid(&self) -> bool {
        self.left < self.right && self.bottom < self.top
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[left={}, right={}, top={}, bottom={}]",
            self.left, self.right, self.top, self.bottom
        )
    }
}

/// How the geometries of two arrays are reconciled before combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Policy {
    /// Keep the calling array's extent
    Extent,
    /// Keep only the region covered by both arrays
    Intersection,
    /// Cover both arrays
    Union,
}

impl FromStr for Policy {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "extent" => Ok(Policy::Extent),
            "intersection" => Ok(Policy::Intersection),
            "union" => Ok(Policy::Union),
            _ => Err(GeoError::UnsupportedPolicy(s.to_string())),
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::Extent => write!(f, "extent"),
            Policy::Intersection => write!(f, "intersection"),
            Policy::Union => write!(f, "union"),
        }
    }
}

/// Elementwise geo-algebra operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
}

impl Operator {
    #[inline]
    pub fn apply<T: GeoElement>(self, a: T, b: T) -> T {
        match self {
            Operator::Add => a.cell_add(b),
            Operator::Subtract => a.cell_sub(b),
            Operator::Multiply => a.cell_mul(b),
        }
    }
}

impl FromStr for Operator {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(Operator::Add),
            "subtract" => Ok(Operator::Subtract),
            "multiply" => Ok(Operator::Multiply),
            _ => Err(GeoError::UnsupportedOperator(s.to_string())),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Add => write!(f, "add"),
            Operator::Subtract => write!(f, "subtract"),
            Operator::Multiply => write!(f, "multiply"),
        }
    }
}

/// Resampling kernel requested from the warp backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resampling {
    #[default]
    Nearest,
    Bilinear,
    Cubic,
    Average,
}

/// Error types for geo-array operations
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Invalid extent: {0}")]
    InvalidExtent(String),

    #[error("Extents do not overlap: {a} vs {b}")]
    NoOverlap { a: Bounds, b: Bounds },

    #[error(
        "Window out of bounds: layers {layer_start}+{layer_count}, rows {row_start}+{row_count}, \
         cols {col_start}+{col_count} in array of shape ({layers}, {rows}, {cols})"
    )]
    OutOfBounds {
        layer_start: usize,
        layer_count: usize,
        row_start: isize,
        row_count: usize,
        col_start: isize,
        col_count: usize,
        layers: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Unsupported combination policy: {0}")]
    UnsupportedPolicy(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Layer count mismatch: expected {expected}, got {actual}")]
    LayerMismatch { expected: usize, actual: usize },

    #[error("Backend error during {operation} ({source_id}): {message}")]
    Backend {
        operation: &'static str,
        source_id: String,
        message: String,
    },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl GeoError {
    /// Wrap a collaborator failure with the operation and identifier that triggered it
    pub fn backend(
        operation: &'static str,
        source_id: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        GeoError::Backend {
            operation,
            source_id: source_id.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for geo-array operations
pub type GeoResult<T> = Result<T, GeoError>;
