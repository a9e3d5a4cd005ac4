use crate::core::extent::Extent;
use crate::types::{Bounds, GeoError, GeoResult, Policy};

/// Rectangle on which two extents are reconciled, in coordinates and in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapResult {
    pub bounds: Bounds,
    /// Rows at the calling array's resolution
    pub row_count: usize,
    /// Columns at the calling array's resolution
    pub col_count: usize,
}

/// Minimum overlap between two extents.
///
/// Disjoint extents (including ones that only share an edge) are an error:
/// callers assume at least one valid pixel.
pub fn minimum_overlap(a: &Extent, b: &Extent) -> GeoResult<Bounds> {
    let overlap = Bounds::new(
        a.left().max(b.left()),
        a.right().min(b.right()),
        a.top().min(b.top()),
        a.bottom().max(b.bottom()),
    );

    if !overlap.is_valid() {
        return Err(GeoError::NoOverlap {
            a: a.bounds(),
            b: b.bounds(),
        });
    }

    Ok(overlap)
}

/// Smallest rectangle containing both extents
pub fn union_bounds(a: &Extent, b: &Extent) -> Bounds {
    Bounds::new(
        a.left().min(b.left()),
        a.right().max(b.right()),
        a.top().max(b.top()),
        a.bottom().min(b.bottom()),
    )
}

/// Resolve the target rectangle of `a` combined with `b` under `policy`.
///
/// Pixel counts use `a`'s resolution: `cell_y` for rows, `cell_x` for columns.
pub fn resolve(a: &Extent, b: &Extent, policy: Policy) -> GeoResult<OverlapResult> {
    let bounds = match policy {
        Policy::Extent => a.bounds(),
        Policy::Intersection => minimum_overlap(a, b)?,
        Policy::Union => union_bounds(a, b),
    };

    let row_count = ((bounds.top - bounds.bottom) / a.cell_y()).round() as usize;
    let col_count = ((bounds.right - bounds.left) / a.cell_x()).round() as usize;

    log::debug!(
        "Resolved {} overlap: {} -> {}x{} pixels",
        policy,
        bounds,
        row_count,
        col_count
    );

    Ok(OverlapResult {
        bounds,
        row_count,
        col_count,
    })
}
