//! Extent-aware geo-algebra and masking.
//!
//! Both operands are first reconciled through the overlap resolver. The
//! overlap rectangle is then located in the calling array's buffer, and the
//! other array is sampled onto that window (nearest cell when pixel sizes
//! differ) so arrays with different extents line up geographically.

use crate::core::extent::Extent;
use crate::core::geo_array::GeoArray;
use crate::core::overlap::{resolve, OverlapResult};
use crate::core::window::Window;
use crate::types::{GeoElement, GeoError, GeoResult, Operator, Policy};
use ndarray::{Array3, ArrayView3, ArrayViewMut3, CowArray, Ix3, Zip};
use std::ops::{Add, Mul, Sub};

impl<T: GeoElement> GeoArray<T> {
    /// Combine `self` with `other` cell by cell after spatial alignment.
    ///
    /// - `Extent`: a copy of `self` where only the overlap is combined
    /// - `Intersection`: only the overlap, with the overlap's extent
    /// - `Union`: both footprints; cells covered by one array keep its value,
    ///   cells covered by neither hold `self.no_data()`
    ///
    /// The result is on `self`'s pixel grid. `other` may use a different pixel
    /// size as long as each axis is an integer multiple of `self`'s (or the
    /// reverse); its cells are picked by nearest cell. `other` may have one
    /// layer, which is applied to every layer of `self`.
    pub fn geo_combine(&self, other: &GeoArray<T>, operator: Operator, policy: Policy) -> GeoResult<GeoArray<T>> {
        log::debug!("geo_combine: {} with policy {}", operator, policy);

        match policy {
            Policy::Extent => {
                let mut result = self.clone();
                result.combine_in_place(other, operator)?;
                Ok(result)
            }
            Policy::Intersection => self.combine_intersection(other, operator),
            Policy::Union => self.combine_union(other, operator),
        }
    }

    /// Extent-anchored combination written straight into `self`.
    ///
    /// Cells outside the overlap are left untouched; a disjoint `other`
    /// leaves `self` unchanged. This mutates `self`.
    pub fn combine_in_place(&mut self, other: &GeoArray<T>, operator: Operator) -> GeoResult<&mut Self> {
        check_layers(self.layers(), other.layers())?;

        let overlap = match resolve(self.extent(), other.extent(), Policy::Intersection) {
            Ok(overlap) => overlap,
            Err(GeoError::NoOverlap { .. }) => {
                log::debug!("No overlap with {}; extent left unchanged", other.extent().bounds());
                return Ok(self);
            }
            Err(e) => return Err(e),
        };

        let window = locate(self.extent(), self.shape(), &overlap)?;
        let rhs = sample_onto(self.extent(), &overlap, other)?;
        let target = window.view_mut(self.buffer_mut())?;
        apply_in_place(target, rhs.view(), operator)?;

        Ok(self)
    }

    pub fn geo_add(&self, other: &GeoArray<T>, policy: Policy) -> GeoResult<GeoArray<T>> {
        self.geo_combine(other, Operator::Add, policy)
    }

    pub fn geo_subtract(&self, other: &GeoArray<T>, policy: Policy) -> GeoResult<GeoArray<T>> {
        self.geo_combine(other, Operator::Subtract, policy)
    }

    pub fn geo_multiply(&self, other: &GeoArray<T>, policy: Policy) -> GeoResult<GeoArray<T>> {
        self.geo_combine(other, Operator::Multiply, policy)
    }

    /// Set every cell under `mask_array`'s footprint to `no_data`, in place.
    ///
    /// Only the mask's extent matters; its values are ignored. Every layer is
    /// masked.
    pub fn mask<U: GeoElement>(&mut self, mask_array: &GeoArray<U>) -> GeoResult<&mut Self> {
        self.mask_extent(mask_array.extent())
    }

    /// Same as [`GeoArray::mask`] with a bare extent as the stencil
    pub fn mask_extent(&mut self, stencil: &Extent) -> GeoResult<&mut Self> {
        let overlap = resolve(self.extent(), stencil, Policy::Intersection)?;
        let window = locate(self.extent(), self.shape(), &overlap)?;

        log::debug!("Masking window {:?} with no-data {:?}", window, self.no_data());

        let no_data = self.no_data();
        window.view_mut(self.buffer_mut())?.fill(no_data);

        Ok(self)
    }

    fn combine_intersection(&self, other: &GeoArray<T>, operator: Operator) -> GeoResult<GeoArray<T>> {
        check_layers(self.layers(), other.layers())?;

        let overlap = resolve(self.extent(), other.extent(), Policy::Intersection)?;
        let window = locate(self.extent(), self.shape(), &overlap)?;
        let rhs = sample_onto(self.extent(), &overlap, other)?;

        let mut result = window.view(self.data())?.to_owned();
        apply_in_place(result.view_mut(), rhs.view(), operator)?;

        let extent = self
            .extent()
            .bounds_for(window.col_start, window.col_count, window.row_start, window.row_count)?;
        self.derive(result, extent, self.layer_names().to_vec())
    }

    fn combine_union(&self, other: &GeoArray<T>, operator: Operator) -> GeoResult<GeoArray<T>> {
        check_layers(self.layers(), other.layers())?;

        let union = resolve(self.extent(), other.extent(), Policy::Union)?;
        let extent = self.extent().with_bounds(union.bounds)?;
        let mut result = Array3::from_elem((self.layers(), union.row_count, union.col_count), self.no_data());

        place(&mut result, &extent, self)?;
        place(&mut result, &extent, other)?;

        // Cells covered by both get the combined value
        match resolve(self.extent(), other.extent(), Policy::Intersection) {
            Ok(overlap) => {
                let window_a = locate(self.extent(), self.shape(), &overlap)?;
                let window_out = locate(&extent, result.dim(), &overlap)?;
                let rhs = sample_onto(self.extent(), &overlap, other)?;

                let mut target = window_out.view_mut(&mut result)?;
                target.assign(&window_a.view(self.data())?);
                apply_in_place(target, rhs.view(), operator)?;
            }
            Err(GeoError::NoOverlap { .. }) => {
                log::debug!("Union of disjoint extents; nothing to combine");
            }
            Err(e) => return Err(e),
        }

        self.derive(result, extent, self.layer_names().to_vec())
    }
}

/// Window of `overlap` inside a buffer of `shape` laid out on `grid`
fn locate(grid: &Extent, shape: (usize, usize, usize), overlap: &OverlapResult) -> GeoResult<Window> {
    let (col, row) = grid.offsets_for(overlap.bounds.left, overlap.bounds.top);
    Window::locate(shape, row, overlap.row_count, col, overlap.col_count)
}

/// Values of `source` under each cell of the `overlap` window of `grid`.
///
/// Equal pixel sizes borrow the matching window. Otherwise every target cell
/// takes the source cell containing its centre, which requires the pixel
/// sizes to be integer multiples of one another.
fn sample_onto<'a, T: GeoElement>(
    grid: &Extent,
    overlap: &OverlapResult,
    source: &'a GeoArray<T>,
) -> GeoResult<CowArray<'a, T, Ix3>> {
    let src = source.extent();
    let bounds = overlap.bounds;
    let (rows, cols) = (overlap.row_count, overlap.col_count);

    if grid.same_resolution(src) {
        let window = locate(src, source.shape(), overlap)?;
        return Ok(CowArray::from(window.view(source.data())?));
    }
    if !grid.is_commensurate(src) {
        return Err(GeoError::InvalidExtent(format!(
            "pixel sizes ({}, {}) and ({}, {}) are not integer multiples of each other",
            grid.cell_x(),
            grid.cell_y(),
            src.cell_x(),
            src.cell_y()
        )));
    }

    let col_index = lookup_table(cols, source.columns(), |c| {
        src.offsets_for(bounds.left + (c as f64 + 0.5) * grid.cell_x(), src.top()).0
    });
    let row_index = lookup_table(rows, source.rows(), |r| {
        src.offsets_for(src.left(), bounds.top - (r as f64 + 0.5) * grid.cell_y()).1
    });

    let (col_index, row_index) = match (col_index, row_index) {
        (Some(c), Some(r)) => (c, r),
        _ => {
            let (col, row) = src.offsets_for(bounds.left, bounds.top);
            let (layers, src_rows, src_cols) = source.shape();
            return Err(GeoError::OutOfBounds {
                layer_start: 0,
                layer_count: layers,
                row_start: row,
                row_count: rows,
                col_start: col,
                col_count: cols,
                layers,
                rows: src_rows,
                cols: src_cols,
            });
        }
    };

    log::debug!(
        "Resampling {}x{} source cells onto a {}x{} window",
        source.rows(),
        source.columns(),
        rows,
        cols
    );
    let data = source.data();
    let sampled = Array3::from_shape_fn((source.layers(), rows, cols), |(l, r, c)| {
        data[[l, row_index[r], col_index[c]]]
    });
    Ok(CowArray::from(sampled))
}

/// Source index for each of `count` target cells, `None` if any falls outside `len`
fn lookup_table(count: usize, len: usize, offset: impl Fn(usize) -> isize) -> Option<Vec<usize>> {
    (0..count)
        .map(|i| usize::try_from(offset(i)).ok().filter(|&index| index < len))
        .collect()
}

/// Copy `source` into `target` at its geographic position on `target_extent`'s grid
fn place<T: GeoElement>(target: &mut Array3<T>, target_extent: &Extent, source: &GeoArray<T>) -> GeoResult<()> {
    let footprint = source.extent().bounds();
    let region = OverlapResult {
        bounds: footprint,
        row_count: pixels(footprint.top - footprint.bottom, target_extent.cell_y()),
        col_count: pixels(footprint.right - footprint.left, target_extent.cell_x()),
    };

    let window = locate(target_extent, target.dim(), &region)?;
    let values = sample_onto(target_extent, &region, source)?;

    let mut slot = window.view_mut(target)?;
    let values = values
        .broadcast(slot.raw_dim())
        .ok_or(GeoError::LayerMismatch {
            expected: slot.dim().0,
            actual: source.layers(),
        })?;
    slot.assign(&values);
    Ok(())
}

fn pixels(length: f64, cell: f64) -> usize {
    (length / cell).round() as usize
}

fn check_layers(expected: usize, actual: usize) -> GeoResult<()> {
    if actual == expected || actual == 1 {
        Ok(())
    } else {
        Err(GeoError::LayerMismatch { expected, actual })
    }
}

/// `target = target <op> rhs`, broadcasting a single-layer `rhs`
fn apply_in_place<T: GeoElement>(target: ArrayViewMut3<'_, T>, rhs: ArrayView3<'_, T>, operator: Operator) -> GeoResult<()> {
    let rhs = rhs.broadcast(target.raw_dim()).ok_or(GeoError::LayerMismatch {
        expected: target.dim().0,
        actual: rhs.dim().0,
    })?;

    let zip = Zip::from(target).and(&rhs);

    #[cfg(feature = "parallel")]
    zip.par_for_each(|a, &b| *a = operator.apply(*a, b));

    #[cfg(not(feature = "parallel"))]
    zip.for_each(|a, &b| *a = operator.apply(*a, b));

    Ok(())
}

impl<'a, T: GeoElement> Add<&'a GeoArray<T>> for &'a GeoArray<T> {
    type Output = GeoResult<GeoArray<T>>;

    fn add(self, rhs: &'a GeoArray<T>) -> Self::Output {
        self.geo_add(rhs, Policy::Extent)
    }
}

impl<'a, T: GeoElement> Sub<&'a GeoArray<T>> for &'a GeoArray<T> {
    type Output = GeoResult<GeoArray<T>>;

    fn sub(self, rhs: &'a GeoArray<T>) -> Self::Output {
        self.geo_subtract(rhs, Policy::Extent)
    }
}

impl<'a, T: GeoElement> Mul<&'a GeoArray<T>> for &'a GeoArray<T> {
    type Output = GeoResult<GeoArray<T>>;

    fn mul(self, rhs: &'a GeoArray<T>) -> Self::Output {
        self.geo_multiply(rhs, Policy::Extent)
    }
}
