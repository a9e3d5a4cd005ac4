use crate::types::{GeoError, GeoResult};
use ndarray::{s, Array3, ArrayView3, ArrayViewMut3};

/// Rectangular sub-region of a (layers, rows, cols) buffer.
///
/// A `Window` is only a set of bounds; borrowing it through [`Window::view`]
/// ties the resulting view to the buffer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub layer_start: usize,
    pub layer_count: usize,
    pub row_start: usize,
    pub row_count: usize,
    pub col_start: usize,
    pub col_count: usize,
}

impl Window {
    /// Window covering every layer of a row/column region
    pub fn new(layers: usize, row_start: usize, row_count: usize, col_start: usize, col_count: usize) -> Self {
        Self {
            layer_start: 0,
            layer_count: layers,
            row_start,
            row_count,
            col_start,
            col_count,
        }
    }

    /// Window spanning an entire buffer
    pub fn full(shape: (usize, usize, usize)) -> Self {
        Self::new(shape.0, 0, shape.1, 0, shape.2)
    }

    /// Build a window from signed pixel offsets and check it fits `shape`
    pub fn locate(
        shape: (usize, usize, usize),
        row_offset: isize,
        row_count: usize,
        col_offset: isize,
        col_count: usize,
    ) -> GeoResult<Self> {
        if row_offset < 0 || col_offset < 0 {
            return Err(out_of_bounds(shape, 0, shape.0, row_offset, row_count, col_offset, col_count));
        }
        let window = Self::new(shape.0, row_offset as usize, row_count, col_offset as usize, col_count);
        window.validate(shape)?;
        Ok(window)
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.layer_count, self.row_count, self.col_count)
    }

    pub fn is_empty(&self) -> bool {
        self.layer_count == 0 || self.row_count == 0 || self.col_count == 0
    }

    /// Fails with `OutOfBounds` when any axis runs past `shape`
    pub fn validate(&self, shape: (usize, usize, usize)) -> GeoResult<()> {
        let fits = |start: usize, count: usize, len: usize| {
            start.checked_add(count).map_or(false, |end| end <= len)
        };

        if fits(self.layer_start, self.layer_count, shape.0)
            && fits(self.row_start, self.row_count, shape.1)
            && fits(self.col_start, self.col_count, shape.2)
        {
            Ok(())
        } else {
            Err(out_of_bounds(
                shape,
                self.layer_start,
                self.layer_count,
                self.row_start as isize,
                self.row_count,
                self.col_start as isize,
                self.col_count,
            ))
        }
    }

    /// Read-only view of this window into `data`
    pub fn view<'a, T>(&self, data: &'a Array3<T>) -> GeoResult<ArrayView3<'a, T>> {
        self.validate(data.dim())?;
        Ok(data.slice(s![
            self.layer_start..self.layer_start + self.layer_count,
            self.row_start..self.row_start + self.row_count,
            self.col_start..self.col_start + self.col_count
        ]))
    }

    /// Mutable view of this window into `data`
    pub fn view_mut<'a, T>(&self, data: &'a mut Array3<T>) -> GeoResult<ArrayViewMut3<'a, T>> {
        self.validate(data.dim())?;
        Ok(data.slice_mut(s![
            self.layer_start..self.layer_start + self.layer_count,
            self.row_start..self.row_start + self.row_count,
            self.col_start..self.col_start + self.col_count
        ]))
    }
}

fn out_of_bounds(
    shape: (usize, usize, usize),
    layer_start: usize,
    layer_count: usize,
    row_start: isize,
    row_count: usize,
    col_start: isize,
    col_count: usize,
) -> GeoError {
    GeoError::OutOfBounds {
        layer_start,
        layer_count,
        row_start,
        row_count,
        col_start,
        col_count,
        layers: shape.0,
        rows: shape.1,
        cols: shape.2,
    }
}
