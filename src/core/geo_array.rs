use crate::core::extent::Extent;
use crate::core::window::Window;
use crate::io::backend::{RasterBackend, RasterSource, WriteOptions};
use crate::types::{Crs, GeoElement, GeoError, GeoResult};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use std::path::Path;
use std::sync::Arc;

/// A numeric (layers, rows, cols) buffer tied to a spatial extent.
///
/// The array owns its buffer and extent. The optional backend handle is only
/// used to request I/O or reprojection and is shared with derived arrays.
#[derive(Clone)]
pub struct GeoArray<T: GeoElement> {
    data: Array3<T>,
    extent: Extent,
    no_data: T,
    layer_names: Vec<String>,
    backend: Option<Arc<dyn RasterBackend<T>>>,
}

/// Optional window arguments for [`GeoArray::extract`].
///
/// Unset starts default to 0 and unset counts to the rest of the axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractWindow {
    pub row_start: Option<usize>,
    pub rows: Option<usize>,
    pub col_start: Option<usize>,
    pub cols: Option<usize>,
    pub layer_start: Option<usize>,
    pub layers: Option<usize>,
}

impl ExtractWindow {
    pub fn rows(row_start: usize, rows: usize) -> Self {
        Self {
            row_start: Some(row_start),
            rows: Some(rows),
            ..Self::default()
        }
    }

    pub fn with_cols(mut self, col_start: usize, cols: usize) -> Self {
        self.col_start = Some(col_start);
        self.cols = Some(cols);
        self
    }

    pub fn with_layers(mut self, layer_start: usize, layers: usize) -> Self {
        self.layer_start = Some(layer_start);
        self.layers = Some(layers);
        self
    }

    /// Resolve defaults against a (layers, rows, cols) shape
    pub fn resolve(&self, shape: (usize, usize, usize)) -> Window {
        let axis = |start: Option<usize>, count: Option<usize>, len: usize| {
            let start = start.unwrap_or(0);
            (start, count.unwrap_or_else(|| len.saturating_sub(start)))
        };

        let (layer_start, layer_count) = axis(self.layer_start, self.layers, shape.0);
        let (row_start, row_count) = axis(self.row_start, self.rows, shape.1);
        let (col_start, col_count) = axis(self.col_start, self.cols, shape.2);

        Window {
            layer_start,
            layer_count,
            row_start,
            row_count,
            col_start,
            col_count,
        }
    }
}

fn default_layer_names(layers: usize) -> Vec<String> {
    (1..=layers).map(|i| i.to_string()).collect()
}

impl<T: GeoElement> GeoArray<T> {
    /// Wrap a (layers, rows, cols) buffer; its rows and columns must match the extent
    pub fn new(data: Array3<T>, extent: Extent) -> GeoResult<Self> {
        let (layers, rows, cols) = data.dim();
        if rows != extent.rows() || cols != extent.columns() {
            return Err(GeoError::InvalidExtent(format!(
                "array is {}x{} pixels but extent {} at ({}, {}) describes {}x{}",
                rows,
                cols,
                extent.bounds(),
                extent.cell_x(),
                extent.cell_y(),
                extent.rows(),
                extent.columns()
            )));
        }

        Ok(Self {
            data,
            extent,
            no_data: T::zero(),
            layer_names: default_layer_names(layers),
            backend: None,
        })
    }

    /// Wrap a single-layer (rows, cols) buffer
    pub fn from_2d(data: Array2<T>, extent: Extent) -> GeoResult<Self> {
        Self::new(data.insert_axis(Axis(0)), extent)
    }

    /// Read from a raster source, optionally limited to a pixel window
    pub fn from_source<S>(source: &S, window: Option<Window>) -> GeoResult<Self>
    where
        S: RasterSource<T> + ?Sized,
    {
        let full_extent = source.extent()?;
        let extent = match window {
            Some(w) => full_extent.bounds_for(w.col_start, w.col_count, w.row_start, w.row_count)?,
            None => full_extent,
        };

        log::debug!("Reading {} with window {:?}", source.describe(), window);
        let data = source.read(window)?;
        Self::new(data, extent)
    }

    // Builders

    pub fn with_no_data(mut self, no_data: T) -> Self {
        self.no_data = no_data;
        self
    }

    /// Name each layer; the number of names must equal the number of layers
    pub fn with_layer_names<S: Into<String>>(mut self, names: Vec<S>) -> GeoResult<Self> {
        if names.len() != self.layers() {
            return Err(GeoError::LayerMismatch {
                expected: self.layers(),
                actual: names.len(),
            });
        }
        self.layer_names = names.into_iter().map(Into::into).collect();
        Ok(self)
    }

    pub fn with_backend(mut self, backend: Arc<dyn RasterBackend<T>>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build a derived array that keeps this array's no-data and backend.
    ///
    /// `layer_names` must match the new layer count (`LayerMismatch` otherwise).
    pub(crate) fn derive(&self, data: Array3<T>, extent: Extent, layer_names: Vec<String>) -> GeoResult<Self> {
        let mut derived = Self::new(data, extent)?.with_layer_names(layer_names)?;
        derived.no_data = self.no_data;
        derived.backend = self.backend.clone();
        Ok(derived)
    }

    // Accessors

    pub fn rows(&self) -> usize {
        self.data.dim().1
    }

    pub fn columns(&self) -> usize {
        self.data.dim().2
    }

    pub fn layers(&self) -> usize {
        self.data.dim().0
    }

    /// (layers, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn crs(&self) -> &Crs {
        self.extent.crs()
    }

    pub fn no_data(&self) -> T {
        self.no_data
    }

    pub fn layer_names(&self) -> &[String] {
        &self.layer_names
    }

    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    /// Mutable cell access; the shape cannot change through this reference
    pub fn data_mut(&mut self) -> ndarray::ArrayViewMut3<'_, T> {
        self.data.view_mut()
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut Array3<T> {
        &mut self.data
    }

    pub fn into_data(self) -> Array3<T> {
        self.data
    }

    pub fn backend(&self) -> Option<&Arc<dyn RasterBackend<T>>> {
        self.backend.as_ref()
    }

    /// Borrow the window `window` of this array's buffer
    pub fn view(&self, window: &Window) -> GeoResult<ArrayView3<'_, T>> {
        window.view(&self.data)
    }

    /// 2-D view of one layer
    pub fn layer(&self, index: usize) -> Option<ArrayView2<'_, T>> {
        if index < self.layers() {
            Some(self.data.index_axis(Axis(0), index))
        } else {
            None
        }
    }

    pub fn layer_by_name(&self, name: &str) -> Option<ArrayView2<'_, T>> {
        let index = self.layer_names.iter().position(|n| n == name)?;
        self.layer(index)
    }

    /// Slice the array, keeping the extent consistent with the new window.
    ///
    /// Windows outside the buffer fail with `OutOfBounds`; nothing is padded.
    pub fn extract(&self, window: ExtractWindow) -> GeoResult<GeoArray<T>> {
        let window = window.resolve(self.shape());
        self.extract_window(&window)
    }

    pub fn extract_window(&self, window: &Window) -> GeoResult<GeoArray<T>> {
        let data = window.view(&self.data)?.to_owned();
        let extent = self
            .extent
            .bounds_for(window.col_start, window.col_count, window.row_start, window.row_count)?;
        let names = self.layer_names[window.layer_start..window.layer_start + window.layer_count].to_vec();

        log::debug!("Extracted window {:?} -> {}", window, extent.bounds());
        self.derive(data, extent, names)
    }

    /// x and y coordinates of every cell's upper-left corner, each (rows, cols)
    pub fn to_coordinates(&self) -> (Array2<f64>, Array2<f64>) {
        let (left, top) = (self.extent.left(), self.extent.top());
        let (cell_x, cell_y) = (self.extent.cell_x(), self.extent.cell_y());
        let shape = (self.rows(), self.columns());

        let x = Array2::from_shape_fn(shape, |(_, c)| left + c as f64 * cell_x);
        let y = Array2::from_shape_fn(shape, |(r, _)| top - r as f64 * cell_y);
        (x, y)
    }

    /// Write through the attached backend
    pub fn to_raster<P: AsRef<Path>>(&self, path: P, options: &WriteOptions) -> GeoResult<()> {
        let path = path.as_ref();
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| GeoError::backend("write", path.display().to_string(), "no backend attached"))?;

        log::info!("Writing {} layer(s) to {} via {}", self.layers(), path.display(), backend.name());
        backend.write(path, self.data.view(), &self.extent, self.no_data, options)
    }
}

impl<T: GeoElement> std::fmt::Debug for GeoArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoArray")
            .field("shape", &self.shape())
            .field("extent", &self.extent)
            .field("no_data", &self.no_data)
            .field("layer_names", &self.layer_names)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish()
    }
}
