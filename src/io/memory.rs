use crate::core::extent::Extent;
use crate::core::geo_array::GeoArray;
use crate::core::window::Window;
use crate::io::backend::RasterSource;
use crate::types::{GeoElement, GeoError, GeoResult};
use ndarray::{Array2, Array3, Axis};

/// In-memory raster source for arrays produced by other libraries
#[derive(Debug, Clone)]
pub struct MemorySource<T> {
    name: String,
    data: Array3<T>,
    extent: Extent,
}

impl<T: GeoElement> MemorySource<T> {
    pub fn new(name: impl Into<String>, data: Array3<T>, extent: Extent) -> GeoResult<Self> {
        let name = name.into();
        let (_, rows, cols) = data.dim();
        if rows != extent.rows() || cols != extent.columns() {
            return Err(GeoError::InvalidExtent(format!(
                "source '{}' is {}x{} pixels but its extent describes {}x{}",
                name,
                rows,
                cols,
                extent.rows(),
                extent.columns()
            )));
        }

        Ok(Self {
            name,
            data,
            extent,
        })
    }

    /// Single-band source
    pub fn from_2d(name: impl Into<String>, data: Array2<T>, extent: Extent) -> GeoResult<Self> {
        Self::new(name, data.insert_axis(Axis(0)), extent)
    }
}

impl<T: GeoElement> RasterSource<T> for MemorySource<T> {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn extent(&self) -> GeoResult<Extent> {
        Ok(self.extent.clone())
    }

    fn layers(&self) -> usize {
        self.data.dim().0
    }

    fn read(&self, window: Option<Window>) -> GeoResult<Array3<T>> {
        match window {
            Some(window) => Ok(window.view(&self.data)?.to_owned()),
            None => Ok(self.data.clone()),
        }
    }
}

/// An existing geo array re-read as a source, e.g. to re-window it
impl<T: GeoElement> RasterSource<T> for GeoArray<T> {
    fn describe(&self) -> String {
        format!("geoarray:{:?}", self.shape())
    }

    fn extent(&self) -> GeoResult<Extent> {
        Ok(GeoArray::extent(self).clone())
    }

    fn layers(&self) -> usize {
        GeoArray::layers(self)
    }

    fn read(&self, window: Option<Window>) -> GeoResult<Array3<T>> {
        match window {
            Some(window) => Ok(self.view(&window)?.to_owned()),
            None => Ok(self.data().clone()),
        }
    }
}
