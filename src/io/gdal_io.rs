//! GDAL-backed raster source and backend.
//!
//! Only compiled with the `gdal` feature. GDAL performs all projection and
//! resampling work; this module moves pixels and metadata in and out.

use crate::core::extent::Extent;
use crate::core::window::Window;
use crate::io::backend::{RasterBackend, RasterSource, WarpOutput, WarpRequest, WriteOptions};
use crate::types::{Crs, GeoElement, GeoError, GeoResult, Resampling};
use gdal::raster::{Buffer, GdalType, RasterCreationOption};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::{Dataset, DriverManager};
use ndarray::{Array3, ArrayView3, Axis};
use std::path::{Path, PathBuf};

/// Build a spatial reference with x/y (lon/lat) axis order
fn spatial_ref(crs: &Crs) -> gdal::errors::Result<SpatialRef> {
    #[allow(unused_mut)]
    let mut srs = match crs {
        Crs::Epsg(code) => SpatialRef::from_epsg(*code)?,
        Crs::Wkt(wkt) => SpatialRef::from_wkt(wkt)?,
        Crs::Proj(proj) => SpatialRef::from_proj4(proj)?,
    };
    srs.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    Ok(srs)
}

fn dataset_crs(dataset: &Dataset) -> Option<Crs> {
    let srs = dataset.spatial_ref().ok()?;
    if let Ok(code) = srs.auth_code() {
        return Some(Crs::Epsg(code as u32));
    }
    srs.to_wkt().ok().map(Crs::Wkt)
}

fn resample_alg(resampling: Resampling) -> gdal_sys::GDALResampleAlg::Type {
    match resampling {
        Resampling::Nearest => gdal_sys::GDALResampleAlg::GRA_NearestNeighbour,
        Resampling::Bilinear => gdal_sys::GDALResampleAlg::GRA_Bilinear,
        Resampling::Cubic => gdal_sys::GDALResampleAlg::GRA_Cubic,
        Resampling::Average => gdal_sys::GDALResampleAlg::GRA_Average,
    }
}

/// Cells needed to cover `length`, ignoring floating-point overshoot
fn pixel_count(length: f64, cell: f64) -> usize {
    (length / cell - 1e-6).ceil().max(1.0) as usize
}

/// Read every band of `dataset` inside `window` into a (layers, rows, cols) array
fn read_bands<T: GeoElement + GdalType>(dataset: &Dataset, window: &Window) -> gdal::errors::Result<Vec<T>> {
    let mut values = Vec::with_capacity(window.layer_count * window.row_count * window.col_count);
    for layer in window.layer_start..window.layer_start + window.layer_count {
        let band = dataset.rasterband((layer + 1) as _)?;
        let buffer = band.read_as::<T>(
            (window.col_start as _, window.row_start as _),
            (window.col_count, window.row_count),
            (window.col_count, window.row_count),
            None,
        )?;
        values.extend(buffer.data);
    }
    Ok(values)
}

/// Copy each layer of `data` into the bands of `dataset`
fn write_bands<T: GeoElement + GdalType>(
    dataset: &Dataset,
    data: ArrayView3<'_, T>,
    no_data: T,
) -> gdal::errors::Result<()> {
    let (_, rows, cols) = data.dim();
    let no_data = num_traits::cast::<T, f64>(no_data);

    for (index, layer) in data.axis_iter(Axis(0)).enumerate() {
        let mut band = dataset.rasterband((index + 1) as _)?;
        let buffer = Buffer::new((cols, rows), layer.iter().copied().collect());
        band.write((0, 0), (cols, rows), &buffer)?;
        band.set_no_data_value(no_data)?;
    }
    Ok(())
}

/// A raster file opened through GDAL
pub struct GdalSource {
    path: PathBuf,
    dataset: Dataset,
}

impl GdalSource {
    pub fn open<P: AsRef<Path>>(path: P) -> GeoResult<Self> {
        let path = path.as_ref().to_path_buf();
        log::info!("Opening raster: {}", path.display());

        let dataset = Dataset::open(&path).map_err(|e| GeoError::backend("open", path.display().to_string(), e))?;
        Ok(Self { path, dataset })
    }

    /// No-data value of the first band, if the file declares one
    pub fn no_data<T: GeoElement>(&self) -> Option<T> {
        let band = self.dataset.rasterband(1).ok()?;
        band.no_data_value().and_then(num_traits::cast)
    }
}

impl<T: GeoElement + GdalType> RasterSource<T> for GdalSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn extent(&self) -> GeoResult<Extent> {
        let geo_transform = self
            .dataset
            .geo_transform()
            .map_err(|e| GeoError::backend("extent", self.path.display().to_string(), e))?;
        let (cols, rows) = self.dataset.raster_size();
        let crs = dataset_crs(&self.dataset).ok_or_else(|| {
            GeoError::backend("extent", self.path.display().to_string(), "dataset has no spatial reference")
        })?;

        Extent::from_geo_transform(geo_transform, rows, cols, crs)
    }

    fn layers(&self) -> usize {
        self.dataset.raster_count() as usize
    }

    fn read(&self, window: Option<Window>) -> GeoResult<Array3<T>> {
        let (cols, rows) = self.dataset.raster_size();
        let layers = <Self as RasterSource<T>>::layers(self);
        let window = window.unwrap_or_else(|| Window::full((layers, rows, cols)));
        window.validate((layers, rows, cols))?;

        log::debug!("Reading window {:?} from {}", window, self.path.display());
        let values = read_bands::<T>(&self.dataset, &window)
            .map_err(|e| GeoError::backend("read", self.path.display().to_string(), e))?;

        Ok(Array3::from_shape_vec(window.shape(), values)?)
    }
}

/// Writes, transforms and warps through GDAL
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalBackend;

impl<T: GeoElement + GdalType> RasterBackend<T> for GdalBackend {
    fn name(&self) -> &str {
        "gdal"
    }

    fn write(
        &self,
        path: &Path,
        data: ArrayView3<'_, T>,
        extent: &Extent,
        no_data: T,
        options: &WriteOptions,
    ) -> GeoResult<()> {
        let context = path.display().to_string();
        let err = |e: gdal::errors::GdalError| GeoError::backend("write", context.clone(), e);
        let (layers, rows, cols) = data.dim();

        let driver = DriverManager::get_driver_by_name(&options.driver).map_err(err)?;
        let creation_options: Vec<RasterCreationOption> = options
            .compression
            .as_deref()
            .map(|value| RasterCreationOption { key: "COMPRESS", value })
            .into_iter()
            .collect();

        let mut dataset = driver
            .create_with_band_type_with_options::<T, _>(path, cols as _, rows as _, layers as _, &creation_options)
            .map_err(err)?;
        dataset.set_geo_transform(&extent.to_geo_transform()).map_err(err)?;
        dataset
            .set_spatial_ref(&spatial_ref(extent.crs()).map_err(err)?)
            .map_err(err)?;

        write_bands(&dataset, data, no_data).map_err(err)?;
        log::info!("Raster written: {}", context);
        Ok(())
    }

    fn transform_point(&self, x: f64, y: f64, source: &Crs, target: &Crs) -> GeoResult<(f64, f64)> {
        let context = format!("{} -> {}", source, target);
        let err = |e: gdal::errors::GdalError| GeoError::backend("transform", context.clone(), e);

        let transform = CoordTransform::new(&spatial_ref(source).map_err(err)?, &spatial_ref(target).map_err(err)?)
            .map_err(err)?;
        let mut xs = [x];
        let mut ys = [y];
        transform.transform_coords(&mut xs, &mut ys, &mut []).map_err(err)?;

        Ok((xs[0], ys[0]))
    }

    fn warp(&self, request: WarpRequest<'_, T>) -> GeoResult<WarpOutput<T>> {
        let context = format!("{} -> {}", request.source_extent.crs(), request.target_crs);
        let err = |e: gdal::errors::GdalError| GeoError::backend("warp", context.clone(), e);

        let (layers, rows, cols) = request.data.dim();
        let (cell_x, cell_y) = request.resolution;
        let bounds = request.target_bounds;
        let out_cols = pixel_count(bounds.right - bounds.left, cell_x);
        let out_rows = pixel_count(bounds.top - bounds.bottom, cell_y);
        let target_extent = Extent::from_origin(
            bounds.left,
            bounds.top,
            cell_x,
            cell_y,
            out_rows,
            out_cols,
            request.target_crs.clone(),
        )?;

        // In-memory datasets are released when dropped at the end of this call
        let driver = DriverManager::get_driver_by_name("MEM").map_err(err)?;

        let mut source = driver
            .create_with_band_type::<T, _>("", cols as _, rows as _, layers as _)
            .map_err(err)?;
        source
            .set_geo_transform(&request.source_extent.to_geo_transform())
            .map_err(err)?;
        source
            .set_spatial_ref(&spatial_ref(request.source_extent.crs()).map_err(err)?)
            .map_err(err)?;
        write_bands(&source, request.data, request.no_data).map_err(err)?;

        let mut target = driver
            .create_with_band_type::<T, _>("", out_cols as _, out_rows as _, layers as _)
            .map_err(err)?;
        target.set_geo_transform(&target_extent.to_geo_transform()).map_err(err)?;
        target
            .set_spatial_ref(&spatial_ref(request.target_crs).map_err(err)?)
            .map_err(err)?;
        let fill = Array3::from_elem((layers, out_rows, out_cols), request.no_data);
        write_bands(&target, fill.view(), request.no_data).map_err(err)?;

        log::debug!(
            "GDALReprojectImage {}x{} -> {}x{} ({:?})",
            rows,
            cols,
            out_rows,
            out_cols,
            request.resampling
        );
        let status = unsafe {
            gdal_sys::GDALReprojectImage(
                source.c_dataset(),
                std::ptr::null(),
                target.c_dataset(),
                std::ptr::null(),
                resample_alg(request.resampling),
                0.0,
                request.max_error,
                None,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if status != gdal_sys::CPLErr::CE_None {
            return Err(GeoError::backend("warp", context.clone(), format!("GDALReprojectImage returned {}", status)));
        }

        let window = Window::full((layers, out_rows, out_cols));
        let values = read_bands::<T>(&target, &window).map_err(err)?;
        let data = Array3::from_shape_vec(window.shape(), values)?;

        Ok(WarpOutput {
            data,
            extent: target_extent,
        })
    }
}
