use crate::core::geo_array::GeoArray;
use crate::io::backend::WarpRequest;
use crate::types::{Bounds, Crs, GeoElement, GeoError, GeoResult, Resampling};
use serde::{Deserialize, Serialize};

/// Reprojection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReprojectOptions {
    /// Destination bounds in the target CRS; derived from the corners when unset
    pub output_bounds: Option<Bounds>,
    /// Destination (cell_x, cell_y); by default the destination bounds are
    /// split into as many rows and columns as the source has
    pub resolution: Option<(f64, f64)>,
    pub resampling: Resampling,
    /// Maximum error in pixels for approximate transforms
    pub max_error: f64,
}

impl Default for ReprojectOptions {
    fn default() -> Self {
        Self {
            output_bounds: None,
            resolution: None,
            resampling: Resampling::Nearest,
            max_error: 0.125,
        }
    }
}

impl<T: GeoElement> GeoArray<T> {
    /// Warp into `target` through the attached backend.
    ///
    /// The result keeps this array's no-data value, layer names and backend.
    pub fn to_crs(&self, target: &Crs, options: &ReprojectOptions) -> GeoResult<GeoArray<T>> {
        let backend = self
            .backend()
            .ok_or_else(|| GeoError::backend("warp", self.crs().to_string(), "no backend attached"))?;

        let bounds = match options.output_bounds {
            Some(bounds) => bounds,
            None => self.transformed_bounds(target)?,
        };
        if !bounds.is_valid() {
            return Err(GeoError::InvalidExtent(format!(
                "destination bounds {} in {} are empty",
                bounds, target
            )));
        }

        let resolution = options.resolution.unwrap_or((
            (bounds.right - bounds.left) / self.columns() as f64,
            (bounds.top - bounds.bottom) / self.rows() as f64,
        ));

        log::info!(
            "Warping {:?} from {} to {} via {}",
            self.shape(),
            self.crs(),
            target,
            backend.name()
        );
        log::debug!("Destination bounds {} at resolution {:?}", bounds, resolution);

        let output = backend.warp(WarpRequest {
            data: self.data().view(),
            source_extent: self.extent(),
            target_crs: target,
            target_bounds: bounds,
            resolution,
            no_data: self.no_data(),
            resampling: options.resampling,
            max_error: options.max_error,
        })?;

        self.derive(output.data, output.extent, self.layer_names().to_vec())
    }

    /// Bounds spanned by the transformed upper-left and lower-right corners
    fn transformed_bounds(&self, target: &Crs) -> GeoResult<Bounds> {
        let backend = self
            .backend()
            .ok_or_else(|| GeoError::backend("transform", self.crs().to_string(), "no backend attached"))?;
        let extent = self.extent();

        let (x0, y0) = backend.transform_point(extent.left(), extent.top(), extent.crs(), target)?;
        let (x1, y1) = backend.transform_point(extent.right(), extent.bottom(), extent.crs(), target)?;

        Ok(Bounds::new(x0.min(x1), x0.max(x1), y0.max(y1), y0.min(y1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extent::Extent;
    use ndarray::Array2;

    #[test]
    fn test_to_crs_without_backend() {
        let extent = Extent::from_origin(0.0, 2.0, 1.0, 1.0, 2, 2, Crs::Epsg(4326)).unwrap();
        let garray = GeoArray::from_2d(Array2::<f32>::zeros((2, 2)), extent).unwrap();

        let err = garray
            .to_crs(&Crs::Epsg(3857), &ReprojectOptions::default())
            .unwrap_err();
        assert!(matches!(err, GeoError::Backend { operation: "warp", .. }));
    }

    #[test]
    fn test_default_options() {
        let options = ReprojectOptions::default();
        assert!(options.output_bounds.is_none());
        assert_eq!(options.resampling, Resampling::Nearest);
    }
}
