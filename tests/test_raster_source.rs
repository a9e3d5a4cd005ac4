use approx::assert_relative_eq;
use geoalign::{Crs, Extent, GeoArray, GeoError, MemorySource, RasterSource, Window};
use ndarray::{Array2, Array3};

fn scene() -> MemorySource<u16> {
    let extent = Extent::from_origin(500_000.0, 4_200_000.0, 30.0, 30.0, 8, 12, Crs::Epsg(32611)).unwrap();
    let data = Array3::from_shape_fn((3, 8, 12), |(b, r, c)| (b * 1000 + r * 12 + c) as u16);
    MemorySource::new("landsat", data, extent).unwrap()
}

#[test]
fn test_open_full_scene() {
    let source = scene();
    let garray = GeoArray::from_source(&source, None).unwrap();

    assert_eq!(garray.shape(), (3, 8, 12));
    assert_eq!(garray.layer_names(), &["1", "2", "3"]);
    assert_eq!(garray.extent(), &source.extent().unwrap());
    assert!(garray.backend().is_none());
}

#[test]
fn test_open_window_adjusts_extent() {
    let source = scene();
    let window = Window::new(2, 2, 4, 3, 5);
    let garray = GeoArray::from_source(&source, Some(window)).unwrap();

    assert_eq!(garray.shape(), (2, 4, 5));
    assert_eq!(garray.data()[[1, 0, 0]], 1000 + 2 * 12 + 3);

    let extent = garray.extent();
    assert_relative_eq!(extent.left(), 500_090.0);
    assert_relative_eq!(extent.top(), 4_199_940.0);
    assert_relative_eq!(extent.right(), 500_240.0);
    assert_relative_eq!(extent.bottom(), 4_199_820.0);
    assert_eq!((extent.rows(), extent.columns()), (4, 5));
}

#[test]
fn test_open_window_outside_scene() {
    let source = scene();
    let window = Window::new(3, 6, 4, 0, 12);

    assert!(matches!(
        GeoArray::from_source(&source, Some(window)),
        Err(GeoError::OutOfBounds { .. })
    ));
}

#[test]
fn test_source_as_trait_object() {
    let source: Box<dyn RasterSource<u16>> = Box::new(scene());
    assert_eq!(source.describe(), "memory:landsat");
    assert_eq!(source.layers(), 3);

    let garray = GeoArray::from_source(source.as_ref(), None).unwrap();
    assert_eq!(garray.layers(), 3);
}

#[test]
fn test_mismatched_source_rejected() {
    let extent = Extent::from_origin(0.0, 10.0, 1.0, 1.0, 10, 10, Crs::Epsg(4326)).unwrap();
    let result = MemorySource::from_2d("bad", Array2::<f32>::zeros((9, 10)), extent);

    assert!(matches!(result, Err(GeoError::InvalidExtent(_))));
}

#[test]
fn test_to_raster_without_backend() {
    let garray = GeoArray::from_source(&scene(), None).unwrap();

    let err = garray
        .to_raster("scene.tif", &geoalign::WriteOptions::default())
        .unwrap_err();
    assert!(matches!(err, GeoError::Backend { operation: "write", .. }));
}

#[test]
fn test_coordinates_follow_window() {
    let source = scene();
    let garray = GeoArray::from_source(&source, Some(Window::new(1, 1, 2, 2, 3))).unwrap();
    let (x, y) = garray.to_coordinates();

    assert_eq!(x.dim(), (2, 3));
    assert_relative_eq!(x[[0, 0]], 500_060.0);
    assert_relative_eq!(x[[1, 2]], 500_120.0);
    assert_relative_eq!(y[[0, 0]], 4_199_970.0);
    assert_relative_eq!(y[[1, 2]], 4_199_940.0);
}
