use approx::assert_relative_eq;
use geoalign::{Crs, ExtractWindow, Extent, GeoArray, GeoError, Operator, Policy};
use ndarray::{Array2, Array3};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn constant(left: f64, top: f64, rows: usize, cols: usize, value: f64) -> GeoArray<f64> {
    let extent = Extent::from_origin(left, top, 1.0, 1.0, rows, cols, Crs::Epsg(32633)).unwrap();
    GeoArray::from_2d(Array2::from_elem((rows, cols), value), extent).unwrap()
}

fn gradient(left: f64, top: f64, rows: usize, cols: usize) -> GeoArray<f64> {
    let extent = Extent::from_origin(left, top, 1.0, 1.0, rows, cols, Crs::Epsg(32633)).unwrap();
    let data = Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f64 * 0.5);
    GeoArray::from_2d(data, extent).unwrap()
}

#[test]
fn test_add_intersection_scenario() {
    init_logging();

    let a = constant(0.0, 10.0, 10, 10, 5.0);
    let b = constant(5.0, 10.0, 10, 10, 3.0);

    let result = a.geo_combine(&b, Operator::Add, Policy::Intersection).unwrap();

    assert_eq!(result.rows(), 10);
    assert_eq!(result.columns(), 5);
    assert!(result.data().iter().all(|&v| v == 8.0));

    let extent = result.extent();
    assert_relative_eq!(extent.left(), 5.0);
    assert_relative_eq!(extent.right(), 10.0);
    assert_relative_eq!(extent.top(), 10.0);
    assert_relative_eq!(extent.bottom(), 0.0);
}

#[test]
fn test_mask_scenario() {
    init_logging();

    let mut garray = constant(0.0, 10.0, 10, 10, 7.0);
    assert_eq!(garray.no_data(), 0.0);

    let stencil_extent = garray.extent().bounds_for(2, 3, 2, 3).unwrap();
    let stencil = GeoArray::from_2d(Array2::from_elem((3, 3), 1u8), stencil_extent).unwrap();

    garray.mask(&stencil).unwrap();

    for ((_, r, c), &value) in garray.data().indexed_iter() {
        if (2..=4).contains(&r) && (2..=4).contains(&c) {
            assert_eq!(value, 0.0, "cell ({}, {}) should be masked", r, c);
        } else {
            assert_eq!(value, 7.0, "cell ({}, {}) should be untouched", r, c);
        }
    }
}

#[test]
fn test_mask_is_idempotent() {
    let stencil = constant(3.0, 8.0, 4, 5, 1.0);

    let mut once = gradient(0.0, 10.0, 10, 10).with_no_data(-1.0);
    once.mask(&stencil).unwrap();

    let mut twice = once.clone();
    twice.mask(&stencil).unwrap();

    assert_eq!(once.data(), twice.data());
}

#[test]
fn test_mask_disjoint_stencil() {
    let mut garray = constant(0.0, 10.0, 10, 10, 7.0);
    let stencil = constant(20.0, 10.0, 2, 2, 1.0);

    assert!(matches!(garray.mask(&stencil), Err(GeoError::NoOverlap { .. })));
    assert!(garray.data().iter().all(|&v| v == 7.0));
}

#[test]
fn test_identity_extraction() {
    let garray = gradient(100.0, 50.0, 6, 8);

    let same = garray
        .extract(ExtractWindow::rows(0, garray.rows()).with_cols(0, garray.columns()))
        .unwrap();
    assert_eq!(same.data(), garray.data());
    assert_eq!(same.extent(), garray.extent());

    let defaulted = garray.extract(ExtractWindow::default()).unwrap();
    assert_eq!(defaulted.data(), garray.data());
    assert_eq!(defaulted.extent(), garray.extent());
}

#[test]
fn test_extract_past_last_row() {
    let garray = gradient(0.0, 10.0, 10, 10);

    let result = garray.extract(ExtractWindow::rows(4, 7));
    assert!(matches!(result, Err(GeoError::OutOfBounds { .. })));
}

#[test]
fn test_self_subtraction_is_zero() {
    let garray = gradient(-20.0, 30.0, 7, 9);

    let result = garray.geo_subtract(&garray, Policy::Intersection).unwrap();
    assert!(result.data().iter().all(|&v| v == 0.0));
    assert_eq!(result.extent(), garray.extent());
}

#[test]
fn test_subtraction_is_anti_symmetric() {
    let g1 = gradient(0.0, 10.0, 10, 10);
    let g2 = constant(4.0, 13.0, 8, 9, 2.5);

    let forward = g1.geo_combine(&g2, Operator::Subtract, Policy::Intersection).unwrap();
    let backward = g2.geo_combine(&g1, Operator::Subtract, Policy::Intersection).unwrap();

    assert_eq!(forward.shape(), backward.shape());
    assert!(forward.extent().approx_eq(backward.extent(), 1e-9));
    for (f, b) in forward.data().iter().zip(backward.data().iter()) {
        assert_relative_eq!(*f, -*b);
    }
}

#[test]
fn test_disjoint_intersection_fails() {
    let a = constant(0.0, 10.0, 10, 10, 1.0);
    let b = constant(10.0, 10.0, 10, 10, 1.0);

    assert!(matches!(
        a.geo_combine(&b, Operator::Add, Policy::Intersection),
        Err(GeoError::NoOverlap { .. })
    ));
}

#[test]
fn test_extent_policy_leaves_rest_unchanged() {
    let a = gradient(0.0, 10.0, 10, 10);
    let b = constant(6.0, 6.0, 10, 10, 100.0);

    let result = a.geo_add(&b, Policy::Extent).unwrap();
    assert_eq!(result.extent(), a.extent());

    for ((_, r, c), &value) in result.data().indexed_iter() {
        let original = a.data()[[0, r, c]];
        if r >= 4 && c >= 6 {
            assert_relative_eq!(value, original + 100.0);
        } else {
            assert_relative_eq!(value, original);
        }
    }
}

#[test]
fn test_policy_from_user_string() {
    let a = constant(0.0, 4.0, 4, 4, 1.0);
    let b = constant(2.0, 4.0, 4, 4, 1.0);

    let policy: Policy = "intersection".parse().unwrap();
    assert_eq!(a.geo_add(&b, policy).unwrap().columns(), 2);

    assert!(matches!("nearest".parse::<Policy>(), Err(GeoError::UnsupportedPolicy(_))));
}

#[test]
fn test_multilayer_union_keeps_names() {
    let extent = Extent::from_origin(0.0, 2.0, 1.0, 1.0, 2, 2, Crs::Epsg(4326)).unwrap();
    let stack = GeoArray::new(Array3::from_elem((2, 2, 2), 1i32), extent)
        .unwrap()
        .with_layer_names(vec!["red", "nir"])
        .unwrap()
        .with_no_data(-1);

    let shifted_extent = Extent::from_origin(1.0, 2.0, 1.0, 1.0, 2, 2, Crs::Epsg(4326)).unwrap();
    let other = GeoArray::from_2d(Array2::from_elem((2, 2), 10i32), shifted_extent).unwrap();

    let result = stack.geo_combine(&other, Operator::Add, Policy::Union).unwrap();
    assert_eq!(result.shape(), (2, 2, 3));
    assert_eq!(result.layer_names(), &["red".to_string(), "nir".to_string()]);

    let nir = result.layer_by_name("nir").unwrap();
    assert_eq!(nir[[0, 0]], 1);
    assert_eq!(nir[[0, 1]], 11);
    assert_eq!(nir[[1, 2]], 10);
}

#[test]
fn test_non_square_pixels() {
    let coarse = Extent::new(0.0, 8.0, 4.0, 0.0, 2.0, 1.0, Crs::Epsg(3857)).unwrap();
    let a = GeoArray::from_2d(Array2::from_elem((4, 4), 2.0f32), coarse).unwrap();

    let other = Extent::new(4.0, 12.0, 4.0, 0.0, 2.0, 1.0, Crs::Epsg(3857)).unwrap();
    let b = GeoArray::from_2d(Array2::from_elem((4, 4), 3.0f32), other).unwrap();

    let result = a.geo_multiply(&b, Policy::Intersection).unwrap();
    assert_eq!((result.rows(), result.columns()), (4, 2));
    assert_relative_eq!(result.extent().left(), 4.0);
    assert_relative_eq!(result.extent().right(), 8.0);
    assert!(result.data().iter().all(|&v| v == 6.0));
}

fn halves(cell: f64, size: usize, left_value: f64, right_value: f64) -> GeoArray<f64> {
    let extent = Extent::from_origin(0.0, 10.0, cell, cell, size, size, Crs::Epsg(32633)).unwrap();
    let data = Array2::from_shape_fn((size, size), |(_, c)| if c < size / 2 { left_value } else { right_value });
    GeoArray::from_2d(data, extent).unwrap()
}

#[test]
fn test_finer_operand_aligns_geographically() {
    init_logging();

    let a = constant(0.0, 10.0, 10, 10, 0.0);
    let b = halves(0.5, 20, 1.0, 100.0);

    let result = a.geo_combine(&b, Operator::Add, Policy::Intersection).unwrap();
    assert_eq!(result.shape(), (1, 10, 10));
    assert_eq!(result.extent(), a.extent());
    for ((_, _, c), &value) in result.data().indexed_iter() {
        let expected = if c < 5 { 1.0 } else { 100.0 };
        assert_eq!(value, expected, "column {}", c);
    }
}

#[test]
fn test_coarser_operand_aligns_geographically() {
    let fine = halves(0.5, 20, 1.0, 100.0);
    let coarse = gradient(0.0, 10.0, 10, 10);

    let result = fine.geo_combine(&coarse, Operator::Subtract, Policy::Intersection).unwrap();
    assert_eq!(result.shape(), (1, 20, 20));
    assert_eq!(result.extent(), fine.extent());

    // Fine cell (r, c) lies inside coarse cell (r / 2, c / 2)
    for ((_, r, c), &value) in result.data().indexed_iter() {
        let left = if c < 10 { 1.0 } else { 100.0 };
        assert_relative_eq!(value, left - coarse.data()[[0, r / 2, c / 2]]);
    }
}

#[test]
fn test_union_with_coarser_operand() {
    let a = constant(0.0, 4.0, 4, 4, 1.0).with_no_data(-1.0);
    let extent = Extent::from_origin(2.0, 4.0, 2.0, 2.0, 2, 2, Crs::Epsg(32633)).unwrap();
    let b = GeoArray::from_2d(Array2::from_elem((2, 2), 10.0), extent).unwrap();

    let result = a.geo_combine(&b, Operator::Add, Policy::Union).unwrap();
    assert_eq!(result.shape(), (1, 4, 6));
    assert_relative_eq!(result.extent().cell_x(), 1.0);
    assert_relative_eq!(result.extent().right(), 6.0);

    for ((_, r, c), &value) in result.data().indexed_iter() {
        let expected = match c {
            0 | 1 => 1.0,
            2 | 3 => 11.0,
            _ => 10.0,
        };
        assert_eq!(value, expected, "cell ({}, {})", r, c);
    }
}

#[test]
fn test_integer_overflow_wraps() {
    let extent = Extent::from_origin(0.0, 2.0, 1.0, 1.0, 2, 2, Crs::Epsg(4326)).unwrap();
    let a = GeoArray::from_2d(Array2::from_elem((2, 2), 200u8), extent.clone()).unwrap();
    let b = GeoArray::from_2d(Array2::from_elem((2, 2), 100u8), extent).unwrap();

    let sum = a.geo_add(&b, Policy::Intersection).unwrap();
    assert!(sum.data().iter().all(|&v| v == 44));

    let difference = b.geo_subtract(&a, Policy::Extent).unwrap();
    assert!(difference.data().iter().all(|&v| v == 156));
}
