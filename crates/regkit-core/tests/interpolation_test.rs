use regkit_core::image::Image;
use regkit_core::interpolation::{
    BSplineInterpolator, DerivativeCapability, Interpolator, LinearInterpolator,
    NearestNeighborInterpolator,
};
use regkit_core::spatial::{Direction, Point, Spacing};

fn ramp_3d() -> Image<3> {
    Image::from_fn(
        [8, 8, 8],
        Point::origin(),
        Spacing::uniform(1.0),
        Direction::identity(),
        |idx| idx[0] as f64 + 2.0 * idx[1] as f64 - 0.5 * idx[2] as f64,
    )
}

#[test]
fn test_all_interpolators_agree_on_ramp_interior() {
    let image = ramp_3d();
    let p = Point::new([3.0, 4.0, 2.0]);
    let expected = 3.0 + 8.0 - 1.0;

    let nearest = NearestNeighborInterpolator::new();
    let linear = LinearInterpolator::new();
    let bspline = BSplineInterpolator::new();

    assert!((nearest.evaluate(&image, &p) - expected).abs() < 1e-12);
    assert!((linear.evaluate(&image, &p) - expected).abs() < 1e-12);
    assert!((bspline.evaluate(&image, &p) - expected).abs() < 1e-9);
}

#[test]
fn test_linear_and_bspline_agree_on_ramp_off_grid() {
    let image = ramp_3d();
    let p = Point::new([3.25, 4.5, 2.75]);
    let expected = 3.25 + 2.0 * 4.5 - 0.5 * 2.75;

    let linear = LinearInterpolator::new();
    let bspline = BSplineInterpolator::new();
    assert!((linear.evaluate(&image, &p) - expected).abs() < 1e-12);
    assert!((bspline.evaluate(&image, &p) - expected).abs() < 1e-9);
}

#[test]
fn test_capability_probe() {
    assert_eq!(
        Interpolator::<3>::derivative_capability(&LinearInterpolator::new()),
        DerivativeCapability::Numeric
    );
    assert_eq!(
        Interpolator::<3>::derivative_capability(&BSplineInterpolator::new()),
        DerivativeCapability::Analytic
    );
}

#[test]
fn test_bspline_gradient_on_3d_ramp() {
    let image = ramp_3d();
    let bspline = BSplineInterpolator::new();
    let (value, gradient) = bspline
        .evaluate_with_derivative(&image, &Point::new([3.5, 3.5, 3.5]))
        .expect("analytic interpolator returns a gradient");
    assert!((value - (3.5 + 7.0 - 1.75)).abs() < 1e-9);
    assert!((gradient[0] - 1.0).abs() < 1e-9);
    assert!((gradient[1] - 2.0).abs() < 1e-9);
    assert!((gradient[2] + 0.5).abs() < 1e-9);
}
