//! Moving-image value/derivative evaluation paths.

use regkit_core::image::Image;
use regkit_core::interpolation::BSplineInterpolator;
use regkit_core::spatial::{Direction, Point, Spacing};
use regkit_core::transform::TranslationTransform;
use regkit_metric::{AdvancedMetric, ExponentialLimiter, HardLimiter, MetricConfig};

fn smooth_image(shape: [usize; 2]) -> Image<2> {
    Image::from_fn(
        shape,
        Point::origin(),
        Spacing::uniform(1.0),
        Direction::identity(),
        |idx| {
            let x = idx[0] as f64;
            let y = idx[1] as f64;
            50.0 + 20.0 * (0.4 * x).sin() + 10.0 * (0.3 * y).cos()
        },
    )
}

fn metric_with(config: MetricConfig) -> AdvancedMetric<2> {
    let mut metric = AdvancedMetric::new(config);
    metric.set_fixed_image(smooth_image([16, 16]));
    metric.set_moving_image(smooth_image([16, 16]));
    metric.set_transform(Box::new(TranslationTransform::<2>::identity()));
    metric
}

#[test]
fn outside_moving_domain_returns_none() {
    let mut metric = metric_with(MetricConfig::default());
    metric.initialize().unwrap();
    for point in [
        Point::new([-0.5, 8.0]),
        Point::new([8.0, 15.5]),
        Point::new([200.0, 200.0]),
    ] {
        assert!(metric
            .evaluate_moving_value_and_derivative(&point, true)
            .unwrap()
            .is_none());
    }
    // The domain boundary itself is still defined.
    assert!(metric
        .evaluate_moving_value_and_derivative(&Point::new([15.0, 15.0]), false)
        .unwrap()
        .is_some());
}

#[test]
fn numeric_and_analytic_gradients_agree_on_smooth_data() {
    let mut numeric = metric_with(MetricConfig::default());
    numeric.initialize().unwrap();

    let mut analytic = metric_with(MetricConfig::default());
    analytic.set_interpolator(Box::new(BSplineInterpolator::new()));
    analytic.initialize().unwrap();

    for point in [Point::new([7.0, 7.0]), Point::new([4.0, 10.0])] {
        let n = numeric
            .evaluate_moving_value_and_derivative(&point, true)
            .unwrap()
            .unwrap();
        let a = analytic
            .evaluate_moving_value_and_derivative(&point, true)
            .unwrap()
            .unwrap();
        assert!((n.value - a.value).abs() < 1.0);
        let ng = n.derivative.unwrap();
        let ag = a.derivative.unwrap();
        for d in 0..2 {
            // Forward differences on a unit grid are first-order accurate,
            // so agreement is coarse on this curvature.
            assert!(
                (ng[d] - ag[d]).abs() < 2.0,
                "gradient mismatch at {point:?} axis {d}: {} vs {}",
                ng[d],
                ag[d]
            );
        }
    }
}

#[test]
fn value_without_derivative_omits_gradient() {
    let mut metric = metric_with(MetricConfig::default());
    metric.initialize().unwrap();
    let result = metric
        .evaluate_moving_value_and_derivative(&Point::new([5.0, 5.0]), false)
        .unwrap()
        .unwrap();
    assert!(result.derivative.is_none());
}

#[test]
fn hard_limiter_keeps_step_edge_values_in_true_range() {
    let step = Image::from_fn(
        [16, 16],
        Point::origin(),
        Spacing::uniform(1.0),
        Direction::identity(),
        |idx| if idx[0] >= 8 { 100.0 } else { 0.0 },
    );
    let mut metric = AdvancedMetric::new(
        MetricConfig::default()
            .with_moving_limiter(true)
            .with_moving_limit_range_ratio(0.0),
    );
    metric.set_fixed_image(step.clone());
    metric.set_moving_image(step);
    metric.set_transform(Box::new(TranslationTransform::<2>::identity()));
    metric.set_interpolator(Box::new(BSplineInterpolator::new()));
    metric.set_moving_limiter(Box::new(HardLimiter::new()));
    metric.initialize().unwrap();

    // With zero range ratio the limits equal the true extrema, so every
    // value across the step edge must land in [0, 100] with a gradient.
    for k in 0..20 {
        let point = Point::new([6.0 + 0.25 * k as f64, 8.0]);
        let result = metric
            .evaluate_moving_value_and_derivative(&point, true)
            .unwrap()
            .unwrap();
        assert!((0.0..=100.0).contains(&result.value));
        assert!(result.derivative.is_some());
    }
}

#[test]
fn exponential_limiter_keeps_values_in_band() {
    let mut metric = metric_with(
        MetricConfig::default()
            .with_moving_limiter(true)
            .with_moving_limit_range_ratio(0.01),
    );
    metric.set_interpolator(Box::new(BSplineInterpolator::new()));
    metric.set_moving_limiter(Box::new(ExponentialLimiter::new()));
    metric.initialize().unwrap();

    // Image range is within [20, 80]; the band adds 1% of the range.
    for i in 0..15 {
        for j in 0..15 {
            let point = Point::new([i as f64 + 0.5, j as f64 + 0.5]);
            let value = metric
                .evaluate_moving_value_and_derivative(&point, false)
                .unwrap()
                .unwrap()
                .value;
            assert!(value > 19.0 && value < 81.0, "value {value} out of band");
        }
    }
}
