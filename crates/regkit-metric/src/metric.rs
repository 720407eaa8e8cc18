//! Metric evaluation orchestrator.
//!
//! `AdvancedMetric` owns the collaborators shared by concrete similarity
//! metrics (transform, interpolator, sampler, limiters, differentiable
//! mask) and the initialization logic that wires them up for a given
//! fixed/moving image pair. Concrete metrics call its per-point operations
//! from their evaluation loops; this type never computes a similarity value
//! itself.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use regkit_core::image::{Image, Region};
use regkit_core::interpolation::{DerivativeCapability, Interpolator, LinearInterpolator};
use regkit_core::spatial::{Point, Vector};
use regkit_core::transform::Transform;

use crate::error::{MetricError, Result};
use crate::gradient::ForwardDifferenceGradient;
use crate::limiter::{compute_extrema, limit_bounds, IntensityLimiter};
use crate::mask::DifferentiableMask;
use crate::sampler::{FullGridSampler, ImageSample, ImageSampler};
use crate::scratch::{JacobianScratch, TransformJacobian};

/// Feature switches and tuning knobs for metric evaluation.
///
/// Defaults mirror common registration practice: a quarter of the drawn
/// samples must map inside the moving image, masks are smoothed with a
/// quadratic spline, and limiter bands extend the true intensity range by
/// one percent on each side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Draw samples through the configured sampler instead of visiting the
    /// full fixed grid.
    pub use_sampler: bool,
    /// Build a differentiable moving mask during initialization.
    pub use_differentiable_overlap: bool,
    /// Limit fixed-image intensities through the configured limiter.
    pub use_fixed_limiter: bool,
    /// Limit interpolated moving-image intensities through the configured
    /// limiter.
    pub use_moving_limiter: bool,
    /// Minimum fraction of drawn samples that must produce usable values.
    pub required_ratio_of_valid_samples: f64,
    /// Spline order for the differentiable mask.
    pub mask_interpolation_order: usize,
    /// Fixed-limiter band width as a fraction of the true intensity range.
    pub fixed_limit_range_ratio: f64,
    /// Moving-limiter band width as a fraction of the true intensity range.
    pub moving_limit_range_ratio: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            use_sampler: false,
            use_differentiable_overlap: false,
            use_fixed_limiter: false,
            use_moving_limiter: false,
            required_ratio_of_valid_samples: 0.25,
            mask_interpolation_order: 2,
            fixed_limit_range_ratio: 0.01,
            moving_limit_range_ratio: 0.01,
        }
    }
}

impl MetricConfig {
    pub fn with_sampler(mut self, enabled: bool) -> Self {
        self.use_sampler = enabled;
        self
    }

    pub fn with_differentiable_overlap(mut self, enabled: bool) -> Self {
        self.use_differentiable_overlap = enabled;
        self
    }

    pub fn with_fixed_limiter(mut self, enabled: bool) -> Self {
        self.use_fixed_limiter = enabled;
        self
    }

    pub fn with_moving_limiter(mut self, enabled: bool) -> Self {
        self.use_moving_limiter = enabled;
        self
    }

    pub fn with_required_ratio_of_valid_samples(mut self, ratio: f64) -> Self {
        self.required_ratio_of_valid_samples = ratio;
        self
    }

    pub fn with_mask_interpolation_order(mut self, order: usize) -> Self {
        self.mask_interpolation_order = order;
        self
    }

    pub fn with_fixed_limit_range_ratio(mut self, ratio: f64) -> Self {
        self.fixed_limit_range_ratio = ratio;
        self
    }

    pub fn with_moving_limit_range_ratio(mut self, ratio: f64) -> Self {
        self.moving_limit_range_ratio = ratio;
        self
    }
}

/// Interpolated moving-image value at a mapped point, with its spatial
/// gradient when requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingValue<const D: usize> {
    /// Interpolated (and possibly limited) intensity.
    pub value: f64,
    /// Spatial gradient in physical space, scaled by the limiter's chain
    /// factor. `None` when no derivative was requested.
    pub derivative: Option<Vector<D>>,
}

/// How the transform's Jacobian is evaluated per point.
#[derive(Debug, Clone, Copy)]
enum SupportClassification {
    /// Every parameter can influence every point.
    Dense,
    /// A bounded window of parameters influences each point.
    Local { support_size: usize },
}

/// Where moving-image spatial derivatives come from.
enum DerivativeSource<const D: usize> {
    /// The interpolator differentiates its own kernel.
    Analytic,
    /// Precomputed forward differences, read at the nearest voxel.
    ForwardDifference(ForwardDifferenceGradient<D>),
}

/// True intensity extrema and the derived limiter bounds.
#[derive(Debug, Clone, Copy)]
struct IntensityRange {
    true_min: f64,
    true_max: f64,
    min_limit: f64,
    max_limit: f64,
}

/// Everything resolved by a successful `initialize` call.
struct InitializedState<const D: usize> {
    parameter_count: usize,
    support: SupportClassification,
    derivative_source: DerivativeSource<D>,
    internal_mask: Option<DifferentiableMask<D>>,
    fixed_range: Option<IntensityRange>,
    moving_range: Option<IntensityRange>,
    fixed_region: Region<D>,
}

/// Shared evaluation core for similarity metrics.
pub struct AdvancedMetric<const D: usize> {
    config: MetricConfig,
    fixed_image: Option<Image<D>>,
    moving_image: Option<Image<D>>,
    fixed_region: Option<Region<D>>,
    moving_mask: Option<Image<D>>,
    transform: Option<Box<dyn Transform<D>>>,
    interpolator: Box<dyn Interpolator<D>>,
    sampler: Option<Box<dyn ImageSampler<D>>>,
    fixed_limiter: Option<Box<dyn IntensityLimiter>>,
    moving_limiter: Option<Box<dyn IntensityLimiter>>,
    state: Option<InitializedState<D>>,
}

impl<const D: usize> Default for AdvancedMetric<D> {
    fn default() -> Self {
        Self::new(MetricConfig::default())
    }
}

impl<const D: usize> AdvancedMetric<D> {
    pub fn new(config: MetricConfig) -> Self {
        Self {
            config,
            fixed_image: None,
            moving_image: None,
            fixed_region: None,
            moving_mask: None,
            transform: None,
            interpolator: Box::new(LinearInterpolator::new()),
            sampler: None,
            fixed_limiter: None,
            moving_limiter: None,
            state: None,
        }
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    /// Any setter drops the initialized state; `initialize` must be called
    /// again before evaluation.
    pub fn set_fixed_image(&mut self, image: Image<D>) {
        self.fixed_image = Some(image);
        self.state = None;
    }

    pub fn set_moving_image(&mut self, image: Image<D>) {
        self.moving_image = Some(image);
        self.state = None;
    }

    /// Restrict sampling and fixed-extrema scans to a sub-region of the
    /// fixed image. Defaults to the full extent.
    pub fn set_fixed_region(&mut self, region: Region<D>) {
        self.fixed_region = Some(region);
        self.state = None;
    }

    /// Binary mask over (a region of) moving space, rasterized into the
    /// differentiable mask at initialization.
    pub fn set_moving_mask(&mut self, mask: Image<D>) {
        self.moving_mask = Some(mask);
        self.state = None;
    }

    pub fn set_transform(&mut self, transform: Box<dyn Transform<D>>) {
        self.transform = Some(transform);
        self.state = None;
    }

    pub fn set_interpolator(&mut self, interpolator: Box<dyn Interpolator<D>>) {
        self.interpolator = interpolator;
        self.state = None;
    }

    pub fn set_sampler(&mut self, sampler: Box<dyn ImageSampler<D>>) {
        self.sampler = Some(sampler);
        self.state = None;
    }

    pub fn set_fixed_limiter(&mut self, limiter: Box<dyn IntensityLimiter>) {
        self.fixed_limiter = Some(limiter);
        self.state = None;
    }

    pub fn set_moving_limiter(&mut self, limiter: Box<dyn IntensityLimiter>) {
        self.moving_limiter = Some(limiter);
        self.state = None;
    }

    pub fn transform(&self) -> Option<&dyn Transform<D>> {
        self.transform.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Replace the transform parameters between evaluation passes.
    ///
    /// Updating parameters keeps the initialized state valid but stales any
    /// scratch caches; callers holding a [`JacobianScratch`] must invalidate
    /// it.
    pub fn set_transform_parameters(&mut self, parameters: &[f64]) -> Result<()> {
        let transform = self
            .transform
            .as_deref_mut()
            .ok_or_else(|| MetricError::configuration("no transform set"))?;
        if parameters.len() != transform.parameter_count() {
            return Err(MetricError::configuration(format!(
                "parameter length {} does not match transform parameter count {}",
                parameters.len(),
                transform.parameter_count()
            )));
        }
        transform.set_parameters(parameters);
        Ok(())
    }

    /// Validate collaborators and precompute per-registration state.
    ///
    /// Fails fast with a configuration error naming the first missing or
    /// inconsistent collaborator. Must be called before any evaluation
    /// operation, and again after any setter.
    pub fn initialize(&mut self) -> Result<()> {
        let fixed = self
            .fixed_image
            .as_ref()
            .ok_or_else(|| MetricError::configuration("no fixed image set"))?;
        let moving = self
            .moving_image
            .as_ref()
            .ok_or_else(|| MetricError::configuration("no moving image set"))?;

        let fixed_region = match self.fixed_region {
            Some(region) => {
                if !region.is_inside(&fixed.largest_region()) {
                    return Err(MetricError::configuration(
                        "fixed region extends outside the fixed image",
                    ));
                }
                region
            }
            None => fixed.largest_region(),
        };
        if fixed_region.num_pixels() == 0 {
            return Err(MetricError::configuration("fixed region is empty"));
        }

        let transform = self
            .transform
            .as_deref()
            .ok_or_else(|| MetricError::configuration("no transform set"))?;
        let parameter_count = transform.parameter_count();
        if parameter_count == 0 {
            return Err(MetricError::configuration("transform has no parameters"));
        }
        let support = match transform.local_support() {
            Some(local) => SupportClassification::Local {
                support_size: local.support_size(),
            },
            None => SupportClassification::Dense,
        };
        debug!(parameter_count, ?support, "classified transform support");

        let derivative_source = match self.interpolator.derivative_capability() {
            DerivativeCapability::Analytic => DerivativeSource::Analytic,
            DerivativeCapability::Numeric => {
                debug!("precomputing forward-difference gradient field");
                DerivativeSource::ForwardDifference(ForwardDifferenceGradient::new(moving))
            }
        };

        if self.config.use_sampler {
            let sampler = self
                .sampler
                .as_deref_mut()
                .ok_or_else(|| MetricError::configuration("sampling enabled but no sampler set"))?;
            sampler.prepare(fixed, &fixed_region)?;
        }

        let fixed_range = if self.config.use_fixed_limiter {
            let limiter = self
                .fixed_limiter
                .as_deref_mut()
                .ok_or_else(|| {
                    MetricError::configuration("fixed limiter enabled but no limiter set")
                })?;
            let (true_min, true_max) = compute_extrema(fixed, &fixed_region);
            let (min_limit, max_limit) =
                limit_bounds(true_min, true_max, self.config.fixed_limit_range_ratio);
            limiter.set_range(true_min, true_max, min_limit, max_limit);
            debug!(true_min, true_max, min_limit, max_limit, "fixed limiter range");
            Some(IntensityRange {
                true_min,
                true_max,
                min_limit,
                max_limit,
            })
        } else {
            None
        };

        let moving_range = if self.config.use_moving_limiter {
            let limiter = self
                .moving_limiter
                .as_deref_mut()
                .ok_or_else(|| {
                    MetricError::configuration("moving limiter enabled but no limiter set")
                })?;
            let (true_min, true_max) = compute_extrema(moving, &moving.largest_region());
            let (min_limit, max_limit) =
                limit_bounds(true_min, true_max, self.config.moving_limit_range_ratio);
            limiter.set_range(true_min, true_max, min_limit, max_limit);
            debug!(true_min, true_max, min_limit, max_limit, "moving limiter range");
            Some(IntensityRange {
                true_min,
                true_max,
                min_limit,
                max_limit,
            })
        } else {
            None
        };

        let internal_mask = if self.config.use_differentiable_overlap {
            debug!(
                order = self.config.mask_interpolation_order,
                "rasterizing differentiable moving mask"
            );
            Some(DifferentiableMask::new(
                moving,
                self.moving_mask.as_ref(),
                self.config.mask_interpolation_order,
            ))
        } else {
            None
        };

        self.state = Some(InitializedState {
            parameter_count,
            support,
            derivative_source,
            internal_mask,
            fixed_range,
            moving_range,
            fixed_region,
        });
        Ok(())
    }

    fn state(&self) -> Result<&InitializedState<D>> {
        self.state
            .as_ref()
            .ok_or_else(|| MetricError::configuration("metric not initialized"))
    }

    /// The sampling region resolved at initialization.
    pub fn fixed_region(&self) -> Result<Region<D>> {
        Ok(self.state()?.fixed_region)
    }

    /// Allocate a scratch buffer sized for the current transform.
    ///
    /// One per evaluation thread; reused across samples and evaluation
    /// passes until the transform itself is replaced.
    pub fn new_scratch(&self) -> Result<JacobianScratch<D>> {
        let state = self.state()?;
        Ok(match state.support {
            SupportClassification::Dense => JacobianScratch::dense(state.parameter_count),
            SupportClassification::Local { support_size } => JacobianScratch::local(support_size),
        })
    }

    /// Map a fixed-space point to moving space.
    ///
    /// Returns the mapped point and whether the point lies inside the
    /// transform's support region. For locally-supported transforms the
    /// basis weights and nonzero indices are cached in `scratch`, so a
    /// following [`evaluate_transform_jacobian`](Self::evaluate_transform_jacobian)
    /// for the same point costs only the block fill.
    pub fn transform_point(
        &self,
        point: &Point<D>,
        scratch: &mut JacobianScratch<D>,
    ) -> Result<(Point<D>, bool)> {
        let state = self.state()?;
        let transform = self
            .transform
            .as_deref()
            .ok_or_else(|| MetricError::configuration("no transform set"))?;
        match state.support {
            SupportClassification::Dense => {
                scratch.valid_for = Some(*point);
                scratch.inside = true;
                Ok((transform.transform_point(point), true))
            }
            SupportClassification::Local { .. } => {
                let local = transform.local_support().ok_or_else(|| {
                    MetricError::configuration("transform no longer reports local support")
                })?;
                let (mapped, inside) = local.transform_point_local(
                    point,
                    &mut scratch.weights,
                    &mut scratch.jacobian.nonzero_indices,
                );
                scratch.valid_for = inside.then_some(*point);
                scratch.inside = inside;
                Ok((mapped, inside))
            }
        }
    }

    /// Evaluate the transform Jacobian at a point, in sparse block form.
    ///
    /// Reuses the weights cached by `transform_point` when the scratch is
    /// still valid for `point`, recomputing otherwise. Points outside a
    /// locally-supported transform's support region yield an all-zero
    /// Jacobian.
    pub fn evaluate_transform_jacobian<'s>(
        &self,
        point: &Point<D>,
        scratch: &'s mut JacobianScratch<D>,
    ) -> Result<&'s TransformJacobian> {
        let state = self.state()?;
        let transform = self
            .transform
            .as_deref()
            .ok_or_else(|| MetricError::configuration("no transform set"))?;
        match state.support {
            SupportClassification::Dense => {
                // Copy into the preallocated buffer so the scratch storage
                // stays stable across samples.
                scratch.jacobian.matrix.copy_from(&transform.jacobian(point));
                scratch.valid_for = Some(*point);
            }
            SupportClassification::Local { support_size } => {
                if scratch.valid_for != Some(*point) {
                    let local = transform.local_support().ok_or_else(|| {
                        MetricError::configuration("transform no longer reports local support")
                    })?;
                    let (_, inside) = local.transform_point_local(
                        point,
                        &mut scratch.weights,
                        &mut scratch.jacobian.nonzero_indices,
                    );
                    scratch.valid_for = inside.then_some(*point);
                    scratch.inside = inside;
                }
                scratch.jacobian.matrix.fill(0.0);
                if scratch.inside {
                    // Block-diagonal layout: weight k of dimension d lands in
                    // column d * support_size + k.
                    for d in 0..D {
                        for k in 0..support_size {
                            scratch.jacobian.matrix[(d, d * support_size + k)] =
                                scratch.weights[k];
                        }
                    }
                }
            }
        }
        Ok(&scratch.jacobian)
    }

    /// Interpolate the moving image at a mapped point.
    ///
    /// Returns `Ok(None)` when the point falls outside the moving image's
    /// defined domain. With `want_derivative`, the gradient comes from the
    /// source chosen at initialization and is scaled by the moving
    /// limiter's chain factor.
    pub fn evaluate_moving_value_and_derivative(
        &self,
        mapped: &Point<D>,
        want_derivative: bool,
    ) -> Result<Option<MovingValue<D>>> {
        let state = self.state()?;
        let moving = self
            .moving_image
            .as_ref()
            .ok_or_else(|| MetricError::configuration("no moving image set"))?;
        let index = moving.transform_physical_point_to_continuous_index(mapped);
        if !moving.is_inside_buffer(&index) {
            return Ok(None);
        }

        if !want_derivative {
            let mut value = self.interpolator.evaluate(moving, &index);
            if let (true, Some(limiter)) =
                (self.config.use_moving_limiter, self.moving_limiter.as_deref())
            {
                value = limiter.limit(value);
            }
            return Ok(Some(MovingValue {
                value,
                derivative: None,
            }));
        }

        let (value, gradient) = match &state.derivative_source {
            DerivativeSource::Analytic => self
                .interpolator
                .evaluate_with_derivative(moving, &index)
                .ok_or_else(|| {
                    MetricError::configuration(
                        "interpolator reports analytic derivatives but returned none",
                    )
                })?,
            DerivativeSource::ForwardDifference(field) => {
                let value = self.interpolator.evaluate(moving, &index);
                (value, field.evaluate(&index))
            }
        };

        let (value, gradient) = if let (true, Some(limiter)) =
            (self.config.use_moving_limiter, self.moving_limiter.as_deref())
        {
            let (limited, factor) = limiter.limit_with_derivative(value);
            (limited, gradient * factor)
        } else {
            (value, gradient)
        };

        Ok(Some(MovingValue {
            value,
            derivative: Some(gradient),
        }))
    }

    /// Mask weight at a mapped point, with its spatial derivative when
    /// requested.
    ///
    /// Without a differentiable mask every point weighs 1 with a zero
    /// derivative.
    pub fn evaluate_mask_value_and_derivative(
        &self,
        mapped: &Point<D>,
        want_derivative: bool,
    ) -> Result<(f64, Option<Vector<D>>)> {
        let state = self.state()?;
        Ok(match &state.internal_mask {
            Some(mask) => mask.evaluate(mapped, want_derivative),
            None => (1.0, want_derivative.then(Vector::zeros)),
        })
    }

    /// Limit a fixed-image intensity through the configured fixed limiter.
    ///
    /// Identity when fixed limiting is disabled.
    pub fn apply_fixed_limiter(&self, value: f64) -> f64 {
        match (self.config.use_fixed_limiter, self.fixed_limiter.as_deref()) {
            (true, Some(limiter)) => limiter.limit(value),
            _ => value,
        }
    }

    /// Check that enough samples produced usable values.
    ///
    /// Fails exactly when `found` is below the required ratio of `wanted`;
    /// meeting the threshold exactly passes. `sum_of_mask_values` is the
    /// accumulated mask weight of the found samples, recorded for
    /// diagnostics.
    pub fn check_number_of_samples(
        &self,
        wanted: usize,
        found: usize,
        sum_of_mask_values: f64,
    ) -> Result<()> {
        let required_ratio = self.config.required_ratio_of_valid_samples;
        debug!(wanted, found, sum_of_mask_values, "sample count check");
        if (found as f64) < required_ratio * wanted as f64 {
            warn!(
                wanted,
                found, required_ratio, "too few valid samples in evaluation pass"
            );
            return Err(MetricError::InsufficientSamples {
                wanted,
                found,
                required_ratio,
            });
        }
        Ok(())
    }

    /// Draw one batch of fixed-image samples.
    ///
    /// Uses the configured sampler when sampling is enabled, the full fixed
    /// grid otherwise.
    pub fn draw_samples(&mut self) -> Result<Vec<ImageSample<D>>> {
        let region = self.state()?.fixed_region;
        let fixed = self
            .fixed_image
            .as_ref()
            .ok_or_else(|| MetricError::configuration("no fixed image set"))?;
        if self.config.use_sampler {
            let sampler = self
                .sampler
                .as_deref_mut()
                .ok_or_else(|| MetricError::configuration("sampling enabled but no sampler set"))?;
            Ok(sampler.sample(fixed, &region))
        } else {
            Ok(FullGridSampler::new().sample(fixed, &region))
        }
    }
}
