//! Caller-owned scratch storage for transform Jacobian evaluation.
//!
//! Jacobian evaluation is a hot per-sample operation. To keep the metric
//! free of interior mutability, each evaluation thread owns a scratch
//! buffer sized once at initialization and reused for every sample.

use nalgebra::DMatrix;

use regkit_core::spatial::Point;

/// A transform Jacobian in sparse block form.
///
/// `matrix` is `D x N` where `N` is the number of nonzero parameter
/// columns; `nonzero_indices[j]` names the global parameter index of column
/// `j`. For transforms without local support the descriptor is dense:
/// `N` equals the parameter count and `nonzero_indices` is `0..N`.
#[derive(Debug, Clone)]
pub struct TransformJacobian {
    /// Jacobian values, one column per listed parameter.
    pub matrix: DMatrix<f64>,
    /// Global parameter index of each column.
    pub nonzero_indices: Vec<usize>,
}

/// Reusable per-thread buffers for point mapping and Jacobian evaluation.
///
/// Built by `AdvancedMetric::new_scratch` after initialization; the buffer
/// shape depends on whether the transform has local support. Mapping a
/// point caches the local weights so a following Jacobian request for the
/// same point reuses them.
#[derive(Debug, Clone)]
pub struct JacobianScratch<const D: usize> {
    pub(crate) weights: Vec<f64>,
    pub(crate) jacobian: TransformJacobian,
    pub(crate) valid_for: Option<Point<D>>,
    pub(crate) inside: bool,
}

impl<const D: usize> JacobianScratch<D> {
    /// Scratch for a densely-supported transform with `parameter_count`
    /// parameters.
    pub(crate) fn dense(parameter_count: usize) -> Self {
        Self {
            weights: Vec::new(),
            jacobian: TransformJacobian {
                matrix: DMatrix::zeros(D, parameter_count),
                nonzero_indices: (0..parameter_count).collect(),
            },
            valid_for: None,
            inside: true,
        }
    }

    /// Scratch for a locally-supported transform touching `support_size`
    /// control points per dimension block.
    pub(crate) fn local(support_size: usize) -> Self {
        let nonzero = support_size * D;
        Self {
            weights: vec![0.0; support_size],
            jacobian: TransformJacobian {
                matrix: DMatrix::zeros(D, nonzero),
                nonzero_indices: vec![0; nonzero],
            },
            valid_for: None,
            inside: true,
        }
    }

    /// The Jacobian computed by the most recent evaluation.
    pub fn jacobian(&self) -> &TransformJacobian {
        &self.jacobian
    }

    /// Drop any cached state, forcing the next evaluation to recompute.
    pub fn invalidate(&mut self) {
        self.valid_for = None;
    }
}
