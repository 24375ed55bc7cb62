//! # Bounded nonlinear least squares
//!
//! The differential corrector only needs one service from its solver: minimise
//! `½‖r(x)‖²` for a residual function `r` over a box `lower ≤ x ≤ upper`. That contract is
//! the [`LeastSquaresSolver`] trait; [`LevenbergMarquardt`] is the default backend.
//!
//! ## Termination
//! -----------------
//! A run stops, and reports `converged = true`, when one of the following holds:
//!
//! * `ftol` – the cost decreased by less than `ftol · cost` over an accepted step whose
//!   gain ratio exceeds 1/4,
//! * `xtol` – the step is shorter than `xtol · (xtol + ‖x‖)`,
//! * `gtol` – the projected gradient is smaller than `gtol` in max-norm,
//! * the cost is exactly zero.
//!
//! It stops with `converged = false` when the evaluation budget is exhausted or when the
//! damping parameter overflows. The caller decides what to do with such an outcome; the
//! solver itself never returns a partial result as a success.

pub mod levenberg_marquardt;

use nalgebra::DVector;

use crate::cometfit_errors::CometfitError;

pub use levenberg_marquardt::LevenbergMarquardt;

/// Residual function handed to a solver. Errors abort the minimisation.
pub type ResidualFn<'a> = dyn Fn(&DVector<f64>) -> Result<DVector<f64>, CometfitError> + 'a;

/// Box constraints `lower ≤ x ≤ upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: DVector<f64>,
    pub upper: DVector<f64>,
}

impl Bounds {
    /// Build box constraints.
    ///
    /// Errors
    /// ------
    /// * [`CometfitError::BoundsViolation`] if the sizes differ, a bound is NaN, or
    ///   `lower > upper` for some component.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, CometfitError> {
        if lower.len() != upper.len() {
            return Err(CometfitError::BoundsViolation(format!(
                "lower bound has {} components, upper bound has {}",
                lower.len(),
                upper.len()
            )));
        }
        if let Some((j, (lo, up))) = lower
            .iter()
            .zip(&upper)
            .enumerate()
            .find(|(_, (lo, up))| lo.is_nan() || up.is_nan() || lo > up)
        {
            return Err(CometfitError::BoundsViolation(format!(
                "invalid bounds for parameter {j}: [{lo}, {up}]"
            )));
        }
        Ok(Bounds {
            lower: DVector::from_vec(lower),
            upper: DVector::from_vec(upper),
        })
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Component-wise projection of `x` onto the box.
    pub fn clamp(&self, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            x.len(),
            x.iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .map(|(&xi, (&lo, &up))| xi.clamp(lo, up)),
        )
    }

    pub fn contains(&self, x: &DVector<f64>) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&xi, (&lo, &up))| lo <= xi && xi <= up)
    }
}

/// Stopping criteria and evaluation budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    /// Maximum number of residual evaluations, Jacobian columns included.
    pub max_evaluations: usize,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            max_evaluations: 1000,
        }
    }
}

/// Result of a minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    /// Best parameter vector found, always inside the bounds.
    pub x: DVector<f64>,
    pub converged: bool,
    /// Human-readable termination reason.
    pub message: String,
    /// `½‖r(x)‖²`
    pub cost: f64,
    pub n_evaluations: usize,
}

/// A bounded nonlinear least-squares minimiser.
pub trait LeastSquaresSolver: Send + Sync {
    /// Minimise `½‖residuals(x)‖²` subject to `bounds`, starting from `x0` (projected onto
    /// the box first).
    ///
    /// Errors
    /// ------
    /// Errors raised by `residuals` are propagated unchanged. A solver that merely fails to
    /// converge returns `Ok` with `converged = false`.
    fn minimize(
        &self,
        residuals: &ResidualFn<'_>,
        x0: &DVector<f64>,
        bounds: &Bounds,
        tolerances: &Tolerances,
    ) -> Result<SolverOutcome, CometfitError>;
}
