//! Projected Levenberg–Marquardt.
//!
//! Each outer iteration:
//!
//! 1. builds the Jacobian `J` by forward differences with step
//!    `h_j = √ε · max(|x_j|, 1)`, taken inwards when `x_j + h_j` would leave the box,
//! 2. freezes the parameters sitting on a bound whose gradient `g = Jᵀr` pushes them
//!    outwards (active set),
//! 3. solves `(JᵀJ + λ·diag(JᵀJ)) δ = -g` on the free parameters, by Cholesky with an LU
//!    fallback,
//! 4. projects `x + δ` onto the box and evaluates the residuals there.
//!
//! A step that lowers the cost is accepted and `λ` shrinks according to the gain ratio
//! `ρ = actual / predicted reduction` (Nielsen's rule); a rejected step multiplies `λ` by a
//! growing factor `ν`.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::{
    cometfit_errors::CometfitError,
    least_squares::{Bounds, LeastSquaresSolver, ResidualFn, SolverOutcome, Tolerances},
};

/// Initial damping, relative to the diagonal of `JᵀJ`.
const INITIAL_DAMPING: f64 = 1e-3;
/// Damping beyond which the run is abandoned.
const MAX_DAMPING: f64 = 1e16;
/// Floor of the Marquardt scaling for parameters the residuals do not depend on.
const DIAG_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Default)]
pub struct LevenbergMarquardt;

impl LevenbergMarquardt {
    pub fn new() -> Self {
        LevenbergMarquardt
    }
}

/// Forward-difference Jacobian of `residuals` at `x`, given `r = residuals(x)`.
fn forward_jacobian(
    residuals: &ResidualFn<'_>,
    x: &DVector<f64>,
    r: &DVector<f64>,
    bounds: &Bounds,
) -> Result<DMatrix<f64>, CometfitError> {
    let sqrt_eps = f64::EPSILON.sqrt();
    let mut jac = DMatrix::zeros(r.len(), x.len());

    for j in 0..x.len() {
        let mut h = sqrt_eps * x[j].abs().max(1.0);
        if x[j] + h > bounds.upper[j] {
            h = -h;
        }
        let mut x_h = x.clone();
        x_h[j] += h;
        let r_h = residuals(&x_h)?;
        jac.set_column(j, &((r_h - r) / h));
    }
    Ok(jac)
}

/// Indices of parameters blocked by a bound in the descent direction `-g`.
fn active_set(x: &DVector<f64>, gradient: &DVector<f64>, bounds: &Bounds) -> Vec<bool> {
    (0..x.len())
        .map(|j| {
            (x[j] <= bounds.lower[j] && gradient[j] > 0.0)
                || (x[j] >= bounds.upper[j] && gradient[j] < 0.0)
        })
        .collect()
}

/// Solve the damped normal equations on the free parameters.
fn damped_step(
    jtj: &DMatrix<f64>,
    gradient: &DVector<f64>,
    active: &[bool],
    lambda: f64,
) -> Option<DVector<f64>> {
    let n = gradient.len();
    let mut system = jtj.clone();
    let mut rhs = -gradient.clone();

    for j in 0..n {
        if active[j] {
            system.row_mut(j).fill(0.0);
            system.column_mut(j).fill(0.0);
            system[(j, j)] = 1.0;
            rhs[j] = 0.0;
        } else {
            system[(j, j)] += lambda * jtj[(j, j)].max(DIAG_FLOOR);
        }
    }

    match system.clone().cholesky() {
        Some(chol) => Some(chol.solve(&rhs)),
        None => system.lu().solve(&rhs),
    }
}

fn half_norm_squared(r: &DVector<f64>) -> f64 {
    0.5 * r.norm_squared()
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn minimize(
        &self,
        residuals: &ResidualFn<'_>,
        x0: &DVector<f64>,
        bounds: &Bounds,
        tolerances: &Tolerances,
    ) -> Result<SolverOutcome, CometfitError> {
        let n = x0.len();
        if bounds.dim() != n {
            return Err(CometfitError::BoundsViolation(format!(
                "{n} parameters but bounds of dimension {}",
                bounds.dim()
            )));
        }

        let mut x = bounds.clamp(x0);
        let mut r = residuals(&x)?;
        let mut n_evaluations = 1;
        let mut cost = half_norm_squared(&r);

        if r.len() < n {
            return Err(CometfitError::SolverNonConvergence(format!(
                "underdetermined problem: {} residuals for {n} parameters",
                r.len()
            )));
        }
        if !cost.is_finite() {
            return Err(CometfitError::SolverNonConvergence(
                "non-finite residuals at the starting point".into(),
            ));
        }

        let outcome =
            |x: DVector<f64>, cost: f64, n_evaluations: usize, converged: bool, message: &str| {
                SolverOutcome {
                    x,
                    converged,
                    message: message.to_string(),
                    cost,
                    n_evaluations,
                }
            };

        let mut lambda = INITIAL_DAMPING;
        let mut nu = 2.0;
        let mut iteration = 0usize;

        loop {
            if cost == 0.0 {
                return Ok(outcome(x, cost, n_evaluations, true, "zero residual"));
            }
            if n_evaluations + n > tolerances.max_evaluations {
                return Ok(outcome(
                    x,
                    cost,
                    n_evaluations,
                    false,
                    "maximum number of function evaluations exceeded",
                ));
            }

            let jac = forward_jacobian(residuals, &x, &r, bounds)?;
            n_evaluations += n;
            let jac_t = jac.transpose();
            let gradient = &jac_t * &r;
            let jtj = &jac_t * &jac;

            let active = active_set(&x, &gradient, bounds);
            let projected_gradient = gradient
                .iter()
                .zip(&active)
                .map(|(g, &blocked)| if blocked { 0.0 } else { g.abs() })
                .fold(0.0_f64, f64::max);
            if projected_gradient <= tolerances.gtol {
                return Ok(outcome(
                    x,
                    cost,
                    n_evaluations,
                    true,
                    "gtol termination condition is satisfied",
                ));
            }

            iteration += 1;
            debug!(iteration, cost, lambda, n_evaluations, "Levenberg-Marquardt iteration");

            // Inner loop: raise the damping until a step lowers the cost
            loop {
                let Some(step) = damped_step(&jtj, &gradient, &active, lambda) else {
                    lambda *= nu;
                    nu *= 2.0;
                    if lambda > MAX_DAMPING {
                        return Ok(outcome(
                            x,
                            cost,
                            n_evaluations,
                            false,
                            "damping overflow: singular normal equations",
                        ));
                    }
                    continue;
                };

                let x_new = bounds.clamp(&(&x + &step));
                let step = &x_new - &x;
                if step.norm() <= tolerances.xtol * (tolerances.xtol + x.norm()) {
                    return Ok(outcome(
                        x,
                        cost,
                        n_evaluations,
                        true,
                        "xtol termination condition is satisfied",
                    ));
                }
                if n_evaluations >= tolerances.max_evaluations {
                    return Ok(outcome(
                        x,
                        cost,
                        n_evaluations,
                        false,
                        "maximum number of function evaluations exceeded",
                    ));
                }

                let r_new = residuals(&x_new)?;
                n_evaluations += 1;
                let cost_new = half_norm_squared(&r_new);

                let actual = cost - cost_new;
                if cost_new.is_finite() && actual > 0.0 {
                    let predicted = -(gradient.dot(&step) + 0.5 * step.dot(&(&jtj * &step)));
                    let rho = if predicted > 0.0 { actual / predicted } else { 0.0 };
                    lambda *= (1.0 - (2.0 * rho - 1.0).powi(3)).max(1.0 / 3.0);
                    nu = 2.0;

                    let previous_cost = cost;
                    x = x_new;
                    r = r_new;
                    cost = cost_new;

                    if actual <= tolerances.ftol * previous_cost && rho > 0.25 {
                        return Ok(outcome(
                            x,
                            cost,
                            n_evaluations,
                            true,
                            "ftol termination condition is satisfied",
                        ));
                    }
                    break;
                }

                lambda *= nu;
                nu *= 2.0;
                if lambda > MAX_DAMPING {
                    return Ok(outcome(
                        x,
                        cost,
                        n_evaluations,
                        false,
                        "damping overflow: no step decreases the cost",
                    ));
                }
            }
        }
    }
}
