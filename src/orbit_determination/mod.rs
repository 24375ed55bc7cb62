//! # Orbit determination parameters
//!
//! This module defines the [`FitParams`] configuration struct and its builder, which control
//! how an orbit is seeded, refined against the observations, and scanned for close
//! approaches with the Earth.
//!
//! ## Pipeline overview
//!
//! 1. **Seed**
//!    Either the [coarse seed generator](crate::orbit_determination::coarse_seed) (three
//!    lines of sight placed at `seed_range_au` from the Earth, central-difference velocity)
//!    or a fixed caller-supplied orbit, as selected by [`SeedStrategy`].
//!
//! 2. **Differential correction**
//!    The [`DifferentialCorrector`](crate::orbit_determination::differential_correction::DifferentialCorrector)
//!    minimises the RA/DEC residuals with a bounded least-squares solver. The box depends on
//!    the [`BoundsPolicy`]: a wide *first pass* box for a blind starting point, a narrower
//!    *seeded* box around a seed orbit.
//!
//! 3. **Close-approach scan**
//!    The fitted orbit is sampled on a uniform grid (`scan_window_days`, `scan_step_days`)
//!    to find its minimum distance to the Earth.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cometfit::orbit_determination::{FitParams, SeedStrategy};
//!
//! let params = FitParams::builder()
//!     .seed_range_au(1.5)
//!     .max_evaluations(2000)
//!     .scan_step_days(0.5)
//!     .seed_strategy(SeedStrategy::CoarseSeed)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## See also
//!
//! * [`Cometfit`](crate::cometfit::Cometfit) – facade consuming these parameters.
//! * [`Tolerances`] – solver stopping criteria derived from the parameters.
use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

use crate::{
    cometfit_errors::CometfitError,
    constants::{AstronomicalUnit, Day, DAYS_PER_JULIAN_YEAR},
    kepler::KeplerSolver,
    least_squares::Tolerances,
    orbit_type::OrbitState,
};

pub mod coarse_seed;
pub mod differential_correction;

/// Minimum number of observations for the coarse seed.
pub const MIN_SEED_OBSERVATIONS: usize = 3;

/// Minimum number of observations for the differential correction.
pub const MIN_REFINE_OBSERVATIONS: usize = 5;

/// How the starting orbit of a fit is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SeedStrategy {
    /// Coarse seed from the first three observations, refined with the seeded box.
    #[default]
    CoarseSeed,
    /// A fixed starting orbit, refined with the first-pass box.
    Fixed(OrbitState),
}

impl SeedStrategy {
    /// Generic main-belt starting point: `a = 2.5 AU`, `e = 0.3`, `i = 7°`, `Ω = 120°`,
    /// `ω = 45°`, perihelion on 2025-01-01 (MJD 60676).
    pub fn fixed_default() -> Self {
        SeedStrategy::Fixed(OrbitState {
            semi_major_axis: 2.5,
            eccentricity: 0.3,
            inclination: 7.0_f64.to_radians(),
            ascending_node_longitude: 120.0_f64.to_radians(),
            periapsis_argument: 45.0_f64.to_radians(),
            perihelion_epoch: 60676.0,
        })
    }
}

/// Box used by the differential corrector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsPolicy {
    /// Wide box: `a ≤ max_semi_major_axis_first_pass`, perihelion epoch within
    /// `perihelion_window_first_pass` days of the observation span.
    FirstPass,
    /// Narrow box around a seed: `a ≤ max_semi_major_axis_seeded`, perihelion epoch within
    /// `perihelion_window_seeded` days of the seed's.
    Seeded,
}

/// Configuration of the orbit determination pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FitParams {
    // --- Coarse seed ---
    /// Slant range assumed for the three seed lines of sight (AU).
    pub seed_range_au: AstronomicalUnit,
    pub seed_strategy: SeedStrategy,

    // --- Solver box ---
    pub min_semi_major_axis: AstronomicalUnit,
    pub max_semi_major_axis_first_pass: AstronomicalUnit,
    pub max_semi_major_axis_seeded: AstronomicalUnit,
    pub max_eccentricity: f64,
    pub perihelion_window_first_pass: Day,
    pub perihelion_window_seeded: Day,

    // --- Solver tolerances ---
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub max_evaluations: usize,

    // --- Kepler equation ---
    pub kepler_eps: f64,
    pub kepler_max_iter: usize,

    // --- Close-approach scan ---
    pub scan_window_days: Day,
    pub scan_step_days: Day,
    pub scan_max_samples: usize,
}

impl FitParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder initialised with the default values.
    pub fn builder() -> FitParamsBuilder {
        FitParamsBuilder::new()
    }

    /// Solver stopping criteria.
    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            ftol: self.ftol,
            xtol: self.xtol,
            gtol: self.gtol,
            max_evaluations: self.max_evaluations,
        }
    }

    /// Kepler solver configured with `kepler_eps` and `kepler_max_iter`.
    pub fn kepler_solver(&self) -> KeplerSolver {
        KeplerSolver::new(self.kepler_eps, self.kepler_max_iter)
    }
}

impl Default for FitParams {
    fn default() -> Self {
        FitParams {
            seed_range_au: 1.0,
            seed_strategy: SeedStrategy::CoarseSeed,

            min_semi_major_axis: 0.1,
            max_semi_major_axis_first_pass: 50.0,
            max_semi_major_axis_seeded: 10.0,
            max_eccentricity: 0.99,
            perihelion_window_first_pass: 365.0,
            perihelion_window_seeded: 1000.0,

            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            max_evaluations: 1000,

            kepler_eps: 1e-12,
            kepler_max_iter: 50,

            scan_window_days: 5.0 * DAYS_PER_JULIAN_YEAR,
            scan_step_days: 1.0,
            scan_max_samples: 1_000_000,
        }
    }
}

/// Builder for [`FitParams`].
#[derive(Debug, Clone)]
pub struct FitParamsBuilder {
    params: FitParams,
}

impl Default for FitParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FitParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: FitParams::default(),
        }
    }

    // --- Seed ---
    pub fn seed_range_au(mut self, v: f64) -> Self {
        self.params.seed_range_au = v;
        self
    }
    pub fn seed_strategy(mut self, v: SeedStrategy) -> Self {
        self.params.seed_strategy = v;
        self
    }

    // --- Box ---
    pub fn min_semi_major_axis(mut self, v: f64) -> Self {
        self.params.min_semi_major_axis = v;
        self
    }
    pub fn max_semi_major_axis_first_pass(mut self, v: f64) -> Self {
        self.params.max_semi_major_axis_first_pass = v;
        self
    }
    pub fn max_semi_major_axis_seeded(mut self, v: f64) -> Self {
        self.params.max_semi_major_axis_seeded = v;
        self
    }
    pub fn max_eccentricity(mut self, v: f64) -> Self {
        self.params.max_eccentricity = v;
        self
    }
    pub fn perihelion_window_first_pass(mut self, v: f64) -> Self {
        self.params.perihelion_window_first_pass = v;
        self
    }
    pub fn perihelion_window_seeded(mut self, v: f64) -> Self {
        self.params.perihelion_window_seeded = v;
        self
    }

    // --- Tolerances ---
    pub fn ftol(mut self, v: f64) -> Self {
        self.params.ftol = v;
        self
    }
    pub fn xtol(mut self, v: f64) -> Self {
        self.params.xtol = v;
        self
    }
    pub fn gtol(mut self, v: f64) -> Self {
        self.params.gtol = v;
        self
    }
    pub fn max_evaluations(mut self, v: usize) -> Self {
        self.params.max_evaluations = v;
        self
    }

    // --- Kepler ---
    pub fn kepler_eps(mut self, v: f64) -> Self {
        self.params.kepler_eps = v;
        self
    }
    pub fn kepler_max_iter(mut self, v: usize) -> Self {
        self.params.kepler_max_iter = v;
        self
    }

    // --- Scan ---
    pub fn scan_window_days(mut self, v: f64) -> Self {
        self.params.scan_window_days = v;
        self
    }
    pub fn scan_step_days(mut self, v: f64) -> Self {
        self.params.scan_step_days = v;
        self
    }
    pub fn scan_max_samples(mut self, v: usize) -> Self {
        self.params.scan_max_samples = v;
        self
    }

    // ---- Numeric helpers for PartialOrd (handle NaN as invalid) ----

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Return true iff a < b and comparable (i.e., not NaN).
    #[inline]
    fn lt(a: f64, b: f64) -> bool {
        a.partial_cmp(&b) == Some(Less)
    }

    /// Finalize the builder and produce a [`FitParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `seed_range_au > 0`.
    /// * `0 < min_semi_major_axis < max_semi_major_axis_seeded` and
    ///   `min_semi_major_axis < max_semi_major_axis_first_pass`.
    /// * `0 ≤ max_eccentricity < 1`.
    /// * `perihelion_window_first_pass ≥ 0`, `perihelion_window_seeded > 0`.
    /// * `ftol ≥ 0`, `xtol ≥ 0`, `gtol ≥ 0`, `max_evaluations ≥ 1`.
    /// * `kepler_eps > 0`, `kepler_max_iter ≥ 1`.
    /// * `scan_window_days > 0`, `scan_step_days > 0`, `scan_max_samples ≥ 1`.
    /// * A [`SeedStrategy::Fixed`] orbit passes [`OrbitState::validate`].
    ///
    /// Returns
    /// -----------------
    /// * `Ok(FitParams)` if all values are valid.
    /// * `Err(CometfitError::InvalidFitParameter)` naming the first rule that fails.
    pub fn build(self) -> Result<FitParams, CometfitError> {
        let p = &self.params;
        let invalid = |msg: &str| Err(CometfitError::InvalidFitParameter(msg.into()));

        if !Self::gt0(p.seed_range_au) {
            return invalid("seed_range_au must be > 0");
        }

        // --- Box ---
        if !Self::gt0(p.min_semi_major_axis) {
            return invalid("min_semi_major_axis must be > 0");
        }
        if !Self::lt(p.min_semi_major_axis, p.max_semi_major_axis_first_pass)
            || !Self::lt(p.min_semi_major_axis, p.max_semi_major_axis_seeded)
        {
            return invalid("require min_semi_major_axis < max_semi_major_axis_{first_pass,seeded}");
        }
        if !Self::ge0(p.max_eccentricity) || !Self::lt(p.max_eccentricity, 1.0) {
            return invalid("require 0 <= max_eccentricity < 1");
        }
        if !Self::ge0(p.perihelion_window_first_pass) {
            return invalid("perihelion_window_first_pass must be >= 0");
        }
        if !Self::gt0(p.perihelion_window_seeded) {
            return invalid("perihelion_window_seeded must be > 0");
        }

        // --- Tolerances ---
        if !Self::ge0(p.ftol) || !Self::ge0(p.xtol) || !Self::ge0(p.gtol) {
            return invalid("ftol, xtol and gtol must be >= 0");
        }
        if p.max_evaluations == 0 {
            return invalid("max_evaluations must be >= 1");
        }

        // --- Kepler ---
        if !Self::gt0(p.kepler_eps) {
            return invalid("kepler_eps must be > 0");
        }
        if p.kepler_max_iter == 0 {
            return invalid("kepler_max_iter must be >= 1");
        }

        // --- Scan ---
        if !Self::gt0(p.scan_window_days) || !Self::gt0(p.scan_step_days) {
            return invalid("scan_window_days and scan_step_days must be > 0");
        }
        if p.scan_max_samples == 0 {
            return invalid("scan_max_samples must be >= 1");
        }

        if let SeedStrategy::Fixed(orbit) = &p.seed_strategy {
            orbit.validate().map_err(|err| {
                CometfitError::InvalidFitParameter(format!("fixed seed orbit: {err}"))
            })?;
        }

        Ok(self.params)
    }
}

impl fmt::Display for FitParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Orbit Fit Parameters")?;
        writeln!(f, "--------------------")?;
        writeln!(f, "[Seed]")?;
        writeln!(f, "  seed_range_au = {} AU", self.seed_range_au)?;
        match &self.seed_strategy {
            SeedStrategy::CoarseSeed => writeln!(f, "  seed_strategy = coarse seed")?,
            SeedStrategy::Fixed(orbit) => writeln!(
                f,
                "  seed_strategy = fixed (a = {:.3} AU, e = {:.3})",
                orbit.semi_major_axis, orbit.eccentricity
            )?,
        }
        writeln!(f, "[Solver box]")?;
        writeln!(
            f,
            "  a ∈ [{}, {}] AU (first pass), [{}, {}] AU (seeded)",
            self.min_semi_major_axis,
            self.max_semi_major_axis_first_pass,
            self.min_semi_major_axis,
            self.max_semi_major_axis_seeded
        )?;
        writeln!(f, "  e ∈ [0, {}]", self.max_eccentricity)?;
        writeln!(
            f,
            "  t_p window = ±{} d (first pass), ±{} d (seeded)",
            self.perihelion_window_first_pass, self.perihelion_window_seeded
        )?;
        writeln!(f, "[Solver tolerances]")?;
        writeln!(
            f,
            "  ftol = {:e}, xtol = {:e}, gtol = {:e}, max_evaluations = {}",
            self.ftol, self.xtol, self.gtol, self.max_evaluations
        )?;
        writeln!(f, "[Kepler]")?;
        writeln!(
            f,
            "  kepler_eps = {:e}, kepler_max_iter = {}",
            self.kepler_eps, self.kepler_max_iter
        )?;
        writeln!(f, "[Close-approach scan]")?;
        write!(
            f,
            "  window = {} d, step = {} d, max samples = {}",
            self.scan_window_days, self.scan_step_days, self.scan_max_samples
        )
    }
}

#[cfg(test)]
mod fit_params_test {
    use super::*;

    #[test]
    fn test_defaults_build() {
        let params = FitParams::builder().build().unwrap();
        assert_eq!(params, FitParams::default());
        assert_eq!(params.scan_window_days, 1826.25);
        assert_eq!(params.tolerances(), Tolerances::default());
        assert_eq!(params.kepler_solver(), KeplerSolver::default());
    }

    #[test]
    fn test_builder_setters() {
        let params = FitParams::builder()
            .seed_range_au(2.0)
            .max_evaluations(50)
            .scan_step_days(0.25)
            .seed_strategy(SeedStrategy::fixed_default())
            .build()
            .unwrap();
        assert_eq!(params.seed_range_au, 2.0);
        assert_eq!(params.tolerances().max_evaluations, 50);
        assert_eq!(params.scan_step_days, 0.25);
        assert!(matches!(params.seed_strategy, SeedStrategy::Fixed(_)));
    }

    #[test]
    fn test_invalid_parameters() {
        let cases = [
            FitParams::builder().seed_range_au(0.0),
            FitParams::builder().seed_range_au(f64::NAN),
            FitParams::builder().min_semi_major_axis(-1.0),
            FitParams::builder().max_semi_major_axis_seeded(0.05),
            FitParams::builder().max_eccentricity(1.0),
            FitParams::builder().perihelion_window_seeded(0.0),
            FitParams::builder().xtol(-1e-3),
            FitParams::builder().max_evaluations(0),
            FitParams::builder().kepler_eps(0.0),
            FitParams::builder().kepler_max_iter(0),
            FitParams::builder().scan_step_days(0.0),
            FitParams::builder().scan_max_samples(0),
            FitParams::builder().seed_strategy(SeedStrategy::Fixed(OrbitState {
                semi_major_axis: 1.0,
                eccentricity: 1.5,
                inclination: 0.0,
                ascending_node_longitude: 0.0,
                periapsis_argument: 0.0,
                perihelion_epoch: 60000.0,
            })),
        ];
        for builder in cases {
            assert!(matches!(
                builder.build(),
                Err(CometfitError::InvalidFitParameter(_))
            ));
        }
    }

    #[test]
    fn test_display() {
        let output = format!("{}", FitParams::default());
        assert!(output.starts_with("Orbit Fit Parameters"));
        assert!(output.contains("window = 1826.25 d, step = 1 d"));
    }
}
