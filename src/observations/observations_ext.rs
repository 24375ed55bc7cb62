use itertools::{Itertools, MinMaxResult};

use crate::{
    cometfit_errors::CometfitError,
    constants::{ArcSec, MJD},
    ephemeris::EphemerisProvider,
    kepler::KeplerSolver,
    observations::Observation,
    orbit_type::OrbitState,
    projection::{predict_radec_with, radec_residual},
};

/// Extension trait for a collection of [`Observation`] of a single object.
///
/// # Provided methods
/// - [`time_span`](ObservationsExt::time_span): earliest and latest observation epochs.
/// - [`mean_epoch`](ObservationsExt::mean_epoch): mean observation epoch, the reference
///   time of the differential corrector.
/// - [`residuals`](ObservationsExt::residuals): interleaved RA/DEC residuals of an orbit.
/// - [`rms_residual`](ObservationsExt::rms_residual): RMS of those residuals.
///
/// Implemented on slices, hence available on [`Observations`](crate::constants::Observations)
/// and `Vec<Observation>` alike.
pub trait ObservationsExt {
    /// Earliest and latest observation epochs, `None` for an empty collection.
    fn time_span(&self) -> Option<(MJD, MJD)>;

    /// Arithmetic mean of the observation epochs, `None` for an empty collection.
    fn mean_epoch(&self) -> Option<MJD>;

    /// Residuals `predicted - observed` of an orbit against every observation.
    ///
    /// Arguments
    /// ---------
    /// * `elements`: the trial orbit.
    /// * `ephemeris`: source of the Earth positions.
    /// * `solver`: Kepler solver used by the propagation.
    ///
    /// Return
    /// ------
    /// * `[ΔRA₀, ΔDEC₀, ΔRA₁, ΔDEC₁, …]` in arcseconds, in observation order. The RA
    ///   difference is wrapped into (-180°, 180°] before scaling.
    fn residuals(
        &self,
        elements: &OrbitState,
        ephemeris: &dyn EphemerisProvider,
        solver: &KeplerSolver,
    ) -> Result<Vec<ArcSec>, CometfitError>;

    /// Root-mean-square residual of an orbit, in arcseconds.
    ///
    /// RMS = √[ (1 / 2N) × Σᵢ (ΔRAᵢ² + ΔDECᵢ²) ]
    fn rms_residual(
        &self,
        elements: &OrbitState,
        ephemeris: &dyn EphemerisProvider,
        solver: &KeplerSolver,
    ) -> Result<ArcSec, CometfitError>;
}

impl ObservationsExt for [Observation] {
    fn time_span(&self) -> Option<(MJD, MJD)> {
        match self.iter().map(|obs| obs.time).minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(t) => Some((t, t)),
            MinMaxResult::MinMax(first, last) => Some((first, last)),
        }
    }

    fn mean_epoch(&self) -> Option<MJD> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().map(|obs| obs.time).sum::<f64>() / self.len() as f64)
    }

    fn residuals(
        &self,
        elements: &OrbitState,
        ephemeris: &dyn EphemerisProvider,
        solver: &KeplerSolver,
    ) -> Result<Vec<ArcSec>, CometfitError> {
        let mut residuals = Vec::with_capacity(2 * self.len());
        for obs in self {
            let predicted = predict_radec_with(solver, elements, obs.time, ephemeris)?;
            let (dra, ddec) = radec_residual(predicted, obs);
            residuals.push(dra);
            residuals.push(ddec);
        }
        Ok(residuals)
    }

    fn rms_residual(
        &self,
        elements: &OrbitState,
        ephemeris: &dyn EphemerisProvider,
        solver: &KeplerSolver,
    ) -> Result<ArcSec, CometfitError> {
        if self.is_empty() {
            return Err(CometfitError::InsufficientObservations {
                stage: "residual evaluation",
                required: 1,
                provided: 0,
            });
        }
        let residuals = self.residuals(elements, ephemeris, solver)?;
        let sum_sq: f64 = residuals.iter().map(|r| r * r).sum();
        Ok((sum_sq / residuals.len() as f64).sqrt())
    }
}
