use thiserror::Error;

use crate::constants::{Radian, MJD};

#[derive(Error, Debug)]
pub enum CometfitError {
    #[error("Not enough observations for {stage}: {required} required, {provided} provided")]
    InsufficientObservations {
        stage: &'static str,
        required: usize,
        provided: usize,
    },

    #[error(
        "Kepler equation did not converge (mean anomaly = {mean_anomaly} rad, e = {eccentricity}): {cause}"
    )]
    KeplerDivergence {
        mean_anomaly: Radian,
        eccentricity: f64,
        cause: String,
    },

    #[error("Degenerate line of sight: body and observer positions coincide")]
    DegenerateLineOfSight,

    #[error("Degenerate observation times: {0}")]
    DegenerateObservationTimes(String),

    #[error("Least-squares solver did not converge: {0}")]
    SolverNonConvergence(String),

    #[error("Ephemeris data unavailable for {body} at MJD {time}: {reason}")]
    EphemerisUnavailable {
        body: String,
        time: MJD,
        reason: String,
    },

    #[error("Bounds violation: {0}")]
    BoundsViolation(String),

    #[error("Unbound seed orbit (eccentricity = {eccentricity}); only elliptic orbits are supported")]
    UnboundOrbit { eccentricity: f64 },

    #[error("Invalid close-approach scan window: {0}")]
    InvalidScanWindow(String),

    #[error("Invalid fit parameter: {0}")]
    InvalidFitParameter(String),

    #[error("Invalid ephemeris source: {0}")]
    InvalidEphemerisSource(String),

    #[error("Unable to load ephemeris table {path}: {reason}")]
    EphemerisLoad { path: String, reason: String },

    #[error("Invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp { input: String, reason: String },

    #[error("Invalid observation at record {record}: {reason}")]
    InvalidObservation { record: usize, reason: String },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for CometfitError {
    fn eq(&self, other: &Self) -> bool {
        use CometfitError::*;
        match (self, other) {
            (
                InsufficientObservations {
                    stage: s1,
                    required: r1,
                    provided: p1,
                },
                InsufficientObservations {
                    stage: s2,
                    required: r2,
                    provided: p2,
                },
            ) => s1 == s2 && r1 == r2 && p1 == p2,
            (
                KeplerDivergence {
                    mean_anomaly: m1,
                    eccentricity: e1,
                    ..
                },
                KeplerDivergence {
                    mean_anomaly: m2,
                    eccentricity: e2,
                    ..
                },
            ) => m1 == m2 && e1 == e2,
            (DegenerateObservationTimes(a), DegenerateObservationTimes(b)) => a == b,
            (SolverNonConvergence(a), SolverNonConvergence(b)) => a == b,
            (
                EphemerisUnavailable {
                    body: b1, time: t1, ..
                },
                EphemerisUnavailable {
                    body: b2, time: t2, ..
                },
            ) => b1 == b2 && t1 == t2,
            (BoundsViolation(a), BoundsViolation(b)) => a == b,
            (UnboundOrbit { eccentricity: a }, UnboundOrbit { eccentricity: b }) => a == b,
            (InvalidScanWindow(a), InvalidScanWindow(b)) => a == b,
            (InvalidFitParameter(a), InvalidFitParameter(b)) => a == b,
            (InvalidEphemerisSource(a), InvalidEphemerisSource(b)) => a == b,
            (EphemerisLoad { path: a, .. }, EphemerisLoad { path: b, .. }) => a == b,
            (InvalidTimestamp { input: a, .. }, InvalidTimestamp { input: b, .. }) => a == b,
            (InvalidObservation { record: a, .. }, InvalidObservation { record: b, .. }) => a == b,

            // Wrapped library errors are not comparable: equal if same variant
            (CsvError(_), CsvError(_)) => true,
            (IoError(_), IoError(_)) => true,

            (DegenerateLineOfSight, DegenerateLineOfSight) => true,

            _ => false,
        }
    }
}
