//! # Astrometric observations
//!
//! An [`Observation`] is a single angle-only measurement of the target: right ascension and
//! declination (radians, equatorial J2000) at an instant (MJD, TT). Observations are
//! immutable once built and are always handled as a collection of one object's
//! [`Observations`](crate::constants::Observations).
//!
//! ## Inputs
//! -----------------
//! * [`Observation::new`] – radians and MJD.
//! * [`Observation::from_degrees`] – degrees and MJD.
//! * [`Observation::from_iso`] – degrees and an ISO-8601 UTC timestamp.
//! * [`ObservationRecord`] – the serialisable record `{ra, dec, time}` (degrees, ISO UTC)
//!   used by the CSV reader and by the request boundary of [`Cometfit`](crate::cometfit::Cometfit).
//! * [`read_observations_csv`] – a whole CSV file of records.
//!
//! See also
//! ------------
//! * [`ObservationsExt`] – time span and reference epoch of a collection.

pub mod observations_ext;

use std::{fmt, io};

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::{
    cometfit_errors::CometfitError,
    constants::{Degree, Observations, Radian, MJD, RADEG},
    kepler::principal_angle,
    time::iso_to_mjd,
};

pub use observations_ext::ObservationsExt;

/// A single astrometric observation of the target.
///
/// # Fields
///
/// * `ra` - Right ascension in radians, `[0, 2π)`
/// * `dec` - Declination in radians, `[-π/2, π/2]`
/// * `time` - Instant of the observation, MJD (TT)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub ra: Radian,
    pub dec: Radian,
    pub time: MJD,
}

impl Observation {
    /// Create a new observation from radians; the right ascension is reduced to `[0, 2π)`.
    pub fn new(ra: Radian, dec: Radian, time: MJD) -> Self {
        Observation {
            ra: principal_angle(ra),
            dec,
            time,
        }
    }

    /// Create a new observation from right ascension and declination in degrees.
    pub fn from_degrees(ra: Degree, dec: Degree, time: MJD) -> Self {
        Observation::new(ra * RADEG, dec * RADEG, time)
    }

    /// Create a new observation from degrees and an ISO-8601 UTC timestamp.
    ///
    /// Arguments
    /// ---------
    /// * `ra`: right ascension in degrees
    /// * `dec`: declination in degrees, `[-90, 90]`
    /// * `time`: timestamp such as `2025-03-14T05:12:00Z`
    ///
    /// Return
    /// ------
    /// * The observation, or [`CometfitError::InvalidTimestamp`] if the timestamp cannot be
    ///   parsed, or [`CometfitError::InvalidObservation`] for non-finite angles or a
    ///   declination outside `[-90°, 90°]`.
    pub fn from_iso(ra: Degree, dec: Degree, time: &str) -> Result<Self, CometfitError> {
        ObservationRecord {
            ra,
            dec,
            time: time.to_string(),
        }
        .to_observation(0)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MJD {:.6}  RA = {:.6}°  DEC = {:+.6}°",
            self.time,
            self.ra / RADEG,
            self.dec / RADEG
        )
    }
}

/// Serialisable observation record: angles in degrees, timestamp as ISO-8601 UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub ra: Degree,
    pub dec: Degree,
    pub time: String,
}

impl ObservationRecord {
    /// Convert the record into an [`Observation`]; `index` locates it in error messages.
    pub fn to_observation(&self, index: usize) -> Result<Observation, CometfitError> {
        if !self.ra.is_finite() || !self.dec.is_finite() {
            return Err(CometfitError::InvalidObservation {
                record: index,
                reason: format!("non-finite coordinates (ra = {}, dec = {})", self.ra, self.dec),
            });
        }
        if !(-90.0..=90.0).contains(&self.dec) {
            return Err(CometfitError::InvalidObservation {
                record: index,
                reason: format!("declination {}° outside [-90°, 90°]", self.dec),
            });
        }
        let time = iso_to_mjd(&self.time)?;
        Ok(Observation::from_degrees(self.ra, self.dec, time))
    }
}

/// Convert a slice of records, failing on the first invalid one.
pub fn observations_from_records(
    records: &[ObservationRecord],
) -> Result<Observations, CometfitError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| record.to_observation(index))
        .collect()
}

/// Read observations from a CSV file with a `ra,dec,time` header.
///
/// Arguments
/// ---------
/// * `path`: the CSV file; angles in degrees, timestamps ISO-8601 UTC.
///
/// Return
/// ------
/// * The observations in file order. Errors carry the zero-based index of the offending row.
pub fn read_observations_csv(path: &Utf8Path) -> Result<Observations, CometfitError> {
    let file = std::fs::File::open(path)?;
    observations_from_csv_reader(file)
}

/// Same as [`read_observations_csv`] for any reader.
pub fn observations_from_csv_reader<R: io::Read>(reader: R) -> Result<Observations, CometfitError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<ObservationRecord>()
        .enumerate()
        .map(|(index, record)| record?.to_observation(index))
        .collect()
}
