//! Tabulated Earth ephemeris.
//!
//! The table is a CSV file with a header and one row per epoch:
//!
//! ```text
//! mjd,x,y,z
//! 60000.0,-0.9125,0.3687,0.1599
//! ...
//! ```
//!
//! `mjd` is the epoch (MJD, TT) and `x, y, z` the heliocentric equatorial J2000 position of
//! the Earth in AU. Epochs must be strictly increasing and the table must hold at least
//! four rows. Positions between two rows are interpolated with the Lagrange polynomial
//! through the four surrounding rows (the window is shifted inwards near the table edges).
//! Requests outside `[first epoch, last epoch]` are not extrapolated.

use std::io;

use camino::Utf8Path;
use nalgebra::Vector3;
use serde::Deserialize;
use tracing::debug;

use crate::{
    cometfit_errors::CometfitError,
    constants::MJD,
    ephemeris::{Body, EphemerisProvider},
};

/// Number of rows used by the interpolation polynomial.
const INTERPOLATION_POINTS: usize = 4;

#[derive(Debug, Deserialize, PartialEq)]
struct EphemerisRecord {
    mjd: f64,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableEphemeris {
    epochs: Vec<MJD>,
    positions: Vec<Vector3<f64>>,
}

impl TableEphemeris {
    /// Read a table from a CSV file.
    ///
    /// Errors
    /// ------
    /// * [`CometfitError::EphemerisLoad`] if the file cannot be opened, a row cannot be
    ///   parsed, or the rows violate the table rules.
    pub fn from_csv(path: &Utf8Path) -> Result<Self, CometfitError> {
        let file = std::fs::File::open(path).map_err(|err| CometfitError::EphemerisLoad {
            path: path.to_string(),
            reason: err.to_string(),
        })?;
        Self::from_reader(file, path.as_str())
    }

    /// Read a table from any CSV source; `origin` names the source in error messages.
    pub fn from_reader<R: io::Read>(reader: R, origin: &str) -> Result<Self, CometfitError> {
        let load_error = |reason: String| CometfitError::EphemerisLoad {
            path: origin.to_string(),
            reason,
        };

        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let records = csv_reader
            .deserialize::<EphemerisRecord>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| load_error(err.to_string()))?;

        let (epochs, positions) = records
            .into_iter()
            .map(|rec| (rec.mjd, Vector3::new(rec.x, rec.y, rec.z)))
            .unzip();

        let table = Self::from_rows(epochs, positions).map_err(|err| match err {
            CometfitError::EphemerisLoad { reason, .. } => load_error(reason),
            other => other,
        })?;
        debug!(origin, rows = table.epochs.len(), "ephemeris table parsed");
        Ok(table)
    }

    /// Build a table from epochs and matching Earth positions.
    pub fn from_rows(
        epochs: Vec<MJD>,
        positions: Vec<Vector3<f64>>,
    ) -> Result<Self, CometfitError> {
        let invalid = |reason: String| CometfitError::EphemerisLoad {
            path: "<memory>".to_string(),
            reason,
        };

        if epochs.len() != positions.len() {
            return Err(invalid(format!(
                "{} epochs for {} positions",
                epochs.len(),
                positions.len()
            )));
        }
        if epochs.len() < INTERPOLATION_POINTS {
            return Err(invalid(format!(
                "at least {INTERPOLATION_POINTS} rows are required, got {}",
                epochs.len()
            )));
        }
        if epochs.iter().any(|t| !t.is_finite())
            || positions.iter().any(|p| p.iter().any(|c| !c.is_finite()))
        {
            return Err(invalid("non-finite value in table".into()));
        }
        if let Some(w) = epochs.windows(2).find(|w| w[1] <= w[0]) {
            return Err(invalid(format!(
                "epochs must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }

        Ok(TableEphemeris { epochs, positions })
    }

    /// First and last tabulated epochs (MJD, TT).
    pub fn time_span(&self) -> (MJD, MJD) {
        // from_rows guarantees at least INTERPOLATION_POINTS rows
        (self.epochs[0], self.epochs[self.epochs.len() - 1])
    }

    fn interpolate(&self, time: MJD) -> Result<Vector3<f64>, CometfitError> {
        let (first, last) = self.time_span();
        if !(first..=last).contains(&time) {
            return Err(CometfitError::EphemerisUnavailable {
                body: Body::Earth.to_string(),
                time,
                reason: format!("outside the ephemeris table span [{first}, {last}]"),
            });
        }

        // index of the first epoch strictly after `time`
        let upper = self.epochs.partition_point(|&t| t <= time);
        let start = upper
            .saturating_sub(INTERPOLATION_POINTS / 2)
            .min(self.epochs.len() - INTERPOLATION_POINTS);
        let window = start..start + INTERPOLATION_POINTS;

        let epochs = &self.epochs[window.clone()];
        let positions = &self.positions[window];

        Ok(epochs
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(j, (&tj, pj))| {
                let weight = epochs
                    .iter()
                    .enumerate()
                    .filter(|&(m, _)| m != j)
                    .map(|(_, &tm)| (time - tm) / (tj - tm))
                    .product::<f64>();
                pj * weight
            })
            .sum())
    }
}

impl EphemerisProvider for TableEphemeris {
    fn position_of(&self, body: Body, time: MJD) -> Result<Vector3<f64>, CometfitError> {
        match body {
            Body::Sun => Ok(Vector3::zeros()),
            Body::Earth => self.interpolate(time),
        }
    }
}
