//! # Ephemeris providers
//!
//! Heliocentric positions of the solar-system bodies the pipeline needs, in the equatorial
//! J2000 frame and in AU. The orbit is heliocentric, so the Sun sits at the origin and the
//! only body that actually requires data is the Earth.
//!
//! ## Backends
//! -----------------
//! * [`AnalyticEphemeris`] – Earth–Moon barycentre from the low-precision JPL Keplerian
//!   elements (valid 1800–2050, error of a few 1e-5 AU). No data file needed.
//! * [`TableEphemeris`] – tabulated Earth positions read from a CSV file (`mjd,x,y,z`),
//!   interpolated with a 4-point Lagrange polynomial.
//!
//! ## Source selection
//! -----------------
//! An [`EphemerisSource`] is parsed from a descriptor string:
//!
//! * `"analytic"` – the analytic model,
//! * `"table:<path>"` – a CSV table at `<path>`.
//!
//! [`EphemerisSource::from_env`] reads the descriptor from the `COMETFIT_EPHEMERIS`
//! environment variable and defaults to `"analytic"` when it is unset.
//!
//! [`Ephemeris::new`] loads the selected backend eagerly. Loading happens once, before any
//! fit, and a failure is reported to the caller instead of falling back to another source.
//!
//! ## Example
//! -----------------
//! ```rust, no_run
//! use cometfit::ephemeris::{Body, Ephemeris, EphemerisProvider, EphemerisSource};
//!
//! let source: EphemerisSource = "analytic".try_into().unwrap();
//! let ephem = Ephemeris::new(&source).unwrap();
//! let earth = ephem.position_of(Body::Earth, 60700.0).unwrap();
//! println!("Earth at MJD 60700: {earth:?}");
//! ```

pub mod analytic;
pub mod table;

use std::{fmt, str::FromStr};

use camino::Utf8PathBuf;
use nalgebra::Vector3;
use tracing::info;

use crate::{cometfit_errors::CometfitError, constants::MJD};

pub use analytic::AnalyticEphemeris;
pub use table::TableEphemeris;

/// Environment variable holding the ephemeris source descriptor.
pub const EPHEMERIS_ENV_VAR: &str = "COMETFIT_EPHEMERIS";

/// Solar-system bodies known to the providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Earth,
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Sun => write!(f, "Sun"),
            Body::Earth => write!(f, "Earth"),
        }
    }
}

/// Source of heliocentric body positions.
///
/// Implementations return the position of `body` at `time` (MJD, TT) in the equatorial
/// J2000 frame, in AU, relative to the Sun. A time outside the coverage of the provider is
/// reported as [`CometfitError::EphemerisUnavailable`].
pub trait EphemerisProvider: Send + Sync {
    fn position_of(&self, body: Body, time: MJD) -> Result<Vector3<f64>, CometfitError>;
}

/// Descriptor of the ephemeris backend to load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EphemerisSource {
    #[default]
    Analytic,
    Table(Utf8PathBuf),
}

impl EphemerisSource {
    /// Read the source descriptor from the `COMETFIT_EPHEMERIS` environment variable.
    ///
    /// Return
    /// ------
    /// * [`EphemerisSource::Analytic`] when the variable is unset, the parsed descriptor
    ///   otherwise, or [`CometfitError::InvalidEphemerisSource`] for an unknown descriptor.
    pub fn from_env() -> Result<Self, CometfitError> {
        match std::env::var(EPHEMERIS_ENV_VAR) {
            Ok(value) => Self::from_descriptor(Some(&value)),
            Err(std::env::VarError::NotPresent) => Self::from_descriptor(None),
            Err(err) => Err(CometfitError::InvalidEphemerisSource(format!(
                "{EPHEMERIS_ENV_VAR}: {err}"
            ))),
        }
    }

    fn from_descriptor(value: Option<&str>) -> Result<Self, CometfitError> {
        match value {
            None => Ok(EphemerisSource::default()),
            Some(descriptor) => descriptor.parse(),
        }
    }
}

impl FromStr for EphemerisSource {
    type Err = CometfitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let descriptor = s.trim();
        if descriptor.eq_ignore_ascii_case("analytic") {
            return Ok(EphemerisSource::Analytic);
        }
        match descriptor.split_once(':') {
            Some((kind, path)) if kind.eq_ignore_ascii_case("table") && !path.is_empty() => {
                Ok(EphemerisSource::Table(Utf8PathBuf::from(path)))
            }
            _ => Err(CometfitError::InvalidEphemerisSource(format!(
                "{s:?} (expected \"analytic\" or \"table:<path>\")"
            ))),
        }
    }
}

impl TryFrom<&str> for EphemerisSource {
    type Error = CometfitError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for EphemerisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EphemerisSource::Analytic => write!(f, "analytic"),
            EphemerisSource::Table(path) => write!(f, "table:{path}"),
        }
    }
}

/// A loaded ephemeris backend.
#[derive(Debug, Clone)]
pub enum Ephemeris {
    Analytic(AnalyticEphemeris),
    Table(TableEphemeris),
}

impl Ephemeris {
    /// Load the backend described by `source`.
    ///
    /// Errors
    /// ------
    /// * [`CometfitError::EphemerisLoad`] if a table cannot be read or is malformed.
    pub fn new(source: &EphemerisSource) -> Result<Self, CometfitError> {
        let ephem = match source {
            EphemerisSource::Analytic => Ephemeris::Analytic(AnalyticEphemeris::default()),
            EphemerisSource::Table(path) => Ephemeris::Table(TableEphemeris::from_csv(path)?),
        };
        info!(source = %source, "ephemeris loaded");
        Ok(ephem)
    }
}

impl EphemerisProvider for Ephemeris {
    fn position_of(&self, body: Body, time: MJD) -> Result<Vector3<f64>, CometfitError> {
        match self {
            Ephemeris::Analytic(analytic) => analytic.position_of(body, time),
            Ephemeris::Table(table) => table.position_of(body, time),
        }
    }
}
