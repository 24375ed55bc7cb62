use hifitime::{Epoch, TimeScale, Unit};
use std::str::FromStr;

use crate::{cometfit_errors::CometfitError, constants::MJD};

/// Transformation from an ISO-8601 UTC timestamp to a modified julian date (MJD) in the TT frame
///
/// Accepted inputs are the forms understood by [`hifitime`] (e.g. `2025-01-01T12:30:00`,
/// `2025-01-01T12:30:00.5 UTC`) plus a trailing `Z` designator.
/// A timestamp without explicit time scale is read as UTC.
///
/// Argument
/// --------
/// * `date`: the timestamp string
///
/// Return
/// ------
/// * the instant as MJD (TT), or [`CometfitError::InvalidTimestamp`]
pub fn iso_to_mjd(date: &str) -> Result<MJD, CometfitError> {
    let trimmed = date.trim();
    let normalized = match trimmed.strip_suffix('Z') {
        Some(stripped) => format!("{stripped} UTC"),
        None => trimmed.to_string(),
    };

    Epoch::from_str(&normalized)
        .map(|epoch| epoch.to_mjd_tt_days())
        .map_err(|err| CometfitError::InvalidTimestamp {
            input: date.to_string(),
            reason: err.to_string(),
        })
}

/// Transformation from a modified julian date (MJD, TT frame) to an RFC 3339 UTC timestamp
///
/// The instant is rounded to the millisecond before it is split into calendar fields, so an
/// epoch read from a whole-second timestamp renders back to the same second.
///
/// Argument
/// --------
/// * `mjd`: the instant in MJD (TT)
///
/// Return
/// ------
/// * the UTC timestamp with millisecond precision, e.g. `2025-01-01T00:00:00.000Z`
pub fn mjd_to_iso(mjd: MJD) -> String {
    let epoch = Epoch::from_mjd_in_time_scale(mjd, TimeScale::TT)
        .to_time_scale(TimeScale::UTC)
        .round(Unit::Millisecond * 1_i64);
    let (year, month, day, hour, minute, second, nanos) = epoch.to_gregorian_utc();
    format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{:03}Z",
        nanos / 1_000_000
    )
}

/// Julian centuries of TT elapsed since J2000.0
pub(crate) fn julian_centuries_since_j2000(mjd: MJD) -> f64 {
    (mjd - crate::constants::T2000) / 36525.0
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_iso_to_mjd() {
        // 2000-01-01T11:58:55.816 UTC is J2000.0 (TT)
        let mjd = iso_to_mjd("2000-01-01T11:58:55.816").unwrap();
        assert_abs_diff_eq!(mjd, 51544.5, epsilon = 1e-8);

        let with_designator = iso_to_mjd("2000-01-01T11:58:55.816Z").unwrap();
        assert_abs_diff_eq!(with_designator, mjd, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_timestamp() {
        let err = iso_to_mjd("not a date").unwrap_err();
        assert!(matches!(err, CometfitError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_mjd_round_trip() {
        let mjd = iso_to_mjd("2025-03-14T06:00:00").unwrap();
        let iso = mjd_to_iso(mjd);
        assert_eq!(iso, "2025-03-14T06:00:00.000Z");
        assert_abs_diff_eq!(iso_to_mjd(&iso).unwrap(), mjd, epsilon = 1e-9);
    }

    #[test]
    fn test_mjd_to_iso_is_rfc3339() {
        // New year's midnight sits right on a day boundary: float noise must not step back
        let iso = mjd_to_iso(iso_to_mjd("2025-01-01T00:00:00").unwrap());
        assert_eq!(iso, "2025-01-01T00:00:00.000Z");

        // J2000.0 in TT
        assert_eq!(mjd_to_iso(51544.5), "2000-01-01T11:58:55.816Z");

        let half_second = iso_to_mjd("2024-02-29T23:59:59.5Z").unwrap();
        assert_eq!(mjd_to_iso(half_second), "2024-02-29T23:59:59.500Z");
    }

    #[test]
    fn test_julian_centuries() {
        assert_eq!(julian_centuries_since_j2000(51544.5), 0.0);
        assert_abs_diff_eq!(
            julian_centuries_since_j2000(51544.5 + 36525.0),
            1.0,
            epsilon = 1e-15
        );
    }
}
