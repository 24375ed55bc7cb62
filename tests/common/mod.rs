#![allow(dead_code)]

use approx::assert_abs_diff_eq;
use cometfit::constants::MJD;
use cometfit::ephemeris::EphemerisProvider;
use cometfit::observations::{Observation, ObservationRecord};
use cometfit::orbit_type::OrbitState;
use cometfit::projection::predict_radec;
use cometfit::time::{iso_to_mjd, mjd_to_iso};

/// Install a subscriber printing through the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Noiseless observations of `orbit` at `times`.
pub fn synthetic_observations(
    orbit: &OrbitState,
    times: &[MJD],
    ephemeris: &dyn EphemerisProvider,
) -> Vec<Observation> {
    times
        .iter()
        .map(|&time| {
            let (ra, dec) = predict_radec(orbit, time, ephemeris).unwrap();
            Observation::new(ra, dec, time)
        })
        .collect()
}

/// Same as [`synthetic_observations`], as request records. The epochs go through the ISO
/// rendering first so that the records describe exactly the predicted positions.
pub fn synthetic_records(
    orbit: &OrbitState,
    times: &[MJD],
    ephemeris: &dyn EphemerisProvider,
) -> Vec<ObservationRecord> {
    times
        .iter()
        .map(|&time| {
            let iso = mjd_to_iso(time);
            let time = iso_to_mjd(&iso).unwrap();
            let (ra, dec) = predict_radec(orbit, time, ephemeris).unwrap();
            ObservationRecord {
                ra: ra.to_degrees(),
                dec: dec.to_degrees(),
                time: iso,
            }
        })
        .collect()
}

/// Three nightly observations to seed the fit, then a longer arc.
pub fn observation_schedule(start: MJD) -> Vec<MJD> {
    let mut times = vec![start, start + 1.0, start + 2.0];
    times.extend((1..=9).map(|k| start + 2.0 + 10.0 * k as f64));
    times
}

pub fn assert_orbit_close(actual: &OrbitState, expected: &OrbitState, epsilon: f64) {
    assert_abs_diff_eq!(
        actual.semi_major_axis,
        expected.semi_major_axis,
        epsilon = epsilon
    );
    assert_abs_diff_eq!(
        actual.eccentricity,
        expected.eccentricity,
        epsilon = epsilon
    );
    assert_abs_diff_eq!(actual.inclination, expected.inclination, epsilon = epsilon);
    assert_abs_diff_eq!(
        actual.ascending_node_longitude,
        expected.ascending_node_longitude,
        epsilon = epsilon
    );
    assert_abs_diff_eq!(
        actual.periapsis_argument,
        expected.periapsis_argument,
        epsilon = epsilon
    );
    // Perihelion epoch in days: same relative precision as the other elements
    assert_abs_diff_eq!(
        actual.perihelion_epoch,
        expected.perihelion_epoch,
        epsilon = epsilon * 1e3
    );
}
