mod common;

use camino::Utf8Path;
use cometfit::close_approach::{scan, ScanWindow};
use cometfit::cometfit::Cometfit;
use cometfit::cometfit_errors::CometfitError;
use cometfit::constants::{GAUSS_GRAV, OBLIQUITY_J2000};
use cometfit::ephemeris::{
    AnalyticEphemeris, Body, EphemerisProvider, EphemerisSource, TableEphemeris,
};
use cometfit::kepler::KeplerSolver;
use cometfit::orbit_determination::FitParams;
use cometfit::orbit_type::{OrbitState, StateVector};
use nalgebra::{Rotation3, Unit};

use crate::common::init_tracing;

const TABLE: &str = "tests/data/earth_table.csv";

/// Circular 1 AU orbit inclined by 30° on the ecliptic, in phase with the tabulated Earth:
/// both bodies sit on the equinox line at MJD 60000 and half a period later.
fn inclined_twin() -> OrbitState {
    let inclination = 30.0 + OBLIQUITY_J2000.to_degrees();
    OrbitState::from_degrees(1.0, 0.0, inclination, 0.0, 0.0, 60000.0).unwrap()
}

#[test]
fn test_scan_finds_node_crossing() {
    init_tracing();
    let table = TableEphemeris::from_csv(Utf8Path::new(TABLE)).unwrap();
    let orbit = inclined_twin();
    let crossing = 60000.0 + orbit.period() / 2.0;
    // Relative speed at the node: 2·sin(15°)·k AU/day
    let relative_speed = 2.0 * 15.0_f64.to_radians().sin() * GAUSS_GRAV;

    for step in [1.0, 0.1] {
        let window = ScanWindow::new(60010.0, 60300.0, step);
        let approach = scan(&orbit, &window, &table, &KeplerSolver::default(), 100_000).unwrap();
        assert!((approach.time - crossing).abs() <= step, "{approach:?}");
        assert!(approach.distance <= relative_speed * step, "{approach:?}");
    }
}

#[test]
fn test_five_year_scan_finds_crossing() {
    init_tracing();
    let ephem = AnalyticEphemeris::default();
    let crossing = 60500.4;

    // Leave the Earth's position at the crossing a little faster and tilted out of its plane
    let earth = ephem.position_of(Body::Earth, crossing).unwrap();
    let h = 1e-3;
    let earth_velocity = (ephem.position_of(Body::Earth, crossing + h).unwrap()
        - ephem.position_of(Body::Earth, crossing - h).unwrap())
        / (2.0 * h);
    let tilt = Rotation3::from_axis_angle(&Unit::new_normalize(earth), 25.0_f64.to_radians());
    let velocity = 1.1 * (tilt * earth_velocity);
    let orbit =
        OrbitState::from_state_vector(&StateVector::new(earth, velocity, crossing)).unwrap();

    let window = ScanWindow::new(60100.0, 60100.0 + 1826.25, 1.0);
    assert_eq!(window.sample_count(1_000_000).unwrap(), 1827);
    let approach = scan(&orbit, &window, &ephem, &KeplerSolver::default(), 1_000_000).unwrap();

    let travel_per_step = (velocity - earth_velocity).norm() * window.step;
    assert!(approach.distance <= travel_per_step, "{approach:?}");
    assert!((approach.time - crossing).abs() <= window.step, "{approach:?}");
}

#[test]
fn test_scan_through_facade() {
    let params = FitParams::builder()
        .scan_window_days(300.0)
        .scan_step_days(0.5)
        .build()
        .unwrap();
    let source = EphemerisSource::try_from(format!("table:{TABLE}").as_str()).unwrap();
    let cometfit = Cometfit::new(&source, params).unwrap();

    // Default window from the perihelion epoch: the first crossing is the window start
    let approach = cometfit.close_approach(&inclined_twin(), None).unwrap();
    assert_eq!(approach.time, 60000.0);
    assert!(approach.distance < 1e-8, "{approach:?}");
}

#[test]
fn test_scan_beyond_table_fails() {
    let cometfit = Cometfit::new(
        &EphemerisSource::Table(TABLE.into()),
        FitParams::default(),
    )
    .unwrap();
    let (_, last) = TableEphemeris::from_csv(Utf8Path::new(TABLE))
        .unwrap()
        .time_span();

    // The default window spans five years, the table about one
    let err = cometfit.close_approach(&inclined_twin(), None).unwrap_err();
    assert!(
        matches!(err, CometfitError::EphemerisUnavailable { time, .. } if time > last),
        "{err:?}"
    );
}

#[test]
fn test_oversized_grid_is_rejected() {
    let params = FitParams::builder().scan_max_samples(1000).build().unwrap();
    let cometfit = Cometfit::new(&EphemerisSource::Analytic, params).unwrap();

    // 1827 samples over the default window
    assert!(matches!(
        cometfit.close_approach(&inclined_twin(), None),
        Err(CometfitError::InvalidScanWindow(_))
    ));
    assert!(cometfit
        .close_approach(
            &inclined_twin(),
            Some(ScanWindow::new(60000.0, 60500.0, 1.0))
        )
        .is_ok());
}

#[test]
fn test_table_and_provider_agree_at_nodes() {
    let table = TableEphemeris::from_csv(Utf8Path::new(TABLE)).unwrap();
    let cometfit = Cometfit::new(
        &EphemerisSource::Table(TABLE.into()),
        FitParams::default(),
    )
    .unwrap();
    for time in [60000.0, 60123.0, 60400.0] {
        assert_eq!(
            table.position_of(Body::Earth, time),
            cometfit.ephemeris().position_of(Body::Earth, time)
        );
    }
}

#[test]
fn test_table_loading_fails_loudly() {
    for descriptor in [
        "table:tests/data/unsorted_earth_table.csv",
        "table:tests/data/does_not_exist.csv",
    ] {
        let source = EphemerisSource::try_from(descriptor).unwrap();
        assert!(matches!(
            Cometfit::new(&source, FitParams::default()),
            Err(CometfitError::EphemerisLoad { .. })
        ));
    }
    assert!(matches!(
        EphemerisSource::try_from("horizons:DE440"),
        Err(CometfitError::InvalidEphemerisSource(_))
    ));
}
