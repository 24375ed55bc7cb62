use crate::{
    cometfit_errors::CometfitError,
    constants::GAUSS_GRAV_SQUARED,
    kepler::principal_angle,
    orbit_type::{OrbitState, StateVector},
    ref_system::rotmt,
};

/// Below this norm the angular momentum is treated as zero (rectilinear motion).
const ANGMOM_EPS: f64 = 1e-14;

/// Below this value `sin(i)` is treated as zero and the node is set to the x axis.
const NODE_EPS: f64 = 1e-14;

/// Convert a heliocentric equatorial J2000 state vector into classical elements referred to
/// the same frame.
///
/// The state is rotated into the "orbital frame" whose X axis is directed along the line
/// of nodes on the equator. The in-plane quantities follow from
/// the two-body relations:
///
/// * reciprocal semi-major axis from the energy integral, `1/a = 2/r - v²/k²`,
/// * `e·sin(E) = (r·v) / (n a²)` and `e·cos(E) = r v² / k² - 1`,
/// * inclination and node from the angular momentum `h = r × v`,
/// * argument of perihelion as the angle between the node line and the perihelion direction,
/// * perihelion epoch `t_p = t - M / n` with `M = E - e·sin(E)` taken in (-π, π].
///
/// Return
/// ------
/// * An elliptic [`OrbitState`].
///
/// Errors
/// ------
/// * [`CometfitError::UnboundOrbit`] if the state is parabolic or hyperbolic.
/// * [`CometfitError::BoundsViolation`] if the angular momentum vanishes (rectilinear motion).
pub fn state_to_elements(state: &StateVector) -> Result<OrbitState, CometfitError> {
    let position = state.position;
    let velocity = state.velocity;

    // Angular momentum vector
    let angular_momentum = position.cross(&velocity);
    let angmom_norm = angular_momentum.norm();
    if angmom_norm < ANGMOM_EPS {
        return Err(CometfitError::BoundsViolation(
            "rectilinear state vector: angular momentum vanishes".into(),
        ));
    }

    // Orbital inclination and longitude of the node
    let sini = angular_momentum.x.hypot(angular_momentum.y) / angmom_norm;
    let inclination = sini.atan2(angular_momentum.z / angmom_norm);
    let node = if sini < NODE_EPS {
        0.0
    } else {
        principal_angle(angular_momentum.x.atan2(-angular_momentum.y))
    };

    // Cartesian coordinates with respect to the "orbital frame" (X axis along the line of nodes)
    let rot = rotmt(-inclination, 0) * rotmt(-node, 2);
    let xorb = rot * position;
    let vorb = rot * velocity;

    let rs = xorb.x.hypot(xorb.y);
    let v2 = vorb.x * vorb.x + vorb.y * vorb.y;
    let rv = xorb.x * vorb.x + xorb.y * vorb.y;

    // Reciprocal semimajor axis
    let reca = 2.0 / rs - v2 / GAUSS_GRAV_SQUARED;
    let ecose = v2 * rs / GAUSS_GRAV_SQUARED - 1.0;

    if reca <= 0.0 {
        let lenz = (velocity.cross(&angular_momentum) / GAUSS_GRAV_SQUARED) - position / rs;
        return Err(CometfitError::UnboundOrbit {
            eccentricity: lenz.norm(),
        });
    }

    let sma = 1.0 / reca;
    let enne = (GAUSS_GRAV_SQUARED / sma.powi(3)).sqrt();

    // Eccentricity
    let esine = rv / (enne * sma * sma);
    let ecc = esine.hypot(ecose);
    if ecc >= 1.0 {
        return Err(CometfitError::UnboundOrbit { eccentricity: ecc });
    }

    let anec = esine.atan2(ecose);
    let emme = anec - ecc * anec.sin();

    // Argument of pericenter
    let x1 = anec.cos() - ecc;
    let x2 = (1.0 - ecc * ecc).sqrt() * anec.sin();
    let xm = x1.hypot(x2);
    let (x1, x2) = (x1 / xm, x2 / xm);
    let sinper = x1 * xorb.y - x2 * xorb.x;
    let cosper = x1 * xorb.x + x2 * xorb.y;
    let argper = principal_angle(sinper.atan2(cosper));

    OrbitState::new(
        sma,
        ecc,
        inclination,
        node,
        argper,
        state.epoch - emme / enne,
    )
}

#[cfg(test)]
mod orb_elem_test {
    use super::*;
    use crate::{
        constants::{GAUSS_GRAV, OBLIQUITY_J2000},
        propagation::propagate_state,
        ref_system::ecliptic_to_equatorial,
    };
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_elements_round_trip() {
        let orbit = OrbitState::from_degrees(2.5, 0.3, 12.0, 80.0, 60.0, 60700.0).unwrap();

        for dt in [-400.0, -37.5, 0.0, 12.25, 250.0, 900.0] {
            let state = propagate_state(&orbit, orbit.perihelion_epoch + dt).unwrap();
            let back = state_to_elements(&state).unwrap();

            assert_relative_eq!(back.semi_major_axis, orbit.semi_major_axis, epsilon = 1e-10);
            assert_relative_eq!(back.eccentricity, orbit.eccentricity, epsilon = 1e-10);
            assert_relative_eq!(back.inclination, orbit.inclination, epsilon = 1e-10);
            assert_relative_eq!(
                back.ascending_node_longitude,
                orbit.ascending_node_longitude,
                epsilon = 1e-10
            );
            assert_relative_eq!(
                back.periapsis_argument,
                orbit.periapsis_argument,
                epsilon = 1e-10
            );

            // The recovered perihelion passage is the one closest to the state epoch
            let shift = (back.perihelion_epoch - orbit.perihelion_epoch) / orbit.period();
            assert_relative_eq!(shift, shift.round(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_circular_equatorial_orbit() {
        // Circular prograde orbit at 1 AU in the equatorial plane
        let state = StateVector::new(
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(-GAUSS_GRAV, 0.0, 0.0),
            60000.0,
        );
        let orbit = state_to_elements(&state).unwrap();
        assert_relative_eq!(orbit.semi_major_axis, 1.0, epsilon = 1e-12);
        assert!(orbit.eccentricity < 1e-12);
        assert_relative_eq!(orbit.inclination, 0.0, epsilon = 1e-12);
        assert_eq!(orbit.ascending_node_longitude, 0.0);
    }

    #[test]
    fn test_circular_ecliptic_orbit_is_inclined_by_obliquity() {
        // Same orbit in the ecliptic plane: the node is the vernal equinox
        let state = StateVector::new(
            ecliptic_to_equatorial(&Vector3::new(0.0, 1.0, 0.0)),
            ecliptic_to_equatorial(&Vector3::new(-GAUSS_GRAV, 0.0, 0.0)),
            60000.0,
        );
        let orbit = state_to_elements(&state).unwrap();
        assert_relative_eq!(orbit.semi_major_axis, 1.0, epsilon = 1e-12);
        assert_relative_eq!(orbit.inclination, OBLIQUITY_J2000, epsilon = 1e-12);
        assert_relative_eq!(orbit.ascending_node_longitude, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unbound_state_is_rejected() {
        let state =
            StateVector::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.03, 0.0), 0.0);
        let err = state_to_elements(&state).unwrap_err();
        match err {
            CometfitError::UnboundOrbit { eccentricity } => assert!(eccentricity > 1.0),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_rectilinear_state_is_rejected() {
        let state =
            StateVector::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.01, 0.0, 0.0), 0.0);
        assert!(matches!(
            state_to_elements(&state),
            Err(CometfitError::BoundsViolation(_))
        ));
    }
}
