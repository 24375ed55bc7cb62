//! # Coarse seed generator
//!
//! Produces a rough starting orbit for the differential corrector from the first three
//! observations. This is **not** Gauss's method: no distance polynomial is solved and no
//! attempt is made to recover the true geocentric distances. The only goal is a bound orbit
//! close enough to the truth for the bounded least-squares refinement to converge.
//!
//! ## Algorithm
//! -----------------
//! For the observations `k = 1, 2, 3` (in caller order, strictly increasing times):
//!
//! 1. unit line of sight `u_k` from `(ra_k, dec_k)`,
//! 2. heliocentric Earth position `E_k` from the ephemeris,
//! 3. heliocentric object position `r_k = E_k + ρ·u_k` with a constant slant range `ρ`
//!    (`seed_range_au`, 1 AU by default),
//! 4. velocity by central difference `v = (r_3 - r_1) / (t_3 - t_1)`,
//! 5. the state `(r_2, v)` at `t_2` is converted to classical elements
//!    (energy → `a`, Laplace–Runge–Lenz → `e`, angular momentum → `i, Ω`,
//!    node and eccentricity directions → `ω`, mean anomaly → perihelion epoch).
//!
//! A constant `ρ` drops the geocentric range rate from `v`. The seed is fair near
//! opposition or when `ρ` is close to the real distance, and can be far off elsewhere.
//!
//! A parabolic or hyperbolic state is rejected with [`CometfitError::UnboundOrbit`]; the
//! caller may then supply a fixed seed instead.

use tracing::debug;

use crate::{
    cometfit_errors::CometfitError,
    constants::AstronomicalUnit,
    ephemeris::{Body, EphemerisProvider},
    observations::Observation,
    orb_elem::state_to_elements,
    orbit_determination::MIN_SEED_OBSERVATIONS,
    orbit_type::{OrbitState, StateVector},
    projection::radec_to_unit_vector,
};

/// Estimate a coarse seed orbit from the first three observations.
///
/// Arguments
/// ---------
/// * `observations`: at least three observations; only the first three are used.
/// * `ephemeris`: source of the heliocentric Earth positions.
/// * `seed_range_au`: assumed Earth–object distance for the three lines of sight.
///
/// Return
/// ------
/// * An elliptic [`OrbitState`] referred to the equator J2000.
///
/// Errors
/// ------
/// * [`CometfitError::InsufficientObservations`] with fewer than three observations.
/// * [`CometfitError::DegenerateObservationTimes`] if `t_1 < t_2 < t_3` does not hold.
/// * [`CometfitError::UnboundOrbit`] if the seed state is not elliptic.
/// * [`CometfitError::EphemerisUnavailable`] if an Earth position is missing.
pub fn estimate(
    observations: &[Observation],
    ephemeris: &dyn EphemerisProvider,
    seed_range_au: AstronomicalUnit,
) -> Result<OrbitState, CometfitError> {
    let [obs1, obs2, obs3] = match observations {
        [o1, o2, o3, ..] => [o1, o2, o3],
        _ => {
            return Err(CometfitError::InsufficientObservations {
                stage: "coarse seed",
                required: MIN_SEED_OBSERVATIONS,
                provided: observations.len(),
            })
        }
    };

    if !(obs1.time < obs2.time && obs2.time < obs3.time) {
        return Err(CometfitError::DegenerateObservationTimes(format!(
            "seed observations must be strictly increasing in time, got MJD {}, {}, {}",
            obs1.time, obs2.time, obs3.time
        )));
    }

    let heliocentric_position = |obs: &Observation| -> Result<_, CometfitError> {
        let earth = ephemeris.position_of(Body::Earth, obs.time)?;
        let line_of_sight = radec_to_unit_vector(obs.ra, obs.dec);
        Ok(earth + seed_range_au * line_of_sight)
    };

    let r1 = heliocentric_position(obs1)?;
    let r2 = heliocentric_position(obs2)?;
    let r3 = heliocentric_position(obs3)?;
    debug!(
        r1 = ?r1.as_slice(),
        r2 = ?r2.as_slice(),
        r3 = ?r3.as_slice(),
        seed_range_au,
        "coarse seed: heliocentric positions"
    );

    let velocity = (r3 - r1) / (obs3.time - obs1.time);
    let state = StateVector::new(r2, velocity, obs2.time);
    debug!(
        epoch = state.epoch,
        energy = state.specific_energy(),
        "coarse seed: central state"
    );

    let orbit = state_to_elements(&state)?;
    debug!(
        a = orbit.semi_major_axis,
        e = orbit.eccentricity,
        i_deg = orbit.inclination.to_degrees(),
        "coarse seed: elements"
    );
    Ok(orbit)
}
