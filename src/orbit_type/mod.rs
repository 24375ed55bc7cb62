//! # Orbit representations
//!
//! Two representations of the same heliocentric two-body orbit are used by the pipeline:
//!
//! - [`orbit_state`](crate::orbit_type::orbit_state) – Classical elements
//!   `(a, e, i, Ω, ω, t_p)` referred to the equator J2000. This is the only artifact
//!   that leaves the pipeline.
//! - [`state_vector`](crate::orbit_type::state_vector) – Cartesian position/velocity in the
//!   equatorial J2000 frame at an epoch, produced transiently by the coarse seed and by
//!   vector-form propagation.
//!
//! Conversions
//! -----------
//! * [`StateVector`] → [`OrbitState`]: [`OrbitState::from_state_vector`] (elliptic orbits only).
//! * [`OrbitState`] → [`StateVector`]: [`propagate_state`](crate::propagation::propagate_state).
//!
//! ## Typical workflow
//!
//! ```rust, no_run
//! use nalgebra::Vector3;
//! use cometfit::orbit_type::{OrbitState, StateVector};
//!
//! let position = Vector3::new(1.2, 0.3, 0.1);
//! let velocity = Vector3::new(-0.004, 0.014, 0.006);
//! let state = StateVector::new(position, velocity, 60700.0);
//! let orbit = OrbitState::from_state_vector(&state).unwrap();
//! println!("{orbit}");
//! ```

pub mod orbit_state;
pub mod state_vector;

pub use orbit_state::OrbitState;
pub use state_vector::StateVector;

use crate::{cometfit_errors::CometfitError, orb_elem::state_to_elements};

impl OrbitState {
    /// Build classical elements from a heliocentric equatorial J2000 state vector.
    ///
    /// Return
    /// ------
    /// * The elliptic [`OrbitState`], or [`CometfitError::UnboundOrbit`] for parabolic and
    ///   hyperbolic states, or [`CometfitError::BoundsViolation`] for a rectilinear state.
    ///
    /// See also
    /// --------
    /// * [`state_to_elements`] – the underlying two-body conversion.
    pub fn from_state_vector(state: &StateVector) -> Result<Self, CometfitError> {
        state_to_elements(state)
    }
}
