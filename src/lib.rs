pub mod close_approach;
pub mod cometfit;
pub mod cometfit_errors;
pub mod constants;
pub mod ephemeris;
pub mod kepler;
pub mod least_squares;
pub mod observations;
mod orb_elem;
pub mod orbit_determination;
pub mod orbit_type;
pub mod projection;
pub mod propagation;
pub mod ref_system;
pub mod time;
