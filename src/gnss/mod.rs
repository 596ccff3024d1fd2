
pub mod constants;
pub mod signal;

/// Replica chip sequences for every supported signal and the process-wide table that holds them
pub mod code;

/// FFT-based parallel code phase search and fine Doppler refinement
pub mod acquisition;

/// Correlator, lock and alias detection, and the per-satellite tracking state machine
pub mod tracking;

pub mod telemetry_decode;

pub mod ephemeris;
pub mod measurement;
pub mod scheduler;
