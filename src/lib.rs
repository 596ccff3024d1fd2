
use thiserror::Error;

use crate::gnss::signal::SignalKind;

pub mod config;
pub mod filters;
pub mod fourier_analysis;
pub mod io;
pub mod gnss;

pub mod utils;

#[cfg(test)]
pub(crate) mod test_signals;

pub use crate::config::Configuration;
pub use crate::gnss::acquisition::{AcquisitionResult, AcquisitionStatus};
pub use crate::gnss::measurement::{ChannelMeasurement, MeasurementEpoch};
pub use crate::gnss::scheduler::{Scheduler, RunSummary, StopReason};
pub use crate::gnss::tracking::TrackingSample;
pub use crate::io::{SampleProvider, SampleWindow};

#[derive(Debug, Error)]
pub enum DigSigProcErr {
	#[error("PRN {prn} is not defined for {signal:?}")]
	UnsupportedPrn{ prn:usize, signal:SignalKind },
	#[error("invalid configuration: {0}")]
	InvalidConfiguration(String),
	#[error("end of sample stream")]
	EndOfStream,
	#[error("sample provider I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
	#[error("loop filter tuning did not converge for {bandwidth_hz} Hz at T = {integration_s} s")]
	LoopTuneFailed{ bandwidth_hz:f64, integration_s:f64 },
	#[error("numerical fault: {0}")]
	NumericalFault(&'static str),
	#[error("loss of lock")]
	LossOfLock,
	#[error("invalid telemetry data: {0}")]
	InvalidTelemetryData(&'static str),
	#[error("no satellites acquired")]
	NoSatellitesAcquired,
	#[error("unsupported record format version {0}")]
	UnsupportedVersion(u32),
}
