
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::gnss::signal::Band;
use crate::gnss::tracking::profiles::ProfileName;

/// Every tunable of the receiver core.  Built once by the host (usually from JSON) and shared
/// read-only with the scheduler and each channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
	pub sampling_freq_hz:f64,
	pub bands:Vec<BandConfig>,
	pub acquisition:AcquisitionConfig,
	pub tracking:TrackingConfig,
	pub bit_sync:BitSyncConfig,
	pub scheduler:SchedulerConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandConfig {
	pub band:Band,
	pub intermediate_freq_hz:f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
	pub search_band_hz:f64,
	pub threshold:f64,
	pub window_ms:usize,
	pub fine_ms:usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
	pub profile:ProfileName,
	pub stabilization_time_ms:u64,
	pub pipelining:bool,
	pub pipelining_k:f64,
	pub short_long_cycles:bool,
	pub alias_detect_interval_ms:u64,
	pub l2c_handover:bool,
	pub ephemeris_timeout_s:f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BitSyncConfig {
	pub min_count:u32,
	pub ratio:f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
	pub batch_ms:u64,
	pub measurement_interval_ms:u64,
}

impl Default for Configuration {
	fn default() -> Self {
		Self {
			sampling_freq_hz: 16.368e6,
			bands: vec![
				BandConfig{ band: Band::GpsL1, intermediate_freq_hz: 4.092e6 },
			],
			acquisition: AcquisitionConfig::default(),
			tracking: TrackingConfig::default(),
			bit_sync: BitSyncConfig::default(),
			scheduler: SchedulerConfig::default(),
		}
	}
}

impl Default for AcquisitionConfig {
	fn default() -> Self { Self{ search_band_hz: 15000.0, threshold: 20.0, window_ms: 11, fine_ms: 8 } }
}

impl Default for TrackingConfig {
	fn default() -> Self {
		Self{ profile: ProfileName::Med, stabilization_time_ms: 50, pipelining: false, pipelining_k: 0.9549,
			short_long_cycles: false, alias_detect_interval_ms: 500, l2c_handover: true, ephemeris_timeout_s: 45.0 }
	}
}

impl Default for BitSyncConfig {
	fn default() -> Self { Self{ min_count: 20, ratio: 4.0 } }
}

impl Default for SchedulerConfig {
	fn default() -> Self { Self{ batch_ms: 20, measurement_interval_ms: 100 } }
}

impl Configuration {

	pub fn from_json_str(s:&str) -> Result<Self, DigSigProcErr> {
		let config:Configuration = serde_json::from_str(s)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_json_file<P: AsRef<Path>>(path:P) -> Result<Self, DigSigProcErr> {
		let reader = BufReader::new(File::open(path)?);
		let config:Configuration = serde_json::from_reader(reader)?;
		config.validate()?;
		Ok(config)
	}

	pub fn band(&self, band:Band) -> Option<&BandConfig> { self.bands.iter().find(|b| b.band == band) }

	pub fn intermediate_freq_hz(&self, band:Band) -> Result<f64, DigSigProcErr> {
		self.band(band).map(|b| b.intermediate_freq_hz)
			.ok_or_else(|| DigSigProcErr::InvalidConfiguration(format!("band {:?} is not configured", band)))
	}

	pub fn samples_per_ms(&self) -> f64 { self.sampling_freq_hz * 1.0e-3 }

	pub fn validate(&self) -> Result<(), DigSigProcErr> {
		let bad = |msg:String| -> Result<(), DigSigProcErr> { Err(DigSigProcErr::InvalidConfiguration(msg)) };

		if !(self.sampling_freq_hz > 0.0) || !self.sampling_freq_hz.is_finite() {
			return bad(format!("sampling frequency must be positive, got {}", self.sampling_freq_hz));
		}
		if self.bands.is_empty() { return bad("at least one band is required".to_string()); }
		for (idx, b) in self.bands.iter().enumerate() {
			if b.intermediate_freq_hz < 0.0 || b.intermediate_freq_hz >= self.sampling_freq_hz / 2.0 {
				return bad(format!("IF {} Hz of {:?} is outside [0, fs/2)", b.intermediate_freq_hz, b.band));
			}
			if self.bands[..idx].iter().any(|other| other.band == b.band) {
				return bad(format!("band {:?} is listed twice", b.band));
			}
		}

		let acq = &self.acquisition;
		if !(acq.search_band_hz > 0.0) { return bad("acquisition search band must be positive".to_string()); }
		if acq.fine_ms == 0 { return bad("fine search length must be at least 1 ms".to_string()); }
		// Two coarse segments must fit, and the fine segment may start up to one code period in
		if acq.window_ms < (acq.fine_ms + 1).max(2) {
			return bad(format!("acquisition window of {} ms is too short for a {} ms fine search", acq.window_ms, acq.fine_ms));
		}

		let trk = &self.tracking;
		if !(trk.pipelining_k > 0.0 && trk.pipelining_k <= 1.0) {
			return bad(format!("pipelining_k must lie in (0, 1], got {}", trk.pipelining_k));
		}
		if trk.alias_detect_interval_ms < 2 { return bad("alias detection interval must be at least 2 ms".to_string()); }
		if !(trk.ephemeris_timeout_s > 0.0) { return bad("ephemeris timeout must be positive".to_string()); }

		if self.bit_sync.ratio < 1.0 { return bad("bit sync ratio must be at least 1".to_string()); }
		if self.scheduler.measurement_interval_ms == 0 { return bad("measurement interval must be nonzero".to_string()); }
		if self.scheduler.batch_ms == 0 { return bad("batch length must be nonzero".to_string()); }

		Ok(())
	}

}
