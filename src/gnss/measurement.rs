
use std::collections::VecDeque;

use itertools::Itertools;
use log::{info, warn};
use serde::{Serialize, Deserialize};

use crate::gnss::constants::{gps, SPEED_OF_LIGHT};
use crate::gnss::ephemeris::{Ephemeris, SatellitePosition};
use crate::gnss::signal::SignalKind;

const SYNCHRO_BUFFER_SIZE:usize = 100;

/// Channel state at the first sample of an integration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
	pub sample_index:u64,
	pub transmit_time_s:f64,
	pub carrier_freq_hz:f64,
	pub code_freq_hz:f64,
	/// Accumulated carrier phase, whole cycles included
	pub carrier_phase_cycles:f64,
	pub locked:bool,
	pub cn0_dbhz:f64,
}

/// Recent snapshots of one channel, oldest first
#[derive(Debug, Clone, Default)]
pub struct SynchroBuffer {
	snapshots:VecDeque<Snapshot>,
}

impl SynchroBuffer {

	pub fn new() -> Self { Self::default() }

	pub fn push(&mut self, s:Snapshot) {
		self.snapshots.push_back(s);
		while self.snapshots.len() > SYNCHRO_BUFFER_SIZE { self.snapshots.pop_front(); }
	}

	pub fn clear(&mut self) { self.snapshots.clear(); }

	pub fn len(&self) -> usize { self.snapshots.len() }

	pub fn is_empty(&self) -> bool { self.snapshots.is_empty() }

	pub fn latest(&self) -> Option<&Snapshot> { self.snapshots.back() }

	/// State at `sample_index`, interpolated between the bracketing snapshots
	pub fn interpolate(&self, sample_index:u64) -> Option<Snapshot> {
		self.snapshots.iter().tuple_windows()
			.find(|(a, b)| a.sample_index <= sample_index && b.sample_index >= sample_index)
			.map(|(a, b)| {
				let span = (b.sample_index - a.sample_index) as f64;
				let f:f64 = if span > 0.0 { ((sample_index - a.sample_index) as f64) / span } else { 0.0 };
				let lerp = |x:f64, y:f64| x + (y - x)*f;
				Snapshot {
					sample_index,
					transmit_time_s: lerp(a.transmit_time_s, b.transmit_time_s),
					carrier_freq_hz: lerp(a.carrier_freq_hz, b.carrier_freq_hz),
					code_freq_hz: lerp(a.code_freq_hz, b.code_freq_hz),
					carrier_phase_cycles: lerp(a.carrier_phase_cycles, b.carrier_phase_cycles),
					locked: a.locked && b.locked,
					cn0_dbhz: b.cn0_dbhz,
				}
			})
	}

}

/// What a Measuring channel contributes to an epoch
#[derive(Debug, Clone, Copy)]
pub struct MeasurementInput<'a> {
	pub prn:usize,
	pub signal:SignalKind,
	pub intermediate_freq_hz:f64,
	pub synchro:&'a SynchroBuffer,
	pub ephemeris:Option<&'a Ephemeris>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeasurement {
	pub prn:usize,
	pub signal:SignalKind,
	pub transmit_time_s:f64,
	/// Includes an unknown whole number of code periods
	pub pseudorange_m:f64,
	pub pseudorange_rate_mps:f64,
	pub carrier_freq_hz:f64,
	pub carrier_phase_cycles:f64,
	pub cn0_dbhz:f64,
	pub lock_valid:bool,
	pub satellite:Option<SatellitePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEpoch {
	pub sample_index:u64,
	pub receiver_time_s:f64,
	pub measurements:Vec<ChannelMeasurement>,
	pub sufficient_for_pvt:bool,
}

/// Builds measurement epochs on a common receiver clock
#[derive(Debug, Clone)]
pub struct MeasurementBuilder {
	fs:f64,
	// Receiver time at a reference sample, fixed by the first epoch with data
	clock:Option<(u64, f64)>,
}

pub const MIN_MEASUREMENTS_FOR_PVT:usize = 4;

impl MeasurementBuilder {

	pub fn new(fs:f64) -> Self { Self{ fs, clock: None } }

	pub fn receiver_time(&self, sample_index:u64) -> Option<f64> {
		self.clock.map(|(s0, t0)| t0 + ((sample_index as f64) - (s0 as f64)) / self.fs)
	}

	pub fn build(&mut self, sample_index:u64, inputs:&[MeasurementInput]) -> MeasurementEpoch {
		let mut found:Vec<(&MeasurementInput, Snapshot)> = inputs.iter()
			.filter_map(|inp| inp.synchro.interpolate(sample_index).map(|s| (inp, s)))
			.collect();
		found.sort_by_key(|(inp, _)| (inp.prn, inp.signal));

		if self.clock.is_none() && !found.is_empty() {
			let latest_tx:f64 = found.iter().map(|(_, s)| s.transmit_time_s).fold(std::f64::MIN, f64::max);
			let t0 = latest_tx + gps::NOMINAL_TRAVEL_TIME_S;
			info!("Receiver clock initialized to {:.6} s at sample {}", t0, sample_index);
			self.clock = Some((sample_index, t0));
		}

		let receiver_time_s:f64 = self.receiver_time(sample_index).unwrap_or(0.0);
		let measurements:Vec<ChannelMeasurement> = found.iter().map(|(inp, s)| {
			let carrier_hz = inp.signal.carrier_freq_hz(inp.prn);
			ChannelMeasurement {
				prn: inp.prn,
				signal: inp.signal,
				transmit_time_s: s.transmit_time_s,
				pseudorange_m: (receiver_time_s - s.transmit_time_s) * SPEED_OF_LIGHT,
				pseudorange_rate_mps: -(s.carrier_freq_hz - inp.intermediate_freq_hz) * SPEED_OF_LIGHT / carrier_hz,
				carrier_freq_hz: s.carrier_freq_hz,
				carrier_phase_cycles: s.carrier_phase_cycles,
				cn0_dbhz: s.cn0_dbhz,
				lock_valid: s.locked,
				satellite: inp.ephemeris.map(|e| e.pos_and_clock(s.transmit_time_s)),
			}
		}).collect();

		let sufficient_for_pvt = measurements.len() >= MIN_MEASUREMENTS_FOR_PVT;
		if !measurements.is_empty() && !sufficient_for_pvt {
			warn!("Only {} measurements at sample {}", measurements.len(), sample_index);
		}
		MeasurementEpoch{ sample_index, receiver_time_s, measurements, sufficient_for_pvt }
	}

}
