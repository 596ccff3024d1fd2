
use std::sync::Arc;

use log::{debug, info, warn};
use num_complex::Complex;
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::config::Configuration;
use crate::filters::{self, LoopAiding, TrackingLoop};
use crate::gnss::acquisition::{AcquisitionResult, AcquisitionStatus};
use crate::gnss::constants::gps;
use crate::gnss::ephemeris::Ephemeris;
use crate::gnss::measurement::{MeasurementInput, Snapshot, SynchroBuffer};
use crate::gnss::signal::{Band, SignalKind};
use crate::gnss::telemetry_decode::{BitSync, EphemerisSubframes, SubframeSync, SyncEvent};
use crate::gnss::telemetry_decode::subframe::Subframe;
use crate::gnss::tracking::TrackingSample;
use crate::gnss::tracking::alias_detector::{self, AliasDetector};
use crate::gnss::tracking::correlator::{Correlation, Correlator, NcoState};
use crate::gnss::tracking::lock_detector::LockDetector;
use crate::gnss::tracking::profiles::{StageParams, TrackingProfile};
use crate::io::SampleWindow;

const ALIAS_TIME_DIFF_S:f64 = 2.0e-3;
const ALIAS_SLICE_MS:u64 = 1;
const BIT_MS:u64 = gps::MS_PER_BIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelState {
	Stage1,
	Stage2,
	BitSynced,
	SubframeSynced,
	Measuring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LostReason {
	LossOfLock,
	NumericalFault,
	LoopTuneFailed,
	EphemerisTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
	Active,
	Lost(LostReason),
}

/// Seed for a channel on another signal of the same satellite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Handover {
	pub prn:usize,
	pub signal:SignalKind,
	pub sample_index:u64,
	pub code_phase_chips:f64,
	pub carrier_freq_hz:f64,
}

impl Handover {

	pub fn as_acquisition(&self) -> AcquisitionResult {
		AcquisitionResult{ prn: self.prn, signal: self.signal, carrier_freq_hz: self.carrier_freq_hz,
			code_phase_chips: self.code_phase_chips, snr: 0.0, status: AcquisitionStatus::Acquired, sample_index: self.sample_index }
	}

}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
	StateChanged{ sample_index:u64, from:ChannelState, to:ChannelState },
	Subframe(Subframe),
	ParityFailure,
	Handover(Handover),
	Lost(LostReason),
}

/// Everything one call to `TrackingChannel::process` produced
#[derive(Debug, Clone)]
pub struct ChannelOutput {
	pub prn:usize,
	pub signal:SignalKind,
	pub samples:Vec<TrackingSample>,
	pub events:Vec<ChannelEvent>,
}

// Subframe start in code milliseconds and its GPS time of week
#[derive(Debug, Clone, Copy)]
struct TowAnchor {
	ms:u64,
	tow_s:f64,
}

impl From<&DigSigProcErr> for LostReason {
	fn from(e:&DigSigProcErr) -> Self {
		match e {
			DigSigProcErr::LossOfLock => LostReason::LossOfLock,
			DigSigProcErr::LoopTuneFailed{ .. } => LostReason::LoopTuneFailed,
			_ => LostReason::NumericalFault,
		}
	}
}

/// Tracks one signal of one satellite from an acquisition (or handover) to measurements.
///
/// Integrations always begin on a code millisecond boundary of the replica.  `ms_count` numbers
/// those milliseconds; for signals with a code period longer than 1 ms it stays congruent to the
/// millisecond index within the code period.
pub struct TrackingChannel {
	pub prn:usize,
	pub signal:SignalKind,
	config:Arc<Configuration>,
	profile:TrackingProfile,
	intermediate_freq_hz:f64,

	correlator:Correlator,
	trk_loop:Box<dyn TrackingLoop>,
	loop_int_ms:u32,
	lock:LockDetector,
	alias:AliasDetector,
	bit_sync:BitSync,
	subframe_sync:SubframeSync,
	subframes:EphemerisSubframes,
	ephemeris:Option<Ephemeris>,
	synchro:SynchroBuffer,

	state:ChannelState,
	status:ChannelStatus,
	nco:NcoState,
	// Whole and fractional carrier cycles since the channel started
	carrier_phase_cycles:f64,
	next_start:u64,
	ms_count:u64,
	ms_tracked:u64,
	stage_ms:u64,

	bit_acc:f64,
	bit_ms:u64,
	first_bit_ms:u64,
	bit_synced_ms:u64,
	anchor:Option<TowAnchor>,
	handover_sent:bool,
}

impl TrackingChannel {

	pub fn new(acq:&AcquisitionResult, config:Arc<Configuration>) -> Result<Self, DigSigProcErr> {
		let signal = acq.signal;
		let prn = acq.prn;
		let fs = config.sampling_freq_hz;
		let intermediate_freq_hz = config.intermediate_freq_hz(signal.band())? + signal.slot_offset_hz(prn);
		let profile = config.tracking.profile.profile();
		let correlator = Correlator::new(prn, signal, fs)?;

		let aiding = Self::aiding_for(prn, signal, intermediate_freq_hz);
		let carrier_freq_hz = acq.carrier_freq_hz;
		let code_freq_hz = aiding.nominal_code_freq_hz + aiding.code_aiding(carrier_freq_hz);

		// Start on the next code millisecond boundary after the acquisition sample
		let cpm = signal.chips_per_ms();
		let replica_len = signal.replica_length() as f64;
		let step = code_freq_hz / fs;
		if !(step > 0.0) { return Err(DigSigProcErr::NumericalFault("code NCO rate is not positive")); }
		let cp = acq.code_phase_chips.rem_euclid(replica_len);
		let next_ms_idx:f64 = (cp / cpm).floor() + 1.0;
		let n_skip:f64 = ((next_ms_idx * cpm - cp) / step).ceil();
		let code_phase_chips = (cp + n_skip * step).rem_euclid(replica_len);
		let ms_count:u64 = (next_ms_idx as u64) % signal.code_period_ms();

		let stage = profile.stages[0];
		let trk_loop = filters::make_loop(stage.loop_order, &stage.loop_params(stage.integration_ms), aiding, code_freq_hz, carrier_freq_hz)?;

		let mut bit_sync = BitSync::new(config.bit_sync.min_count, config.bit_sync.ratio);
		// The L2 CM code period matches the nav symbol
		if signal == SignalKind::GpsL2Cm { bit_sync.force(0); }

		let alias = AliasDetector::new(AliasDetector::acc_len_for(config.tracking.alias_detect_interval_ms, ALIAS_SLICE_MS), ALIAS_TIME_DIFF_S);

		info!("PRN {} {:?}: tracking from sample {} at {:.1} Hz", prn, signal, acq.sample_index, carrier_freq_hz - intermediate_freq_hz);

		Ok(Self {
			prn, signal, profile, intermediate_freq_hz, correlator, trk_loop,
			loop_int_ms: stage.integration_ms,
			lock: LockDetector::new(stage.lock.params()),
			alias, bit_sync,
			subframe_sync: SubframeSync::new(prn),
			subframes: EphemerisSubframes::new(),
			ephemeris: None,
			synchro: SynchroBuffer::new(),
			state: ChannelState::Stage1,
			status: ChannelStatus::Active,
			nco: NcoState{ carrier_freq_hz, code_freq_hz, carrier_phase_cycles: 0.0, code_phase_chips },
			carrier_phase_cycles: 0.0,
			next_start: acq.sample_index + (n_skip as u64),
			ms_count, ms_tracked: 0, stage_ms: 0,
			bit_acc: 0.0, bit_ms: 0, first_bit_ms: 0, bit_synced_ms: 0,
			anchor: None, handover_sent: false,
			config,
		})
	}

	fn aiding_for(prn:usize, signal:SignalKind, intermediate_freq_hz:f64) -> LoopAiding {
		LoopAiding{ intermediate_freq_hz, nominal_code_freq_hz: signal.chip_rate_hz(), carr_to_code: signal.carr_to_code(prn) }
	}

	// Read-only getter methods
	pub fn prn(&self) -> usize { self.prn }
	pub fn signal(&self) -> SignalKind { self.signal }
	pub fn state(&self) -> ChannelState { self.state }
	pub fn status(&self) -> ChannelStatus { self.status }
	pub fn is_active(&self) -> bool { self.status == ChannelStatus::Active }
	pub fn is_measuring(&self) -> bool { self.is_active() && self.state == ChannelState::Measuring }
	pub fn carrier_freq_hz(&self) -> f64 { self.nco.carrier_freq_hz }
	pub fn code_freq_hz(&self) -> f64 { self.nco.code_freq_hz }
	pub fn carrier_phase_cycles(&self) -> f64 { self.carrier_phase_cycles }
	pub fn doppler_hz(&self) -> f64 { self.nco.carrier_freq_hz - self.intermediate_freq_hz }
	pub fn bit_ref(&self) -> Option<usize> { self.bit_sync.bit_ref() }
	pub fn ephemeris(&self) -> Option<&Ephemeris> { self.ephemeris.as_ref() }
	pub fn synchro(&self) -> &SynchroBuffer { &self.synchro }
	pub fn ms_tracked(&self) -> u64 { self.ms_tracked }
	pub fn lock_detector(&self) -> &LockDetector { &self.lock }

	/// First sample of the next integration
	pub fn next_start(&self) -> u64 { self.next_start }

	/// One past the last sample the next integration reads
	pub fn demand_end(&self) -> u64 {
		let n = self.correlator.samples_needed(&self.nco, self.next_integration_ms()).unwrap_or(1);
		self.next_start + (n as u64)
	}

	pub fn measurement_input(&self) -> Option<MeasurementInput> {
		if !self.is_measuring() { return None; }
		Some(MeasurementInput{ prn: self.prn, signal: self.signal, intermediate_freq_hz: self.intermediate_freq_hz,
			synchro: &self.synchro, ephemeris: self.ephemeris.as_ref() })
	}

	// Signals whose 20 ms bit phase this channel establishes
	fn tracks_bits(&self) -> bool { self.signal.has_lnav() || self.signal == SignalKind::GpsL2Cm }

	fn is_bit_boundary(&self, ms:u64) -> bool {
		self.bit_sync.bit_ref().map(|r| (ms % BIT_MS) as usize == r).unwrap_or(false)
	}

	// Start of a `target` ms integration slot counted from the bit edge
	fn is_on_grid(&self, ms:u64, target:u32) -> bool {
		self.bit_sync.bit_ref().map(|r| ((ms + BIT_MS - (r as u64)) % BIT_MS) % (target as u64) == 0).unwrap_or(false)
	}

	fn stage_params(&self) -> StageParams {
		let idx = if self.state == ChannelState::Stage1 { 0 } else { 1 };
		self.profile.stages[idx]
	}

	fn target_ms(&self) -> u32 {
		if self.tracks_bits() { self.profile.stages[1].integration_ms } else { 1 }
	}

	/// Integration length of the next cycle.  Anything longer than 1 ms has to start on a bit edge.
	pub fn next_integration_ms(&self) -> u32 {
		if self.state == ChannelState::Stage1 { return self.profile.stages[0].integration_ms; }
		let target = self.target_ms();
		if target > 1 && self.is_on_grid(self.ms_count, target) { target } else { 1 }
	}

	/// Runs every integration the window fully covers
	pub fn process(&mut self, window:&SampleWindow) -> Result<ChannelOutput, DigSigProcErr> {
		let band:Band = self.signal.band();
		if window.band(band).is_none() {
			return Err(DigSigProcErr::InvalidConfiguration(format!("sample window has no {:?} band", band)));
		}
		let mut out = ChannelOutput{ prn: self.prn, signal: self.signal, samples: vec![], events: vec![] };

		while self.is_active() {
			let int_ms = self.next_integration_ms();
			let n = match self.correlator.samples_needed(&self.nco, int_ms) {
				Ok(n) => n,
				Err(e) => { self.lose(LostReason::from(&e), &mut out); break; },
			};
			let samples = match window.slice(band, self.next_start, n) {
				Some(s) => s,
				None => break,
			};
			if let Err(e) = self.cycle(samples, int_ms, &mut out) {
				self.lose(LostReason::from(&e), &mut out);
				break;
			}
			if self.ephemeris_timed_out() {
				self.lose(LostReason::EphemerisTimeout, &mut out);
			}
		}
		Ok(out)
	}

	fn lose(&mut self, reason:LostReason, out:&mut ChannelOutput) {
		if !self.is_active() { return; }
		self.status = ChannelStatus::Lost(reason);
		info!("PRN {} {:?}: lost ({:?}) in {:?} after {} ms", self.prn, self.signal, reason, self.state, self.ms_tracked);
		out.events.push(ChannelEvent::Lost(reason));
	}

	fn set_state(&mut self, to:ChannelState, sample_index:u64, out:&mut ChannelOutput) {
		let from = self.state;
		if from == to { return; }
		self.state = to;
		info!("PRN {} {:?}: {:?} -> {:?} at sample {}", self.prn, self.signal, from, to, sample_index);
		out.events.push(ChannelEvent::StateChanged{ sample_index, from, to });
	}

	// Counted from BitSynced, and again from each fall back to BitSynced once an ephemeris is held
	fn ephemeris_timed_out(&self) -> bool {
		if !self.signal.has_lnav() || self.state < ChannelState::BitSynced { return false; }
		if self.ephemeris.is_some() && self.state > ChannelState::BitSynced { return false; }
		let elapsed_ms = self.ms_count.saturating_sub(self.bit_synced_ms) as f64;
		elapsed_ms >= self.config.tracking.ephemeris_timeout_s * 1000.0
	}

	// Retunes the loop when the integration length changes
	fn ensure_loop_period(&mut self, int_ms:u32) -> Result<(), DigSigProcErr> {
		if int_ms == self.loop_int_ms { return Ok(()); }
		let params = self.stage_params().loop_params(int_ms);
		self.trk_loop.retune(&params)?;
		self.loop_int_ms = int_ms;
		Ok(())
	}

	fn correlate(&self, samples:&[i8], int_ms:u32) -> Result<(Correlation, Complex<f64>, u32), DigSigProcErr> {
		if self.config.tracking.short_long_cycles && int_ms > 1 {
			// 1 ms for the lock detector, then the rest of the integration
			let short = self.correlator.integrate(samples, &self.nco, 1)?;
			let long = self.correlator.integrate(&samples[short.n_samples..], &short.next, int_ms - 1)?;
			let lock_prompt = short.prompt;
			let mut prompt_slices = short.prompt_slices;
			prompt_slices.extend_from_slice(&long.prompt_slices);
			let combined = Correlation {
				early: short.early + long.early,
				prompt: short.prompt + long.prompt,
				late: short.late + long.late,
				prompt_slices,
				n_samples: short.n_samples + long.n_samples,
				carrier_cycles: short.carrier_cycles + long.carrier_cycles,
				next: long.next,
			};
			Ok((combined, lock_prompt, 1))
		} else {
			let corr = self.correlator.integrate(samples, &self.nco, int_ms)?;
			let p = corr.prompt;
			Ok((corr, p, int_ms))
		}
	}

	fn cycle(&mut self, samples:&[i8], int_ms:u32, out:&mut ChannelOutput) -> Result<(), DigSigProcErr> {
		let start_sample = self.next_start;
		let start_ms = self.ms_count;
		let start_code_phase = self.nco.code_phase_chips;

		if self.state == ChannelState::Stage2 && self.tracks_bits() && int_ms == self.target_ms() && self.is_bit_boundary(start_ms) {
			self.enter_bit_synced(start_sample, start_ms, out);
		}

		self.ensure_loop_period(int_ms)?;
		let (corr, lock_prompt, lock_ms) = self.correlate(samples, int_ms)?;

		self.lock.update(lock_prompt, (lock_ms as f64) * 1.0e-3);
		if self.lock.lost() { return Err(DigSigProcErr::LossOfLock); }

		let alias_hz:f64 = self.run_alias_detector(&corr.prompt_slices);
		let (mut code_freq, mut carr_freq) = if alias_hz != 0.0 {
			info!("PRN {} {:?}: carrier alias of {} Hz removed", self.prn, self.signal, alias_hz);
			self.trk_loop.adjust_carrier(-alias_hz);
			(self.trk_loop.code_freq(), self.trk_loop.carr_freq())
		} else {
			self.trk_loop.update(corr.early, corr.prompt, corr.late)
		};
		if self.config.tracking.pipelining {
			let k = self.config.tracking.pipelining_k;
			carr_freq = self.nco.carrier_freq_hz + k * (carr_freq - self.nco.carrier_freq_hz);
			code_freq = self.nco.code_freq_hz + k * (code_freq - self.nco.code_freq_hz);
		}
		if !(code_freq.is_finite() && carr_freq.is_finite()) || code_freq <= 0.0 {
			return Err(DigSigProcErr::NumericalFault("loop filter produced an invalid NCO rate"));
		}

		let cn0_dbhz = self.lock.cn0_dbhz(1000.0 / (lock_ms as f64));
		out.samples.push(TrackingSample {
			prn: self.prn, signal: self.signal, absolute_sample: start_sample, ms_tracked: self.ms_tracked,
			code_phase: start_code_phase, carrier_freq: self.nco.carrier_freq_hz, code_freq: self.nco.code_freq_hz,
			i_p: corr.prompt.re, q_p: corr.prompt.im,
			lock_detect_outo: self.lock.outo(), lock_detect_outp: self.lock.outp(), cn0_dbhz,
		});

		self.nco = NcoState{ carrier_freq_hz: carr_freq, code_freq_hz: code_freq, ..corr.next };
		self.carrier_phase_cycles += corr.carrier_cycles;
		self.next_start = start_sample + (corr.n_samples as u64);
		self.ms_count = start_ms + (int_ms as u64);
		self.ms_tracked += int_ms as u64;
		self.stage_ms += int_ms as u64;

		for (j, slice) in corr.prompt_slices.iter().enumerate() {
			self.handle_ms(start_ms + (j as u64), slice.re, out);
		}

		self.record_snapshot(cn0_dbhz);

		if self.state == ChannelState::Stage1 && self.stage_ms >= self.config.tracking.stabilization_time_ms && self.lock.outp() {
			self.enter_stage2(out)?;
		}
		Ok(())
	}

	// Detected alias in Hz, or zero
	fn run_alias_detector(&mut self, slices:&[Complex<f64>]) -> f64 {
		if self.state < ChannelState::Stage2 || slices.len() < 4 { return 0.0; }
		let mut detected:f64 = 0.0;
		for group in slices.chunks_exact(4) {
			for (a, b) in [(group[0], group[2]), (group[1], group[3])].iter() {
				self.alias.first(*a);
				if let Some(err) = self.alias.second(*b) {
					let snapped = alias_detector::snap_alias(err);
					debug!("PRN {} {:?}: alias detector {:.2} Hz -> {} Hz", self.prn, self.signal, err, snapped);
					if snapped != 0.0 { detected = snapped; }
				}
			}
		}
		detected
	}

	fn enter_stage2(&mut self, out:&mut ChannelOutput) -> Result<(), DigSigProcErr> {
		let from_sample = self.next_start;
		self.set_state(ChannelState::Stage2, from_sample, out);
		self.stage_ms = 0;
		let stage = self.profile.stages[1];
		let int_ms = self.next_integration_ms();
		let aiding = Self::aiding_for(self.prn, self.signal, self.intermediate_freq_hz);
		self.trk_loop = filters::make_loop(stage.loop_order, &stage.loop_params(int_ms), aiding, self.nco.code_freq_hz, self.nco.carrier_freq_hz)?;
		self.loop_int_ms = int_ms;
		self.lock.set_params(stage.lock.params());
		self.alias.reset();
		Ok(())
	}

	fn enter_bit_synced(&mut self, sample_index:u64, ms:u64, out:&mut ChannelOutput) {
		self.set_state(ChannelState::BitSynced, sample_index, out);
		self.first_bit_ms = ms;
		self.bit_synced_ms = ms;
		self.bit_acc = 0.0;
		self.bit_ms = 0;

		let wants_handover = self.signal == SignalKind::GpsL1Ca && self.config.tracking.l2c_handover && !self.handover_sent;
		if let (true, Some(l2)) = (wants_handover, self.config.band(Band::GpsL2)) {
			let cpm = self.signal.chips_per_ms();
			let doppler_l1 = self.doppler_hz();
			let seed = Handover {
				prn: self.prn,
				signal: SignalKind::GpsL2Cm,
				sample_index,
				code_phase_chips: self.nco.code_phase_chips.rem_euclid(cpm),
				carrier_freq_hz: l2.intermediate_freq_hz + doppler_l1 * gps::L2_FREQ_HZ / gps::L1_FREQ_HZ,
			};
			info!("PRN {}: handing over to L2 CM at sample {}", self.prn, sample_index);
			self.handover_sent = true;
			out.events.push(ChannelEvent::Handover(seed));
		}
	}

	fn handle_ms(&mut self, ms:u64, prompt_i:f64, out:&mut ChannelOutput) {
		if self.signal.has_lnav() && self.bit_sync.bit_ref().is_none() {
			if let Some(r) = self.bit_sync.update(ms, prompt_i, self.lock.outo()) {
				info!("PRN {} {:?}: bit edge found at ms phase {}", self.prn, self.signal, r);
			}
		}

		if self.state >= ChannelState::BitSynced && self.signal.has_lnav() {
			self.bit_acc += prompt_i;
			self.bit_ms += 1;
			if self.bit_ms == BIT_MS {
				let bit = self.bit_acc > 0.0;
				self.bit_acc = 0.0;
				self.bit_ms = 0;
				self.handle_bit(bit, out);
			}
		}
	}

	fn handle_bit(&mut self, bit:bool, out:&mut ChannelOutput) {
		let sample_index = self.next_start;
		match self.subframe_sync.push(bit) {
			Some(SyncEvent::Synced{ start_bit, tow_s, .. }) => {
				self.anchor = Some(TowAnchor{ ms: self.first_bit_ms + start_bit * BIT_MS, tow_s });
				self.set_state(ChannelState::SubframeSynced, sample_index, out);
			},
			Some(SyncEvent::Subframe{ start_bit, data }) => {
				match self.subframes.insert(&data) {
					Ok(sf) => {
						self.anchor = Some(TowAnchor{ ms: self.first_bit_ms + start_bit * BIT_MS, tow_s: sf.start_time_of_week() });
						out.events.push(ChannelEvent::Subframe(sf));
						if let Some(eph) = self.subframes.ephemeris() {
							if self.ephemeris.map(|e| e.iode != eph.iode).unwrap_or(true) {
								info!("PRN {}: ephemeris IODE={} week={} complete", self.prn, eph.iode, eph.week_number);
							}
							self.ephemeris = Some(eph);
						}
					},
					Err(e) => warn!("PRN {}: undecodable subframe at bit {}: {}", self.prn, start_bit, e),
				}
			},
			Some(SyncEvent::ParityFailure{ .. }) => {
				self.anchor = None;
				self.synchro.clear();
				out.events.push(ChannelEvent::ParityFailure);
				if self.state > ChannelState::BitSynced {
					if self.ephemeris.is_some() { self.bit_synced_ms = self.ms_count; }
					self.set_state(ChannelState::BitSynced, sample_index, out);
				}
			},
			None => {},
		}

		if self.state == ChannelState::SubframeSynced && self.ephemeris.is_some() {
			self.set_state(ChannelState::Measuring, sample_index, out);
		}
	}

	/// Transmit time of the first sample of the next integration, once the subframe timing is known
	pub fn transmit_time(&self) -> Option<f64> {
		let anchor = self.anchor?;
		let cpm = self.signal.chips_per_ms();
		let elapsed_ms = (self.ms_count as f64) - (anchor.ms as f64);
		Some(anchor.tow_s + elapsed_ms * 1.0e-3 + self.nco.code_phase_chips.rem_euclid(cpm) / self.signal.chip_rate_hz())
	}

	fn record_snapshot(&mut self, cn0_dbhz:f64) {
		if let Some(transmit_time_s) = self.transmit_time() {
			self.synchro.push(Snapshot {
				sample_index: self.next_start,
				transmit_time_s,
				carrier_freq_hz: self.nco.carrier_freq_hz,
				code_freq_hz: self.nco.code_freq_hz,
				carrier_phase_cycles: self.carrier_phase_cycles,
				locked: self.lock.outo(),
				cn0_dbhz,
			});
		}
	}

}

#[cfg(test)]
impl TrackingChannel {

	// Skips straight to Measuring with the subframe timing anchored at the next integration
	pub(crate) fn force_measuring(&mut self, tow_s:f64, ephemeris:Option<Ephemeris>) {
		self.anchor = Some(TowAnchor{ ms: self.ms_count, tow_s });
		self.first_bit_ms = self.ms_count;
		self.ephemeris = ephemeris;
		self.state = ChannelState::Measuring;
	}

}
