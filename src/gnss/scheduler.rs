
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::config::Configuration;
use crate::gnss::acquisition::{AcquisitionEngine, AcquisitionResult};
use crate::gnss::measurement::{MeasurementBuilder, MeasurementInput};
use crate::gnss::signal::SignalKind;
use crate::gnss::tracking::{ChannelEvent, ChannelOutput, ChannelState, ChannelStatus, TrackingChannel};
use crate::io::SampleProvider;
use crate::io::records::{Record, ResultSink};

#[derive(Debug)]
pub enum StopReason {
	EndOfStream,
	Stopped,
	SampleLimit,
	ProviderFailed(DigSigProcErr),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummary {
	pub prn:usize,
	pub signal:SignalKind,
	pub state:ChannelState,
	pub status:ChannelStatus,
	pub ms_tracked:u64,
	pub doppler_hz:f64,
}

#[derive(Debug)]
pub struct RunSummary {
	pub stop_reason:StopReason,
	pub samples_processed:u64,
	pub epochs:usize,
	pub channels:Vec<ChannelSummary>,
}

/// Pulls sample windows from one provider and drives every tracking channel over them.
///
/// Each step reads the window from the earliest sample any active channel still needs up to whatever
/// the hungriest channel needs (at least one batch past the cursor), runs the channels in parallel,
/// then forwards their output to the sink.
pub struct Scheduler<P: SampleProvider> {
	config:Arc<Configuration>,
	provider:P,
	channels:Vec<TrackingChannel>,
	cursor:u64,
	batch_len:u64,
	sample_limit:Option<u64>,
	stop:Arc<AtomicBool>,
	builder:MeasurementBuilder,
	epoch_interval:u64,
	next_epoch:u64,
	epochs:usize,
}

impl<P: SampleProvider> Scheduler<P> {

	pub fn new(config:Arc<Configuration>, provider:P) -> Result<Self, DigSigProcErr> {
		config.validate()?;

		let fs = provider.sampling_freq_hz();
		if (fs - config.sampling_freq_hz).abs() > 1.0e-9 * config.sampling_freq_hz {
			return Err(DigSigProcErr::InvalidConfiguration(format!("provider runs at {} sps, configuration expects {} sps", fs, config.sampling_freq_hz)));
		}
		let provided = provider.bands();
		for b in config.bands.iter() {
			let matched = provided.iter().any(|p| p.band == b.band && (p.intermediate_freq_hz - b.intermediate_freq_hz).abs() < 1.0e-6);
			if !matched {
				return Err(DigSigProcErr::InvalidConfiguration(format!("provider has no {:?} band at IF {} Hz", b.band, b.intermediate_freq_hz)));
			}
		}

		let batch_len = ((config.scheduler.batch_ms as f64) * config.samples_per_ms()).ceil().max(1.0) as u64;
		let epoch_interval = ((config.scheduler.measurement_interval_ms as f64) * config.samples_per_ms()).round().max(1.0) as u64;

		Ok(Self {
			builder: MeasurementBuilder::new(config.sampling_freq_hz),
			config, provider,
			channels: vec![],
			cursor: 0,
			batch_len,
			sample_limit: None,
			stop: Arc::new(AtomicBool::new(false)),
			epoch_interval,
			next_epoch: 0,
			epochs: 0,
		})
	}

	/// Setting the flag stops the run once the current step finishes
	pub fn stop_handle(&self) -> Arc<AtomicBool> { self.stop.clone() }

	pub fn channels(&self) -> &[TrackingChannel] { &self.channels }

	/// Searches the targets over one acquisition window at the cursor.  Only acquired satellites are
	/// returned, by descending SNR.
	pub fn acquire(&mut self, targets:&[(usize, SignalKind)]) -> Result<Vec<AcquisitionResult>, DigSigProcErr> {
		let engine = AcquisitionEngine::new(&self.config);
		let window = self.provider.read(self.cursor, engine.window_len())?;
		let results = engine.acquire_all(&window, targets)?;
		for r in results.iter() {
			info!("PRN {} {:?}: acquired at {:.1} Hz, code phase {:.2} chips, SNR {:.1}", r.prn, r.signal, r.carrier_freq_hz, r.code_phase_chips, r.snr);
		}
		info!("{} of {} targets acquired", results.len(), targets.len());
		Ok(results)
	}

	/// Starts one channel per acquired result not already being tracked.  Returns how many started.
	pub fn start_channels(&mut self, results:&[AcquisitionResult]) -> Result<usize, DigSigProcErr> {
		let mut started:usize = 0;
		for r in results.iter().filter(|r| r.is_acquired()) {
			if self.is_tracking(r.prn, r.signal) {
				debug!("PRN {} {:?} is already tracked", r.prn, r.signal);
				continue;
			}
			self.channels.push(TrackingChannel::new(r, self.config.clone())?);
			started += 1;
		}
		Ok(started)
	}

	fn is_tracking(&self, prn:usize, signal:SignalKind) -> bool {
		self.channels.iter().any(|c| c.is_active() && c.prn() == prn && c.signal() == signal)
	}

	/// Reads one window and runs every channel over it.  `Some` when the run should end.
	pub fn step(&mut self, sink:&mut dyn ResultSink) -> Result<Option<StopReason>, DigSigProcErr> {
		if self.stop.load(Ordering::SeqCst) { return Ok(Some(StopReason::Stopped)); }
		if let Some(limit) = self.sample_limit {
			if self.cursor >= limit { return Ok(Some(StopReason::SampleLimit)); }
		}

		let active = self.channels.iter().filter(|c| c.is_active());
		let start:u64 = active.clone().map(|c| c.next_start()).min().unwrap_or(self.cursor);
		let demand:u64 = active.map(|c| c.demand_end()).max().unwrap_or(0);
		let mut end:u64 = demand.max(self.cursor + self.batch_len);
		if let Some(limit) = self.sample_limit { end = end.min(limit).max(start + 1); }

		let window = match self.provider.read(start, (end - start) as usize) {
			Ok(w) => w,
			Err(DigSigProcErr::EndOfStream) => return Ok(Some(StopReason::EndOfStream)),
			Err(e) => {
				warn!("Sample provider failed at sample {}: {}", start, e);
				return Ok(Some(StopReason::ProviderFailed(e)));
			},
		};
		let short_read:bool = window.end_sample_index() < end;

		let outputs:Vec<ChannelOutput> = self.channels.par_iter_mut()
			.filter(|c| c.is_active())
			.map(|c| c.process(&window))
			.collect::<Result<Vec<ChannelOutput>, DigSigProcErr>>()?;

		self.cursor = self.cursor.max(window.end_sample_index());
		for out in outputs.into_iter() { self.apply(out, sink)?; }
		self.emit_epochs(sink)?;

		if short_read { return Ok(Some(StopReason::EndOfStream)); }
		Ok(None)
	}

	fn apply(&mut self, out:ChannelOutput, sink:&mut dyn ResultSink) -> Result<(), DigSigProcErr> {
		for event in out.events.iter() {
			match event {
				ChannelEvent::Handover(h) => {
					if self.config.band(h.signal.band()).is_none() || self.is_tracking(h.prn, h.signal) { continue; }
					match TrackingChannel::new(&h.as_acquisition(), self.config.clone()) {
						Ok(ch) => {
							info!("PRN {} {:?}: channel started from handover at sample {}", h.prn, h.signal, h.sample_index);
							self.channels.push(ch);
						},
						Err(e) => warn!("PRN {} {:?}: handover rejected: {}", h.prn, h.signal, e),
					}
				},
				ChannelEvent::Lost(reason) => warn!("PRN {} {:?}: channel lost ({:?})", out.prn, out.signal, reason),
				ChannelEvent::Subframe(sf) => debug!("PRN {} {:?}: subframe {} TOW count {}", out.prn, out.signal, sf.subframe_id, sf.tow_count),
				ChannelEvent::ParityFailure => debug!("PRN {} {:?}: parity failure", out.prn, out.signal),
				ChannelEvent::StateChanged{ .. } => {},
			}
		}
		for s in out.samples.into_iter() { sink.record(Record::Tracking(s))?; }
		Ok(())
	}

	// Builds every epoch that all Measuring channels have tracked past
	fn emit_epochs(&mut self, sink:&mut dyn ResultSink) -> Result<(), DigSigProcErr> {
		let measuring:Vec<&TrackingChannel> = self.channels.iter().filter(|c| c.is_measuring()).collect();
		if measuring.is_empty() {
			let earliest = self.channels.iter().filter(|c| c.is_active()).map(|c| c.next_start()).min().unwrap_or(self.cursor);
			self.next_epoch = self.next_epoch.max(round_up(earliest, self.epoch_interval));
			return Ok(());
		}

		let reached:u64 = measuring.iter().map(|c| c.synchro().latest().map(|s| s.sample_index).unwrap_or(0)).min().unwrap_or(0);
		while self.next_epoch <= reached {
			let inputs:Vec<MeasurementInput> = measuring.iter().filter_map(|c| c.measurement_input()).collect();
			let epoch = self.builder.build(self.next_epoch, &inputs);
			if !epoch.measurements.is_empty() {
				debug!("Epoch at sample {}: {} measurements", epoch.sample_index, epoch.measurements.len());
				sink.measurement_epoch(&epoch)?;
				self.epochs += 1;
			}
			self.next_epoch += self.epoch_interval;
		}
		Ok(())
	}

	/// Steps until the stream ends, the stop flag is set, or `max_samples` have been read
	pub fn run(&mut self, sink:&mut dyn ResultSink, max_samples:Option<u64>) -> Result<RunSummary, DigSigProcErr> {
		self.sample_limit = max_samples;
		let stop_reason = loop {
			if let Some(reason) = self.step(sink)? { break reason; }
		};
		sink.flush()?;
		info!("Run ended ({:?}) after {} samples, {} epochs", stop_reason, self.cursor, self.epochs);
		Ok(self.summary(stop_reason))
	}

	pub fn summary(&self, stop_reason:StopReason) -> RunSummary {
		let channels = self.channels.iter().map(|c| ChannelSummary {
			prn: c.prn(), signal: c.signal(), state: c.state(), status: c.status(), ms_tracked: c.ms_tracked(), doppler_hz: c.doppler_hz(),
		}).collect();
		RunSummary{ stop_reason, samples_processed: self.cursor, epochs: self.epochs, channels }
	}

}

fn round_up(x:u64, step:u64) -> u64 { ((x + step - 1) / step) * step }

/// Acquires once at the start of the capture, then tracks every acquired satellite to the end
pub fn run_single_capture<P: SampleProvider>(config:Arc<Configuration>, provider:P, targets:&[(usize, SignalKind)],
	sink:&mut dyn ResultSink, max_samples:Option<u64>) -> Result<RunSummary, DigSigProcErr> {

	let mut scheduler = Scheduler::new(config, provider)?;
	let acquired = scheduler.acquire(targets)?;
	if acquired.is_empty() { return Err(DigSigProcErr::NoSatellitesAcquired); }
	for r in acquired.iter() { sink.record(Record::Acquisition(r.clone()))?; }
	scheduler.start_channels(&acquired)?;
	scheduler.run(sink, max_samples)
}
