
use std::f64::consts;

use num_complex::Complex;

use crate::DigSigProcErr;
use crate::gnss::code::{self, replica_chip};
use crate::gnss::signal::SignalKind;

/// Early and late replicas sit this many chips either side of prompt
pub const EARLY_LATE_SPACING:f64 = 0.5;

const ZERO:Complex<f64> = Complex{ re: 0.0, im: 0.0 };

/// NCO state carried from one integration to the next.  The carrier phase is in cycles and the
/// code phase in replica chips, in [0, replica_length).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NcoState {
	pub carrier_freq_hz:f64,
	pub code_freq_hz:f64,
	pub carrier_phase_cycles:f64,
	pub code_phase_chips:f64,
}

#[derive(Debug, Clone)]
pub struct Correlation {
	pub early:Complex<f64>,
	pub prompt:Complex<f64>,
	pub late:Complex<f64>,
	/// Prompt sums over each code millisecond of the integration
	pub prompt_slices:Vec<Complex<f64>>,
	pub n_samples:usize,
	/// Carrier cycles the NCO advanced over the integration
	pub carrier_cycles:f64,
	pub next:NcoState,
}

/// Correlates real samples of one band against the replica of one satellite
#[derive(Debug, Clone)]
pub struct Correlator {
	pub signal:SignalKind,
	pub fs:f64,
	code:&'static [i8],
}

impl Correlator {

	pub fn new(prn:usize, signal:SignalKind, fs:f64) -> Result<Self, DigSigProcErr> {
		Ok(Self{ signal, fs, code: code::get_code(prn, signal)? })
	}

	fn code_step(&self, nco:&NcoState) -> f64 { nco.code_freq_hz / self.fs }

	// Replica phase at the end of an `int_ms` integration started at `code_phase`; always a whole
	// number of code milliseconds
	fn end_boundary(&self, code_phase:f64, int_ms:u32) -> f64 {
		let cpm:f64 = self.signal.chips_per_ms();
		((code_phase / cpm).floor() + (int_ms as f64)) * cpm
	}

	/// Number of samples the next `int_ms` integration consumes at the present NCO rates
	pub fn samples_needed(&self, nco:&NcoState, int_ms:u32) -> Result<usize, DigSigProcErr> {
		let step:f64 = self.code_step(nco);
		if !(step > 0.0) || !step.is_finite() { return Err(DigSigProcErr::NumericalFault("code NCO rate is not positive")); }
		let span:f64 = self.end_boundary(nco.code_phase_chips, int_ms) - nco.code_phase_chips;
		Ok((span / step).ceil().max(1.0) as usize)
	}

	/// Integrates `samples`, which must hold at least `samples_needed` values, and returns the
	/// correlations together with the NCO state for the next integration
	pub fn integrate(&self, samples:&[i8], nco:&NcoState, int_ms:u32) -> Result<Correlation, DigSigProcErr> {
		let n:usize = self.samples_needed(nco, int_ms)?;
		if samples.len() < n { return Err(DigSigProcErr::EndOfStream); }

		let cpm:f64 = self.signal.chips_per_ms();
		let step:f64 = self.code_step(nco);
		let carrier_step:f64 = nco.carrier_freq_hz / self.fs;
		let p0:f64 = nco.code_phase_chips;

		let mut carrier:Complex<f64> = Complex::from_polar(1.0, -2.0 * consts::PI * nco.carrier_phase_cycles);
		let carrier_inc:Complex<f64> = Complex::from_polar(1.0, -2.0 * consts::PI * carrier_step);

		let (mut early, mut prompt, mut late) = (ZERO, ZERO, ZERO);
		let mut slice:Complex<f64> = ZERO;
		let mut prompt_slices:Vec<Complex<f64>> = Vec::with_capacity(int_ms as usize);
		let mut next_slice_boundary:f64 = ((p0 / cpm).floor() + 1.0) * cpm;

		for (idx, s) in samples[..n].iter().enumerate() {
			let p:f64 = p0 + (idx as f64) * step;
			if p >= next_slice_boundary {
				prompt_slices.push(slice);
				slice = ZERO;
				next_slice_boundary += cpm;
				// Keep the rotating phasor on the unit circle
				carrier = carrier / carrier.norm();
			}

			let x:Complex<f64> = carrier * (*s as f64);
			carrier = carrier * carrier_inc;

			let e = replica_chip(self.code, self.signal, p + EARLY_LATE_SPACING) as f64;
			let c = replica_chip(self.code, self.signal, p) as f64;
			let l = replica_chip(self.code, self.signal, p - EARLY_LATE_SPACING) as f64;
			early  += x * e;
			prompt += x * c;
			late   += x * l;
			slice  += x * c;
		}
		prompt_slices.push(slice);

		for v in [early, prompt, late].iter() {
			if !(v.re.is_finite() && v.im.is_finite()) { return Err(DigSigProcErr::NumericalFault("non-finite correlator output")); }
		}

		// Restart exactly on the code millisecond boundary plus the overshoot of the last step
		let boundary:f64 = self.end_boundary(p0, int_ms);
		let overshoot:f64 = (p0 + (n as f64) * step - boundary).max(0.0);
		let replica_len:f64 = self.signal.replica_length() as f64;
		let code_phase_chips:f64 = (boundary % replica_len + overshoot) % replica_len;

		let carrier_cycles:f64 = (n as f64) * carrier_step;
		let carrier_phase:f64 = nco.carrier_phase_cycles + carrier_cycles;
		let next = NcoState{ carrier_freq_hz: nco.carrier_freq_hz, code_freq_hz: nco.code_freq_hz,
			carrier_phase_cycles: carrier_phase - carrier_phase.floor(), code_phase_chips };

		Ok(Correlation{ early, prompt, late, prompt_slices, n_samples: n, carrier_cycles, next })
	}

}

#[cfg(test)]
mod tests {

	use super::*;
	use crate::test_signals::{FS, IF, SignalSpec, synthesize};

	fn nco(carrier:f64, code_phase:f64) -> NcoState {
		NcoState{ carrier_freq_hz: carrier, code_freq_hz: 1.023e6, carrier_phase_cycles: 0.0, code_phase_chips: code_phase }
	}

	#[test]
	fn integration_ends_on_code_boundary() {
		let corr = Correlator::new(7, SignalKind::GpsL1Ca, FS).unwrap();
		let state = nco(IF, 0.3);
		let n = corr.samples_needed(&state, 5).unwrap();
		// Five code periods at 2484.375 samples per period
		assert!((n as f64 - (5.0 * 1023.0 - 0.3) / (1.023e6 / FS)).abs() < 1.0);

		let samples = vec![1i8; n + 10];
		let out = corr.integrate(&samples, &state, 5).unwrap();
		assert_eq!(out.n_samples, n);
		assert_eq!(out.prompt_slices.len(), 5);
		assert!(out.next.code_phase_chips >= 0.0 && out.next.code_phase_chips < 1.023e6 / FS + 1.0e-9);
		assert!(out.next.carrier_phase_cycles >= 0.0 && out.next.carrier_phase_cycles < 1.0);
	}

	#[test]
	fn aligned_replica_puts_energy_in_prompt() {
		let spec = SignalSpec{ prn: 12, doppler_hz: 0.0, code_phase_chips: 0.0, ..SignalSpec::default() };
		let samples = synthesize(&[spec], FS, IF, 30000, 16.0, 3);
		let corr = Correlator::new(12, SignalKind::GpsL1Ca, FS).unwrap();
		let out = corr.integrate(&samples, &nco(IF, 0.0), 10).unwrap();

		let p = out.prompt.norm();
		assert!(p > 1.5 * out.early.norm());
		assert!(p > 1.5 * out.late.norm());
		assert!((out.early.norm() - out.late.norm()).abs() < 0.25 * p);
		let slice_sum:Complex<f64> = out.prompt_slices.iter().sum();
		assert!((slice_sum - out.prompt).norm() < 1.0e-6 * p);
	}

	#[test]
	fn replica_lagging_favours_early() {
		// Signal 0.25 chip ahead of the replica
		let spec = SignalSpec{ prn: 12, doppler_hz: 0.0, code_phase_chips: 0.25, ..SignalSpec::default() };
		let samples = synthesize(&[spec], FS, IF, 30000, 0.0, 3);
		let corr = Correlator::new(12, SignalKind::GpsL1Ca, FS).unwrap();
		let out = corr.integrate(&samples, &nco(IF, 0.0), 4).unwrap();
		assert!(out.early.norm() > out.late.norm());
	}

	#[test]
	fn l2_cm_phase_wraps_on_its_replica_length() {
		let corr = Correlator::new(3, SignalKind::GpsL2Cm, FS).unwrap();
		let state = nco(IF, 19.0 * 1023.0 + 0.1);
		let n = corr.samples_needed(&state, 1).unwrap();
		let out = corr.integrate(&vec![0i8; n], &state, 1).unwrap();
		assert!(out.next.code_phase_chips < 1.0);
		assert_eq!(out.prompt.norm(), 0.0);
	}

	#[test]
	fn short_window_is_rejected() {
		let corr = Correlator::new(1, SignalKind::GpsL1Ca, FS).unwrap();
		assert!(matches!(corr.integrate(&[0i8; 100], &nco(IF, 0.0), 1), Err(DigSigProcErr::EndOfStream)));
	}

}
