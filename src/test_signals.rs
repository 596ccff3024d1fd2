
// Synthetic real IF sample streams for unit tests

use std::f64::consts;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::gnss::code;
use crate::gnss::signal::SignalKind;

pub const FS:f64 = 2.484375e6;
pub const IF:f64 = FS / 4.0;

#[derive(Debug, Clone)]
pub struct SignalSpec {
	pub prn:usize,
	pub signal:SignalKind,
	pub doppler_hz:f64,
	/// Transmitted replica chip count at the first sample.  Values past one code period set the
	/// position within the current nav bit.
	pub code_phase_chips:f64,
	pub carrier_phase_cycles:f64,
	pub amplitude:f64,
	/// Nav bits, repeated cyclically; empty for an unmodulated signal
	pub nav_bits:Vec<bool>,
}

impl Default for SignalSpec {
	fn default() -> Self {
		Self{ prn: 1, signal: SignalKind::GpsL1Ca, doppler_hz: 0.0, code_phase_chips: 0.0, carrier_phase_cycles: 0.0,
			amplitude: 8.0, nav_bits: vec![] }
	}
}

/// Sum of the given signals at `if_hz` plus white Gaussian noise, quantized to int8
pub fn synthesize(specs:&[SignalSpec], fs:f64, if_hz:f64, n_samples:usize, noise_sigma:f64, seed:u64) -> Vec<i8> {
	let mut acc:Vec<f64> = vec![0.0; n_samples];
	for spec in specs {
		let table = code::get_code(spec.prn, spec.signal).unwrap();
		let replica_len = spec.signal.replica_length() as f64;
		let bit_len_chips = 20.0 * spec.signal.chips_per_ms();
		let carrier_hz = if_hz + spec.signal.slot_offset_hz(spec.prn) + spec.doppler_hz;
		let chip_rate = spec.signal.chip_rate_hz() * (1.0 + spec.doppler_hz / spec.signal.carrier_freq_hz(spec.prn));

		for (n, a) in acc.iter_mut().enumerate() {
			let t = (n as f64) / fs;
			let chips = spec.code_phase_chips + chip_rate * t;
			let chip = code::replica_chip(table, spec.signal, chips % replica_len) as f64;
			let bit = if spec.nav_bits.is_empty() { 1.0 } else {
				let idx = ((chips / bit_len_chips).floor() as usize) % spec.nav_bits.len();
				if spec.nav_bits[idx] { 1.0 } else { -1.0 }
			};
			let phase = 2.0 * consts::PI * (carrier_hz * t + spec.carrier_phase_cycles);
			*a += spec.amplitude * bit * chip * phase.cos();
		}
	}

	let mut rng = StdRng::seed_from_u64(seed);
	let noise = if noise_sigma > 0.0 { Some(Normal::new(0.0, noise_sigma).unwrap()) } else { None };
	acc.iter().map(|x| {
		let v = x + noise.as_ref().map(|d| d.sample(&mut rng)).unwrap_or(0.0);
		v.round().max(-128.0).min(127.0) as i8
	}).collect()
}
