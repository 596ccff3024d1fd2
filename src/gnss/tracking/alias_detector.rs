
use std::f64::consts;

use num_complex::Complex;

/// Estimates the residual carrier frequency from pairs of short prompt slices taken a fixed time
/// apart.  A Costas loop running long coherent integrations can settle on an alias of the true
/// carrier, which shows up here as an offset near an odd multiple of 25 Hz.
#[derive(Debug, Clone)]
pub struct AliasDetector {
	acc_len:usize,
	time_diff:f64,
	first:Complex<f64>,
	dot:f64,
	cross:f64,
	count:usize,
}

impl AliasDetector {

	pub fn new(acc_len:usize, time_diff:f64) -> Self {
		Self{ acc_len: acc_len.max(1), time_diff, first: Complex{ re: 0.0, im: 0.0 }, dot: 0.0, cross: 0.0, count: 0 }
	}

	/// Accumulation length for a detection every `interval_ms` with one pair per `2 * slice_ms`
	pub fn acc_len_for(interval_ms:u64, slice_ms:u64) -> usize {
		((interval_ms / (2 * slice_ms.max(1))) as usize).max(1)
	}

	pub fn reset(&mut self) {
		self.dot = 0.0;
		self.cross = 0.0;
		self.count = 0;
	}

	pub fn first(&mut self, slice:Complex<f64>) { self.first = slice; }

	/// Feeds the slice taken `time_diff` after the last `first`.  Once `acc_len` pairs are
	/// accumulated, returns the frequency by which the NCO exceeds the signal, in Hz.
	pub fn second(&mut self, slice:Complex<f64>) -> Option<f64> {
		let n = self.acc_len as f64;
		self.dot   += (slice.re * self.first.re + slice.im * self.first.im) / n;
		self.cross += (slice.re * self.first.im - self.first.re * slice.im) / n;
		self.count += 1;
		if self.count < self.acc_len { return None; }

		let err:f64 = self.cross.atan2(self.dot) / (2.0 * consts::PI * self.time_diff);
		self.reset();
		Some(err)
	}

}

/// Rounds a frequency error to the nearest alias a half-cycle-per-bit Costas ambiguity can produce:
/// 0, or plus or minus 25 + 50n Hz
pub fn snap_alias(err:f64) -> f64 {
	let mag:f64 = err.abs();
	let sign:f64 = err.signum();
	if mag > 25.0 {
		let mut snapped:f64 = 25.0 + 50.0 * ((mag - 25.0) / 50.0).floor();
		if mag - snapped > 25.0 { snapped += 50.0; }
		sign * snapped
	} else if mag > 12.5 {
		sign * 25.0
	} else {
		0.0
	}
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn snaps_to_alias_grid() {
		let inputs   = [-75.0, -80.0, -25.0, 0.0, 25.0, 65.0];
		let expected = [-75.0, -75.0, -25.0, 0.0, 25.0, 75.0];
		for (x, y) in inputs.iter().zip(expected.iter()) {
			assert_eq!(snap_alias(*x), *y, "snap({})", x);
		}
		assert_eq!(snap_alias(12.0), 0.0);
		assert_eq!(snap_alias(-13.0), -25.0);
	}

	#[test]
	fn snap_is_monotone_in_magnitude() {
		let mut last:f64 = 0.0;
		for k in 0..4000 {
			let x = (k as f64) * 0.1;
			let y = snap_alias(x);
			assert!(y >= last, "snap({}) = {} < {}", x, y, last);
			assert_eq!(snap_alias(-x), -y);
			last = y;
		}
	}

	#[test]
	fn measures_nco_excess() {
		// NCO 25 Hz above the signal: each prompt rotates backwards by 2 pi 25 Hz per second
		let dt = 2.0e-3;
		let offset = 25.0;
		let mut ad = AliasDetector::new(AliasDetector::acc_len_for(500, 1), dt);
		let mut result = None;
		for k in 0..250 {
			let t0 = (k as f64) * 4.0e-3;
			let phase = |t:f64| -2.0 * consts::PI * offset * t + 0.4;
			ad.first(Complex::from_polar(100.0, phase(t0)));
			result = ad.second(Complex::from_polar(100.0, phase(t0 + dt)));
			if k < 249 { assert!(result.is_none()); }
		}
		let err = result.unwrap();
		assert!((err - offset).abs() < 1.0e-6);
		assert_eq!(snap_alias(err), 25.0);
	}

}
