
use num_complex::Complex;
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockPreset {
	Pessimistic,
	Normal,
	Optimistic,
}

/// Low-pass gain `k1`, I/Q ratio `k2`, and the count thresholds for raising the pessimistic flag
/// (`lp`) and dropping the optimistic one (`lo`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockParams {
	pub k1:f64,
	pub k2:f64,
	pub lp:u32,
	pub lo:u32,
}

impl LockPreset {

	pub fn params(&self) -> LockParams {
		match self {
			LockPreset::Pessimistic => LockParams{ k1: 0.0247, k2: 1.5, lp: 50,  lo: 240 },
			LockPreset::Normal      => LockParams{ k1: 0.05,   k2: 1.4, lp: 150, lo: 50  },
			LockPreset::Optimistic  => LockParams{ k1: 0.1,    k2: 1.0, lp: 50,  lo: 50  },
		}
	}

}

/// PLL lock detector driven by the prompt correlator.  `outp` rises only after a sustained run of
/// locked updates and falls at the first miss; `outo` rises at the first locked update and
/// falls after more than `lo` consecutive misses.
#[derive(Debug, Clone)]
pub struct LockDetector {
	params:LockParams,
	lpfi:f64,
	lpfq:f64,
	pcount1:u32,
	pcount2:u32,
	outo:bool,
	outp:bool,
}

impl LockDetector {

	pub fn new(params:LockParams) -> Self {
		Self{ params, lpfi: 0.0, lpfq: 0.0, pcount1: 0, pcount2: 0, outo: false, outp: false }
	}

	/// Changes the thresholds without disturbing the filtered state
	pub fn set_params(&mut self, params:LockParams) { self.params = params; }

	pub fn params(&self) -> LockParams { self.params }

	/// Feeds one prompt correlation taken over `t` seconds
	pub fn update(&mut self, prompt:Complex<f64>, t:f64) {
		let k1 = self.params.k1;
		self.lpfi += k1 * (prompt.re.abs() / t - self.lpfi);
		self.lpfq += k1 * (prompt.im.abs() / t - self.lpfq);

		if self.lpfi / self.params.k2 > self.lpfq {
			self.pcount2 = 0;
			if self.pcount1 > self.params.lp { self.outp = true; } else { self.pcount1 += 1; }
			self.outo = true;
		} else {
			self.pcount1 = 0;
			self.pcount2 = self.pcount2.saturating_add(1);
			if self.pcount2 > self.params.lo { self.outo = false; }
			self.outp = false;
		}
	}

	pub fn outo(&self) -> bool { self.outo }
	pub fn outp(&self) -> bool { self.outp }

	/// More than `lo` consecutive updates without phase lock
	pub fn lost(&self) -> bool { self.pcount2 > self.params.lo }

	/// Carrier to noise density estimate from the filtered I and Q magnitudes, where `bw_hz` is the
	/// reciprocal of the coherent integration period
	pub fn cn0_dbhz(&self, bw_hz:f64) -> f64 {
		10.0 * (self.lpfi.powi(2) / (self.lpfq.powi(2) + 1.0e-20)).log10() + 10.0 * bw_hz.log10()
	}

}
