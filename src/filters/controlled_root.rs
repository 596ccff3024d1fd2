
use num_complex::Complex;

use crate::DigSigProcErr;
use crate::filters::{self, CodeLoop, LoopAiding, LoopParams, TrackingLoop};
use crate::filters::discriminators::{fll_cross_dot, pll_costas};

pub const TUNE_TOLERANCE:f64 = 1.0e-6;
pub const TUNE_MAX_ITERATIONS:usize = 30;

// Root placement of the third-order analog prototype: c1 = b3*w0, c2 = a3*w0^2, c3 = w0^3
const A3:f64 = 1.1;
const B3:f64 = 2.4;
const ANALOG_BW_PER_OMEGA:f64 = 0.7845;

// Upper limit on w0*T; beyond it the sampled loop no longer approximates the prototype
const MAX_OMEGA_T:f64 = 0.5;

fn coeffs_for(omega_0:f64) -> (f64, f64, f64) {
	(B3 * omega_0, A3 * omega_0.powi(2), omega_0.powi(3))
}

/// One-sided noise bandwidth in Hz of the sampled loop, from the energy of its closed-loop
/// impulse response.  `None` when the response does not decay.
pub fn noise_bandwidth(c1:f64, c2:f64, c3:f64, t:f64) -> Option<f64> {
	let (mut acc, mut vel, mut nco) = (0.0f64, 0.0f64, 0.0f64);
	let mut energy:f64 = 0.0;
	let max_len:usize = ((500.0 / (c1 * t).max(1.0e-9)).ceil() as usize).max(1000).min(2_000_000);
	for k in 0..max_len {
		let input:f64 = if k == 0 { 1.0 } else { 0.0 };
		let err:f64 = input - nco;
		acc += c3 * err * t;
		vel += (acc + c2 * err) * t;
		nco += (vel + c1 * err) * t;

		if !nco.is_finite() || nco.abs() > 1.0e6 { return None; }
		energy += nco * nco;

		let residual:f64 = nco.abs() + (vel * t).abs() + (acc * t * t).abs();
		if k > 10 && residual < 1.0e-14 { return Some(energy / (2.0 * t)); }
	}
	None
}

/// Controlled-root third-order gains for noise bandwidth `bw` at integration period `t`,
/// found by bisection on the natural frequency
pub fn tune(bw:f64, t:f64) -> Result<(f64, f64, f64), DigSigProcErr> {
	let failed = || DigSigProcErr::LoopTuneFailed{ bandwidth_hz: bw, integration_s: t };
	if !(bw > 0.0) || !(t > 0.0) { return Err(failed()); }

	let achieved = |omega_0:f64| -> Option<f64> {
		let (c1, c2, c3) = coeffs_for(omega_0);
		noise_bandwidth(c1, c2, c3, t)
	};

	// An unstable or non-decaying loop counts as too wide
	let cap:f64 = MAX_OMEGA_T / t;
	let mut lo:f64 = 0.0;
	let mut hi:f64 = (2.0 * bw / ANALOG_BW_PER_OMEGA).min(cap);
	while hi < cap {
		match achieved(hi) {
			Some(b) if b < bw => { lo = hi; hi = (2.0 * hi).min(cap); },
			_ => break,
		}
	}

	for _ in 0..TUNE_MAX_ITERATIONS {
		let mid:f64 = 0.5 * (lo + hi);
		match achieved(mid) {
			Some(b) if ((b - bw) / bw).abs() <= TUNE_TOLERANCE => return Ok(coeffs_for(mid)),
			Some(b) if b < bw => lo = mid,
			_ => hi = mid,
		}
	}
	Err(failed())
}

/// Third-order PLL with optional first-order FLL assist and a second-order carrier-aided DLL
pub struct ThirdOrderTrackingLoop {
	aiding:LoopAiding,
	t:f64,

	phase_acc:f64,
	phase_vel:f64,
	c1:f64,
	c2:f64,
	c3:f64,
	freq_c2:f64,
	prev_prompt:Option<Complex<f64>>,

	dll:CodeLoop,

	carr_freq:f64,
	code_freq:f64,
}

impl ThirdOrderTrackingLoop {

	pub fn new(params:&LoopParams, aiding:LoopAiding, code_freq:f64, carr_freq:f64) -> Result<Self, DigSigProcErr> {
		filters::check_params(params)?;
		let (c1, c2, c3) = tune(params.carr_bw, params.integration_s)?;
		Ok(Self{ aiding, t: params.integration_s, phase_acc: 0.0, phase_vel: carr_freq, c1, c2, c3,
			freq_c2: 4.0 * params.fll_bw, prev_prompt: None,
			dll: CodeLoop::new(params.code_bw, params.integration_s), carr_freq, code_freq })
	}

}

impl TrackingLoop for ThirdOrderTrackingLoop {

	fn update(&mut self, early:Complex<f64>, prompt:Complex<f64>, late:Complex<f64>) -> (f64, f64) {
		let phase_err:f64 = pll_costas(prompt);
		let freq_err:f64 = match self.prev_prompt {
			Some(prev) if self.freq_c2 > 0.0 => fll_cross_dot(prev, prompt, self.t),
			_ => 0.0,
		};
		self.prev_prompt = Some(prompt);

		self.phase_acc += self.c3 * phase_err * self.t;
		self.phase_vel += (self.phase_acc + self.c2 * phase_err + self.freq_c2 * freq_err) * self.t;
		self.carr_freq = self.phase_vel + self.c1 * phase_err;

		self.code_freq = self.aiding.nominal_code_freq_hz + self.aiding.code_aiding(self.carr_freq) + self.dll.update(early, late);
		(self.code_freq, self.carr_freq)
	}

	fn retune(&mut self, params:&LoopParams) -> Result<(), DigSigProcErr> {
		filters::check_params(params)?;
		let (c1, c2, c3) = tune(params.carr_bw, params.integration_s)?;
		self.c1 = c1;
		self.c2 = c2;
		self.c3 = c3;
		self.freq_c2 = 4.0 * params.fll_bw;
		self.t = params.integration_s;
		self.dll.retune(params.code_bw, params.integration_s);
		self.prev_prompt = None;
		log::debug!("Retuned third-order loop: carr_bw={} T={} -> c1={:.4} c2={:.4} c3={:.4}", params.carr_bw, params.integration_s, c1, c2, c3);
		Ok(())
	}

	fn adjust_carrier(&mut self, delta_hz:f64) {
		self.phase_vel += delta_hz;
		self.carr_freq += delta_hz;
		self.prev_prompt = None;
	}

	fn code_freq(&self) -> f64 { self.code_freq }
	fn carr_freq(&self) -> f64 { self.carr_freq }

}
