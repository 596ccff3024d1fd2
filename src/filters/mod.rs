
use num_complex::Complex;
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;

pub mod aided;
pub mod controlled_root;
pub mod discriminators;

pub use self::aided::AidedTrackingLoop;
pub use self::controlled_root::ThirdOrderTrackingLoop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopOrder {
	Second,
	Third,
}

/// Noise bandwidths in Hz and the coherent integration period in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopParams {
	pub code_bw:f64,
	pub carr_bw:f64,
	pub fll_bw:f64,
	pub integration_s:f64,
}

/// Constants that tie the code NCO to the carrier NCO
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopAiding {
	pub intermediate_freq_hz:f64,
	pub nominal_code_freq_hz:f64,
	pub carr_to_code:f64,
}

impl LoopAiding {

	// Chip rate implied by the carrier Doppler
	pub fn code_aiding(&self, carr_freq:f64) -> f64 {
		if self.carr_to_code > 0.0 { (carr_freq - self.intermediate_freq_hz) / self.carr_to_code } else { 0.0 }
	}

}

/// Coupled carrier and code loop.  Frequencies are absolute NCO rates: the carrier includes the
/// IF and the code includes the nominal chip rate.
pub trait TrackingLoop: Send {
	fn update(&mut self, early:Complex<f64>, prompt:Complex<f64>, late:Complex<f64>) -> (f64, f64);
	fn retune(&mut self, params:&LoopParams) -> Result<(), DigSigProcErr>;

	/// Moves the carrier NCO by `delta_hz` without running the filter
	fn adjust_carrier(&mut self, delta_hz:f64);

	fn code_freq(&self) -> f64;
	fn carr_freq(&self) -> f64;
}

pub fn make_loop(order:LoopOrder, params:&LoopParams, aiding:LoopAiding, code_freq:f64, carr_freq:f64) -> Result<Box<dyn TrackingLoop>, DigSigProcErr> {
	Ok(match order {
		LoopOrder::Second => Box::new(AidedTrackingLoop::new(params, aiding, code_freq, carr_freq)?),
		LoopOrder::Third  => Box::new(ThirdOrderTrackingLoop::new(params, aiding, code_freq, carr_freq)?),
	})
}

// Second-order loop gains for damping 0.707
pub(crate) fn second_order_coeffs(bw:f64) -> (f64, f64) {
	let omega_0:f64 = bw / 0.53;
	(1.414 * omega_0, omega_0 * omega_0)
}

/// Second-order DLL with carrier aiding, shared by both carrier loop designs
#[derive(Debug, Clone)]
pub struct CodeLoop {
	pub code_vel:f64,
	c1:f64,
	c2:f64,
	t:f64,
}

impl CodeLoop {

	pub fn new(code_bw:f64, t:f64) -> Self {
		let (c1, c2) = second_order_coeffs(code_bw);
		Self{ code_vel: 0.0, c1, c2, t }
	}

	pub fn retune(&mut self, code_bw:f64, t:f64) {
		let (c1, c2) = second_order_coeffs(code_bw);
		self.c1 = c1;
		self.c2 = c2;
		self.t = t;
	}

	/// Code NCO rate offset from the carrier-aided rate
	pub fn update(&mut self, early:Complex<f64>, late:Complex<f64>) -> f64 {
		let code_err:f64 = discriminators::dll_early_minus_late(early, late);
		self.code_vel += code_err * self.c2 * self.t;
		self.code_vel + code_err * self.c1
	}

}

pub(crate) fn check_params(params:&LoopParams) -> Result<(), DigSigProcErr> {
	let ok = |x:f64| x.is_finite() && x >= 0.0;
	if ok(params.code_bw) && ok(params.carr_bw) && ok(params.fll_bw) && params.integration_s > 0.0 && params.integration_s.is_finite() {
		Ok(())
	} else {
		Err(DigSigProcErr::InvalidConfiguration(format!("invalid loop parameters {:?}", params)))
	}
}
