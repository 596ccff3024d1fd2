
use num_complex::Complex;

use crate::DigSigProcErr;
use crate::filters::{self, CodeLoop, LoopAiding, LoopParams, TrackingLoop};
use crate::filters::discriminators::{fll_cross_dot, pll_costas};

/// Second-order PLL assisted by a first-order FLL, with a second-order carrier-aided DLL
pub struct AidedTrackingLoop {
	aiding:LoopAiding,
	t:f64,

	phase_vel:f64,
	phase_c1:f64,
	phase_c2:f64,
	freq_c1:f64,
	freq_c2:f64,
	prev_prompt:Option<Complex<f64>>,

	dll:CodeLoop,

	carr_freq:f64,
	code_freq:f64,
}

impl AidedTrackingLoop {

	pub fn new(params:&LoopParams, aiding:LoopAiding, code_freq:f64, carr_freq:f64) -> Result<Self, DigSigProcErr> {
		filters::check_params(params)?;
		let (phase_c1, phase_c2) = filters::second_order_coeffs(params.carr_bw);
		let (freq_c1, freq_c2) = fll_coeffs(params.fll_bw, params.integration_s);
		Ok(Self{ aiding, t: params.integration_s, phase_vel: carr_freq, phase_c1, phase_c2, freq_c1, freq_c2, prev_prompt: None,
			dll: CodeLoop::new(params.code_bw, params.integration_s), carr_freq, code_freq })
	}

}

// Same shape as the phase gains.  The proportional term acts on the phase the frequency error
// slips over one integration, so it carries a factor of T.
fn fll_coeffs(fll_bw:f64, t:f64) -> (f64, f64) {
	let (c1, c2) = filters::second_order_coeffs(fll_bw);
	(c1 * t, c2)
}

impl TrackingLoop for AidedTrackingLoop {

	fn update(&mut self, early:Complex<f64>, prompt:Complex<f64>, late:Complex<f64>) -> (f64, f64) {
		let phase_err:f64 = pll_costas(prompt);
		let freq_err:f64 = match self.prev_prompt {
			Some(prev) if self.freq_c2 > 0.0 => fll_cross_dot(prev, prompt, self.t),
			_ => 0.0,
		};
		self.prev_prompt = Some(prompt);

		self.phase_vel += (freq_err * self.freq_c2 + phase_err * self.phase_c2) * self.t;
		self.carr_freq = self.phase_vel + freq_err * self.freq_c1 + phase_err * self.phase_c1;

		self.code_freq = self.aiding.nominal_code_freq_hz + self.aiding.code_aiding(self.carr_freq) + self.dll.update(early, late);
		(self.code_freq, self.carr_freq)
	}

	fn retune(&mut self, params:&LoopParams) -> Result<(), DigSigProcErr> {
		filters::check_params(params)?;
		let (phase_c1, phase_c2) = filters::second_order_coeffs(params.carr_bw);
		self.phase_c1 = phase_c1;
		self.phase_c2 = phase_c2;
		let (freq_c1, freq_c2) = fll_coeffs(params.fll_bw, params.integration_s);
		self.freq_c1 = freq_c1;
		self.freq_c2 = freq_c2;
		self.t = params.integration_s;
		self.dll.retune(params.code_bw, params.integration_s);
		// The next prompt covers a different interval, so it can't be differenced with the last one
		self.prev_prompt = None;
		log::debug!("Retuned aided loop: carr_bw={} fll_bw={} code_bw={} T={}", params.carr_bw, params.fll_bw, params.code_bw, params.integration_s);
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

#[cfg(test)]
mod tests {

	use std::f64::consts;

	use super::*;

	fn aiding() -> LoopAiding { LoopAiding{ intermediate_freq_hz: 0.0, nominal_code_freq_hz: 1.023e6, carr_to_code: 1540.0 } }

	#[test]
	fn coefficients_follow_bandwidth() {
		let (c1, c2) = filters::second_order_coeffs(53.0);
		assert!((c1 - 141.4).abs() < 1.0e-9);
		assert!((c2 - 10000.0).abs() < 1.0e-9);
	}

	#[test]
	fn pulls_in_a_frequency_offset() {
		// Simulated prompt from a 15 Hz carrier offset and a perfectly aligned code
		let params = LoopParams{ code_bw: 1.0, carr_bw: 20.0, fll_bw: 10.0, integration_s: 1.0e-3 };
		let mut lf = AidedTrackingLoop::new(&params, aiding(), 1.023e6, 0.0).unwrap();
		let true_freq = 15.0;
		let (mut sig_phase, mut nco_phase) = (0.0f64, 0.0f64);
		let one = Complex{ re: 1.0, im: 0.0 };
		for _ in 0..2000 {
			// Average phase difference over the integration
			let carr = lf.carr_freq();
			let dphi = (sig_phase - nco_phase) + 0.5 * (true_freq - carr) * params.integration_s;
			let prompt = Complex::from_polar(1.0, 2.0 * consts::PI * dphi);
			sig_phase += true_freq * params.integration_s;
			nco_phase += carr * params.integration_s;
			lf.update(one * 0.5, prompt, one * 0.5);
		}
		assert!((lf.carr_freq() - true_freq).abs() < 0.5, "carrier {}", lf.carr_freq());
		assert!((lf.code_freq() - (1.023e6 + true_freq / 1540.0)).abs() < 0.05);
	}

	#[test]
	fn frequency_error_reaches_the_output_directly() {
		let params = LoopParams{ code_bw: 1.0, carr_bw: 10.0, fll_bw: 5.0, integration_s: 1.0e-3 };
		let mut lf = AidedTrackingLoop::new(&params, aiding(), 1.023e6, 0.0).unwrap();
		let one = Complex{ re: 1.0, im: 0.0 };
		lf.update(one, one, one);
		assert_eq!(lf.carr_freq(), 0.0);

		// 0.02 cycles of rotation in 1 ms is a 20 Hz frequency error
		let prompt = Complex::from_polar(1.0, 2.0 * consts::PI * 0.02);
		lf.update(one, prompt, one);
		let (pc1, pc2) = filters::second_order_coeffs(10.0);
		let (fc1, fc2) = filters::second_order_coeffs(5.0);
		let vel = (20.0 * fc2 + 0.02 * pc2) * 1.0e-3;
		let expected = vel + 20.0 * fc1 * 1.0e-3 + 0.02 * pc1;
		assert!((lf.carr_freq() - expected).abs() < 1.0e-6, "carrier {} expected {}", lf.carr_freq(), expected);

		// Without the FLL only the phase terms remain
		let params = LoopParams{ fll_bw: 0.0, ..params };
		let mut pll = AidedTrackingLoop::new(&params, aiding(), 1.023e6, 0.0).unwrap();
		pll.update(one, one, one);
		pll.update(one, prompt, one);
		assert!((pll.carr_freq() - (0.02 * pc2 * 1.0e-3 + 0.02 * pc1)).abs() < 1.0e-6);
	}

	#[test]
	fn adjust_carrier_moves_nco_once() {
		let params = LoopParams{ code_bw: 1.0, carr_bw: 10.0, fll_bw: 0.0, integration_s: 1.0e-3 };
		let mut lf = AidedTrackingLoop::new(&params, aiding(), 1.023e6, 100.0).unwrap();
		lf.adjust_carrier(-25.0);
		assert_eq!(lf.carr_freq(), 75.0);
	}

	#[test]
	fn rejects_bad_parameters() {
		let params = LoopParams{ code_bw: 1.0, carr_bw: -1.0, fll_bw: 0.0, integration_s: 1.0e-3 };
		assert!(AidedTrackingLoop::new(&params, aiding(), 1.023e6, 0.0).is_err());
	}

}
