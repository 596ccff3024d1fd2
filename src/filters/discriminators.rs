
use std::f64::consts;

use num_complex::Complex;

/// Normalized non-coherent early-minus-late code discriminator.  Positive when the replica
/// lags the received code.
pub fn dll_early_minus_late(early:Complex<f64>, late:Complex<f64>) -> f64 {
	let e:f64 = early.norm();
	let l:f64 = late.norm();
	if e + l == 0.0 { 0.0 } else { (e - l) / (e + l) }
}

/// Two-quadrant Costas discriminator in cycles, insensitive to data bit sign
pub fn pll_costas(prompt:Complex<f64>) -> f64 {
	if prompt.re == 0.0 { 0.0 } else { (prompt.im / prompt.re).atan() / (2.0 * consts::PI) }
}

/// Four-quadrant cross/dot frequency discriminator in Hz over one integration period `t`
pub fn fll_cross_dot(prev:Complex<f64>, prompt:Complex<f64>, t:f64) -> f64 {
	let cross:f64 = prev.re*prompt.im - prompt.re*prev.im;
	let dot:f64 = (prompt.re*prev.re).abs() + (prompt.im*prev.im).abs();
	cross.atan2(dot) / (2.0 * consts::PI * t)
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn dll_sign_and_scale() {
		let one = Complex{ re: 1.0, im: 0.0 };
		assert_eq!(dll_early_minus_late(one, one), 0.0);
		assert!(dll_early_minus_late(one * 0.8, one * 0.2) > 0.0);
		assert!((dll_early_minus_late(one * 0.8, one * 0.2) - 0.6).abs() < 1.0e-12);
		assert_eq!(dll_early_minus_late(one * 0.0, one * 0.0), 0.0);
	}

	#[test]
	fn costas_ignores_bit_sign() {
		let p = Complex::from_polar(1.0, 0.3);
		assert!((pll_costas(p) - 0.3 / (2.0 * consts::PI)).abs() < 1.0e-12);
		assert!((pll_costas(-p) - pll_costas(p)).abs() < 1.0e-12);
	}

	#[test]
	fn fll_measures_phase_rate() {
		let t = 1.0e-3;
		let prev = Complex::from_polar(1.0, 0.1);
		let p = Complex::from_polar(1.0, 0.1 + 2.0 * consts::PI * 20.0 * t);
		assert!((fll_cross_dot(prev, p, t) - 20.0).abs() < 1.0e-6);
		assert!((fll_cross_dot(p, prev, t) + 20.0).abs() < 1.0e-6);
	}

}
