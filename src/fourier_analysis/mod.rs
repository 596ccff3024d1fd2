
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use num_complex::Complex;
use num_traits::Zero;
use once_cell::sync::Lazy;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::DigSigProcErr;

type RealPlan = Arc<dyn RealToComplex<f64>>;
type ComplexPlan = Arc<dyn Fft<f64>>;

// Plans are created on first request for a length and never change afterwards
static REAL_FORWARD:Lazy<RwLock<HashMap<usize, RealPlan>>> = Lazy::new(|| RwLock::new(HashMap::new()));
static FORWARD:Lazy<RwLock<HashMap<usize, ComplexPlan>>> = Lazy::new(|| RwLock::new(HashMap::new()));
static INVERSE:Lazy<RwLock<HashMap<usize, ComplexPlan>>> = Lazy::new(|| RwLock::new(HashMap::new()));

fn cached<P: Clone>(table:&RwLock<HashMap<usize, P>>, len:usize, make:impl FnOnce() -> P) -> Result<P, DigSigProcErr> {
	if let Some(plan) = table.read().map_err(|_| DigSigProcErr::NumericalFault("FFT plan table poisoned"))?.get(&len) {
		return Ok(plan.clone());
	}
	let mut writer = table.write().map_err(|_| DigSigProcErr::NumericalFault("FFT plan table poisoned"))?;
	Ok(writer.entry(len).or_insert_with(make).clone())
}

pub fn real_forward_plan(len:usize) -> Result<RealPlan, DigSigProcErr> {
	cached(&REAL_FORWARD, len, || RealFftPlanner::<f64>::new().plan_fft_forward(len))
}

pub fn forward_plan(len:usize) -> Result<ComplexPlan, DigSigProcErr> {
	cached(&FORWARD, len, || FftPlanner::<f64>::new().plan_fft_forward(len))
}

pub fn inverse_plan(len:usize) -> Result<ComplexPlan, DigSigProcErr> {
	cached(&INVERSE, len, || FftPlanner::<f64>::new().plan_fft_inverse(len))
}

/// Full `fft_len`-point spectrum of a real sequence, zero-padded to `fft_len`.  Only the
/// non-negative half is computed; the rest follows from conjugate symmetry.
pub fn real_spectrum(x:&[f64], fft_len:usize) -> Result<Vec<Complex<f64>>, DigSigProcErr> {
	if x.len() > fft_len { return Err(DigSigProcErr::NumericalFault("real FFT input longer than transform")); }
	let plan = real_forward_plan(fft_len)?;
	let mut input:Vec<f64> = plan.make_input_vec();
	input[..x.len()].copy_from_slice(x);
	let mut half:Vec<Complex<f64>> = plan.make_output_vec();
	plan.process(&mut input, &mut half).map_err(|_| DigSigProcErr::NumericalFault("real FFT failed"))?;

	let mut full:Vec<Complex<f64>> = vec![Complex::zero(); fft_len];
	for (k, v) in half.iter().enumerate() { full[k] = *v; }
	for k in half.len()..fft_len { full[k] = full[fft_len - k].conj(); }
	Ok(full)
}

/// In-place forward complex FFT
pub fn fft_in_place(x:&mut [Complex<f64>]) -> Result<(), DigSigProcErr> {
	forward_plan(x.len())?.process(x);
	Ok(())
}

/// In-place inverse complex FFT, scaled by 1/N
pub fn ifft_in_place(x:&mut [Complex<f64>]) -> Result<(), DigSigProcErr> {
	inverse_plan(x.len())?.process(x);
	let scale:f64 = 1.0 / (x.len() as f64);
	for v in x.iter_mut() { *v *= scale; }
	Ok(())
}

pub fn next_pow2(n:usize) -> usize { n.next_power_of_two() }
