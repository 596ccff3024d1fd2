
use std::f64::consts;

use num_complex::Complex;
use num_traits::Zero;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::config::Configuration;
use crate::fourier_analysis;
use crate::gnss::code;
use crate::gnss::signal::SignalKind;
use crate::io::SampleWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionStatus {
	Acquired,
	NotAcquired,
}

/// Outcome of the search for one satellite.  `code_phase_chips` is the replica chip arriving at
/// absolute sample `sample_index`, and `carrier_freq_hz` includes the IF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionResult {
	pub prn:usize,
	pub signal:SignalKind,
	pub carrier_freq_hz:f64,
	pub code_phase_chips:f64,
	pub snr:f64,
	pub status:AcquisitionStatus,
	pub sample_index:u64,
}

impl AcquisitionResult {

	pub fn is_acquired(&self) -> bool { self.status == AcquisitionStatus::Acquired }

}

/// Coarse parallel code phase search over a Doppler grid followed by a fine frequency search
#[derive(Debug, Clone)]
pub struct AcquisitionEngine {
	pub fs:f64,
	pub search_band_hz:f64,
	pub threshold:f64,
	pub fine_ms:usize,
	pub window_ms:usize,
}

// Best code phase of one Doppler bin
#[derive(Debug, Clone, Copy)]
struct BinPeak {
	power:f64,
	lag:usize,
	second_segment:bool,
}

impl AcquisitionEngine {

	pub fn new(config:&Configuration) -> Self {
		let acq = &config.acquisition;
		Self{ fs: config.sampling_freq_hz, search_band_hz: acq.search_band_hz, threshold: acq.threshold,
			fine_ms: acq.fine_ms, window_ms: acq.window_ms }
	}

	/// Samples in one code millisecond, the coarse segment length
	pub fn segment_len(&self) -> usize { (self.fs * 1.0e-3).round() as usize }

	/// Samples the engine reads per search
	pub fn window_len(&self) -> usize { ((self.window_ms as f64) * self.fs * 1.0e-3).ceil() as usize }

	/// Doppler bin spacing of the zero-padded coarse transform
	pub fn bin_spacing_hz(&self) -> f64 { self.fs / (2.0 * self.segment_len() as f64) }

	/// Searches `samples`, whose first value is absolute sample `first_sample_index`, for one
	/// satellite whose carrier sits near `center_freq_hz`
	pub fn acquire(&self, samples:&[i8], first_sample_index:u64, center_freq_hz:f64, prn:usize, signal:SignalKind) -> Result<AcquisitionResult, DigSigProcErr> {
		if !signal.is_acquirable() {
			return Err(DigSigProcErr::InvalidConfiguration(format!("{:?} cannot be acquired directly", signal)));
		}
		let table:&[i8] = code::get_code(prn, signal)?;
		let n:usize = self.segment_len();
		let needed:usize = 2 * n;
		if samples.len() < needed {
			return Err(DigSigProcErr::InvalidConfiguration(format!("acquisition needs {} samples, got {}", needed, samples.len())));
		}

		let code_len:f64 = signal.code_length() as f64;
		let chips_per_sample:f64 = signal.chip_rate_hz() / self.fs;

		// Conjugate spectrum of one upsampled code period
		let mut code_spectrum:Vec<Complex<f64>> = (0..n)
			.map(|i| Complex{ re: table[(i * table.len()) / n] as f64, im: 0.0 }).collect();
		fourier_analysis::fft_in_place(&mut code_spectrum)?;
		for c in code_spectrum.iter_mut() { *c = c.conj(); }

		let to_f64 = |s:&[i8]| -> Vec<f64> { s.iter().map(|x| *x as f64).collect() };
		let spectra:[Vec<Complex<f64>>; 2] = [
			fourier_analysis::real_spectrum(&to_f64(&samples[..n]), 2*n)?,
			fourier_analysis::real_spectrum(&to_f64(&samples[n..2*n]), 2*n)?,
		];

		let spacing:f64 = self.bin_spacing_hz();
		let lo_bin:i64 = ((center_freq_hz - self.search_band_hz / 2.0) / spacing).ceil() as i64;
		let hi_bin:i64 = ((center_freq_hz + self.search_band_hz / 2.0) / spacing).ceil() as i64;
		if hi_bin <= lo_bin { return Err(DigSigProcErr::InvalidConfiguration("empty Doppler search grid".to_string())); }

		let mut grid:Vec<Vec<f64>> = Vec::with_capacity((hi_bin - lo_bin) as usize);
		let mut peaks:Vec<BinPeak> = Vec::with_capacity(grid.capacity());
		let mut buffer:Vec<Complex<f64>> = vec![Complex::zero(); n];
		let two_n:i64 = 2 * n as i64;

		for bin in lo_bin..hi_bin {
			let mut best:Option<(BinPeak, Vec<f64>)> = None;
			for (seg_idx, spectrum) in spectra.iter().enumerate() {
				// Even bins of the shifted 2N spectrum are the N-point spectrum of the mixed segment
				for (q, (b, c)) in buffer.iter_mut().zip(code_spectrum.iter()).enumerate() {
					let k:usize = ((2 * q as i64) + bin).rem_euclid(two_n) as usize;
					*b = spectrum[k] * c;
				}
				fourier_analysis::ifft_in_place(&mut buffer)?;
				let power:Vec<f64> = buffer.iter().map(|c| c.norm_sqr()).collect();

				let mut peak = BinPeak{ power: -1.0, lag: 0, second_segment: seg_idx == 1 };
				for (lag, p) in power.iter().enumerate() {
					if *p > peak.power { peak.power = *p; peak.lag = lag; }
				}
				let better = match &best { Some((b, _)) => peak.power > b.power, None => true };
				if better { best = Some((peak, power)); }
			}
			if let Some((peak, power)) = best {
				peaks.push(peak);
				grid.push(power);
			}
		}

		// Strictly greater keeps ties at the lower bin
		let mut best_bin:usize = 0;
		for (idx, p) in peaks.iter().enumerate() {
			if p.power > peaks[best_bin].power { best_bin = idx; }
		}
		let total:f64 = grid.iter().map(|row| row.iter().sum::<f64>()).sum();
		let count:f64 = grid.iter().map(|row| row.len()).sum::<usize>() as f64;
		let mean:f64 = total / count;
		if !mean.is_finite() { return Err(DigSigProcErr::NumericalFault("non-finite acquisition grid")); }
		let peak = peaks[best_bin];
		let snr:f64 = if mean > 0.0 { peak.power / mean } else { 0.0 };

		// Lag k means the code epoch arrives at sample k of the segment
		let segment_start:f64 = if peak.second_segment { n as f64 } else { 0.0 };
		let code_phase:f64 = (-(segment_start + peak.lag as f64) * chips_per_sample).rem_euclid(code_len);
		let coarse_freq:f64 = ((lo_bin + best_bin as i64) as f64) * spacing;

		let mut result = AcquisitionResult{ prn, signal, carrier_freq_hz: coarse_freq, code_phase_chips: code_phase,
			snr, status: AcquisitionStatus::NotAcquired, sample_index: first_sample_index };

		if snr < self.threshold {
			log::debug!("PRN {} {:?}: not acquired, snr {:.2} at {:.1} Hz", prn, signal, snr, coarse_freq);
			return Ok(result);
		}

		let epoch:usize = ((code_len - code_phase).rem_euclid(code_len) / chips_per_sample).round() as usize;
		result.carrier_freq_hz = self.fine_frequency(samples, epoch, coarse_freq, table, signal)?;
		result.status = AcquisitionStatus::Acquired;
		log::info!("Acquired PRN {} {:?}: carrier {:.1} Hz (coarse {:.1} Hz), code phase {:.2} chips, snr {:.1}",
			prn, signal, result.carrier_freq_hz, coarse_freq, code_phase, snr);
		Ok(result)
	}

	// Refines the carrier with a long Hann-windowed transform of the code-wiped samples starting at
	// the code epoch `start`
	fn fine_frequency(&self, samples:&[i8], start:usize, coarse_freq:f64, table:&[i8], signal:SignalKind) -> Result<f64, DigSigProcErr> {
		let seg_len:usize = self.fine_ms * self.segment_len();
		let end:usize = (start + seg_len).min(samples.len());
		let len:usize = end - start;
		if len < 2 { return Ok(coarse_freq); }

		let nfft:usize = 8 * fourier_analysis::next_pow2(len);
		let chips_per_sample:f64 = signal.chip_rate_hz() / self.fs;
		let code_len:f64 = table.len() as f64;

		let mut x:Vec<Complex<f64>> = vec![Complex::zero(); nfft];
		for (m, s) in samples[start..end].iter().enumerate() {
			let t:f64 = m as f64;
			let chip = table[((t * chips_per_sample).rem_euclid(code_len)) as usize] as f64;
			let hann:f64 = 0.5 * (1.0 - (2.0 * consts::PI * t / ((len - 1) as f64)).cos());
			let wipe = Complex::from_polar(1.0, -2.0 * consts::PI * coarse_freq * t / self.fs);
			x[m] = wipe * ((*s as f64) * chip * hann);
		}
		fourier_analysis::fft_in_place(&mut x)?;

		let resolution:f64 = self.fs / (nfft as f64);
		let half_width:i64 = (self.bin_spacing_hz() / resolution).ceil() as i64;
		let mag = |i:i64| -> f64 { x[i.rem_euclid(nfft as i64) as usize].norm() };

		let mut best:i64 = -half_width;
		for i in -half_width..=half_width {
			if mag(i) > mag(best) { best = i; }
		}

		let (k0, k1, k2) = (mag(best - 1), mag(best), mag(best + 1));
		let at_edge:bool = best == -half_width || best == half_width;
		let delta:f64 = if at_edge || k0 <= 0.0 || k1 <= 0.0 || k2 <= 0.0 { 0.0 } else {
			let denom:f64 = 2.0 * k1.ln() - k0.ln() - k2.ln();
			if denom == 0.0 { 0.0 } else { 0.5 * (k2.ln() - k0.ln()) / denom }
		};
		Ok(coarse_freq + ((best as f64) + delta) * resolution)
	}

	/// Searches every target in parallel over `window` and returns the acquired satellites by
	/// descending SNR
	pub fn acquire_all(&self, window:&SampleWindow, targets:&[(usize, SignalKind)]) -> Result<Vec<AcquisitionResult>, DigSigProcErr> {
		let results:Vec<AcquisitionResult> = targets.par_iter()
			.map(|(prn, signal)| {
				let band = window.band(signal.band())
					.ok_or_else(|| DigSigProcErr::InvalidConfiguration(format!("no samples for {:?}", signal.band())))?;
				let center:f64 = band.intermediate_freq_hz + signal.slot_offset_hz(*prn);
				self.acquire(&band.samples, window.first_sample_index, center, *prn, *signal)
			})
			.collect::<Result<Vec<AcquisitionResult>, DigSigProcErr>>()?;

		let mut acquired:Vec<AcquisitionResult> = results.into_iter().filter(|r| r.is_acquired()).collect();
		sort_by_snr(&mut acquired);
		Ok(acquired)
	}

}

/// Descending SNR, ties broken by PRN
pub fn sort_by_snr(results:&mut Vec<AcquisitionResult>) {
	results.sort_by(|a, b| b.snr.partial_cmp(&a.snr).unwrap_or(std::cmp::Ordering::Equal).then(a.prn.cmp(&b.prn)));
}
