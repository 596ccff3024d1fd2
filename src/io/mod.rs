
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use byteorder::ReadBytesExt;

use crate::DigSigProcErr;
use crate::config::{BandConfig, Configuration};
use crate::gnss::signal::Band;

pub mod records;

#[derive(Debug, Clone)]
pub struct BandSamples {
	pub band:Band,
	pub intermediate_freq_hz:f64,
	pub samples:Vec<i8>,
}

/// Immutable block of real samples for every band, starting at the same absolute sample index
#[derive(Debug, Clone)]
pub struct SampleWindow {
	pub first_sample_index:u64,
	pub sampling_freq_hz:f64,
	pub bands:Vec<BandSamples>,
}

impl SampleWindow {

	pub fn band(&self, band:Band) -> Option<&BandSamples> { self.bands.iter().find(|b| b.band == band) }

	/// Number of samples held per band
	pub fn len(&self) -> usize { self.bands.iter().map(|b| b.samples.len()).min().unwrap_or(0) }

	pub fn is_empty(&self) -> bool { self.len() == 0 }

	/// One past the last absolute sample index covered
	pub fn end_sample_index(&self) -> u64 { self.first_sample_index + (self.len() as u64) }

	/// Samples of one band over the absolute range [start, start+n), if the window covers it
	pub fn slice(&self, band:Band, start:u64, n:usize) -> Option<&[i8]> {
		if start < self.first_sample_index { return None; }
		let offset = (start - self.first_sample_index) as usize;
		let b = self.band(band)?;
		b.samples.get(offset..offset + n)
	}

}

pub trait SampleProvider {
	fn sampling_freq_hz(&self) -> f64;
	fn bands(&self) -> Vec<BandConfig>;

	/// Reads up to `n_samples` per band starting at absolute index `first_sample`.  A short window is
	/// returned near the end of the stream; `EndOfStream` once nothing is left.
	fn read(&mut self, first_sample:u64, n_samples:usize) -> Result<Arc<SampleWindow>, DigSigProcErr>;
}

/// Provider over samples already in memory, one vector per band
pub struct MemorySource {
	fs:f64,
	bands:Vec<BandSamples>,
}

impl MemorySource {

	pub fn new(fs:f64, bands:Vec<BandSamples>) -> Self { Self{ fs, bands } }

	pub fn single_band(fs:f64, band:Band, intermediate_freq_hz:f64, samples:Vec<i8>) -> Self {
		Self::new(fs, vec![BandSamples{ band, intermediate_freq_hz, samples }])
	}

	pub fn len(&self) -> usize { self.bands.iter().map(|b| b.samples.len()).min().unwrap_or(0) }

}

impl SampleProvider for MemorySource {

	fn sampling_freq_hz(&self) -> f64 { self.fs }

	fn bands(&self) -> Vec<BandConfig> {
		self.bands.iter().map(|b| BandConfig{ band: b.band, intermediate_freq_hz: b.intermediate_freq_hz }).collect()
	}

	fn read(&mut self, first_sample:u64, n_samples:usize) -> Result<Arc<SampleWindow>, DigSigProcErr> {
		let total = self.len() as u64;
		if first_sample >= total { return Err(DigSigProcErr::EndOfStream); }
		let start = first_sample as usize;
		let end = (first_sample + n_samples as u64).min(total) as usize;
		let bands = self.bands.iter().map(|b| BandSamples{ band: b.band, intermediate_freq_hz: b.intermediate_freq_hz,
			samples: b.samples[start..end].to_vec() }).collect();
		Ok(Arc::new(SampleWindow{ first_sample_index: first_sample, sampling_freq_hz: self.fs, bands }))
	}

}

/// Provider over a file of int8 samples with the bands interleaved sample by sample, in the order
/// given by `bands`
pub struct FileSource<R: Read + Seek> {
	src:R,
	fs:f64,
	bands:Vec<BandConfig>,
}

impl<R: Read + Seek> FileSource<R> {

	pub fn new(src:R, fs:f64, bands:Vec<BandConfig>) -> Result<Self, DigSigProcErr> {
		if bands.is_empty() { return Err(DigSigProcErr::InvalidConfiguration("file source needs at least one band".to_string())); }
		Ok(Self{ src, fs, bands })
	}

	pub fn from_config(src:R, config:&Configuration) -> Result<Self, DigSigProcErr> {
		Self::new(src, config.sampling_freq_hz, config.bands.clone())
	}

}

impl<R: Read + Seek> SampleProvider for FileSource<R> {

	fn sampling_freq_hz(&self) -> f64 { self.fs }

	fn bands(&self) -> Vec<BandConfig> { self.bands.clone() }

	fn read(&mut self, first_sample:u64, n_samples:usize) -> Result<Arc<SampleWindow>, DigSigProcErr> {
		let n_bands = self.bands.len();
		self.src.seek(SeekFrom::Start(first_sample * (n_bands as u64)))?;

		// A short read near the end of the file is not an error
		let mut bytes:Vec<u8> = Vec::with_capacity(n_samples * n_bands);
		(&mut self.src).take((n_samples * n_bands) as u64).read_to_end(&mut bytes)?;
		let filled:usize = bytes.len() - (bytes.len() % n_bands);
		let mut interleaved:Vec<i8> = vec![0; filled];
		std::io::Cursor::new(&bytes[..filled]).read_i8_into(&mut interleaved)?;

		let n_read = filled / n_bands;
		if n_read == 0 { return Err(DigSigProcErr::EndOfStream); }

		let bands = self.bands.iter().enumerate().map(|(band_idx, cfg)| {
			let samples:Vec<i8> = (0..n_read).map(|i| interleaved[i*n_bands + band_idx]).collect();
			BandSamples{ band: cfg.band, intermediate_freq_hz: cfg.intermediate_freq_hz, samples }
		}).collect();

		Ok(Arc::new(SampleWindow{ first_sample_index: first_sample, sampling_freq_hz: self.fs, bands }))
	}

}

#[cfg(test)]
mod tests {

	use std::io::Cursor;

	use super::*;

	#[test]
	fn memory_source_windows() {
		let mut src = MemorySource::single_band(1.0e6, Band::GpsL1, 0.0, (0..100).map(|x| x as i8).collect());
		let w = src.read(10, 20).unwrap();
		assert_eq!(w.first_sample_index, 10);
		assert_eq!(w.len(), 20);
		assert_eq!(w.slice(Band::GpsL1, 15, 2), Some(&[15i8, 16][..]));
		assert_eq!(w.slice(Band::GpsL1, 25, 10), None);
		assert!(w.slice(Band::GpsL2, 15, 1).is_none());

		let tail = src.read(90, 20).unwrap();
		assert_eq!(tail.len(), 10);
		assert!(matches!(src.read(100, 1), Err(DigSigProcErr::EndOfStream)));
	}

	#[test]
	fn file_source_deinterleaves() {
		let bytes:Vec<u8> = (0..40u8).map(|x| if x % 2 == 0 { x } else { (-(x as i8)) as u8 }).collect();
		let bands = vec![
			BandConfig{ band: Band::GpsL1, intermediate_freq_hz: 1.0e3 },
			BandConfig{ band: Band::GpsL2, intermediate_freq_hz: 2.0e3 },
		];
		let mut src = FileSource::new(Cursor::new(bytes), 1.0e6, bands).unwrap();

		let w = src.read(2, 3).unwrap();
		assert_eq!(w.band(Band::GpsL1).unwrap().samples, vec![4, 6, 8]);
		assert_eq!(w.band(Band::GpsL2).unwrap().samples, vec![-5, -7, -9]);
		assert_eq!(w.band(Band::GpsL2).unwrap().intermediate_freq_hz, 2.0e3);

		let tail = src.read(18, 10).unwrap();
		assert_eq!(tail.len(), 2);
		assert!(matches!(src.read(20, 1), Err(DigSigProcErr::EndOfStream)));
	}

}
