
use crate::gnss::constants::gps::MS_PER_BIT;

const BINS:usize = MS_PER_BIT as usize;

/// Finds the 20 ms navigation bit edge from the sign of consecutive 1 ms prompt sums
#[derive(Debug, Clone)]
pub struct BitSync {
	histogram:[u32; BINS],
	last_sign:Option<bool>,
	min_count:u32,
	ratio:f64,
	bit_ref:Option<usize>,
}

impl BitSync {

	pub fn new(min_count:u32, ratio:f64) -> Self {
		Self{ histogram: [0; BINS], last_sign: None, min_count, ratio, bit_ref: None }
	}

	/// Bit phase once known: a bit begins at every code millisecond `m` with `m % 20 == bit_ref`
	pub fn bit_ref(&self) -> Option<usize> { self.bit_ref }

	pub fn histogram(&self) -> &[u32; BINS] { &self.histogram }

	/// Marks the bit phase as known without looking at the signal
	pub fn force(&mut self, bit_ref:usize) { self.bit_ref = Some(bit_ref % BINS); }

	/// Feeds the in-phase prompt sum of code millisecond `ms_index`.  Sign changes only count
	/// while the optimistic lock indicator holds.  Returns the bit phase when it is first declared.
	pub fn update(&mut self, ms_index:u64, prompt_i:f64, locked:bool) -> Option<usize> {
		if self.bit_ref.is_some() { return None; }

		let sign:bool = prompt_i >= 0.0;
		if let Some(last) = self.last_sign {
			if locked && last != sign {
				self.histogram[(ms_index % MS_PER_BIT) as usize] += 1;
			}
		}
		self.last_sign = Some(sign);

		// Ties leave the earlier bin as best and the later one as second
		let (mut best_bin, mut best, mut second) = (0usize, 0u32, 0u32);
		for (bin, count) in self.histogram.iter().enumerate() {
			if *count > best {
				second = best;
				best = *count;
				best_bin = bin;
			} else if *count > second {
				second = *count;
			}
		}
		if best > self.min_count && (best as f64) > self.ratio * (second as f64) {
			self.bit_ref = Some(best_bin);
			self.bit_ref
		} else { None }
	}

}

#[cfg(test)]
mod tests {

	use rand::{Rng, SeedableRng};
	use rand::rngs::StdRng;
	use rand_distr::{Distribution, Normal};

	use super::*;

	#[test]
	fn declares_edge_from_noisy_bits() {
		let mut rng = StdRng::seed_from_u64(21);
		let noise = Normal::new(0.0, 0.3).unwrap();
		let mut sync = BitSync::new(20, 4.0);
		let mut bit:f64 = 1.0;
		let mut found = None;
		for ms in 0..20_000u64 {
			if ms % 20 == 7 && rng.gen::<bool>() { bit = -bit; }
			if let Some(r) = sync.update(ms, bit + noise.sample(&mut rng), true) {
				found = Some(r);
				break;
			}
		}
		assert_eq!(found, Some(7));
		assert_eq!(sync.bit_ref(), Some(7));
		assert!(sync.update(20_001, -1.0, true).is_none());
	}

	#[test]
	fn ignores_transitions_without_lock() {
		let mut sync = BitSync::new(20, 4.0);
		for ms in 0..2000u64 {
			let v = if (ms / 20) % 2 == 0 { 1.0 } else { -1.0 };
			assert!(sync.update(ms, v, false).is_none());
		}
		assert!(sync.histogram().iter().all(|c| *c == 0));
	}

	#[test]
	fn tied_bins_block_the_decision() {
		let mut sync = BitSync::new(20, 4.0);
		// Sign flips at ms phases 3 and 13 in equal numbers
		let mut v:f64 = 1.0;
		for ms in 0..4000u64 {
			if ms % 10 == 3 { v = -v; }
			assert!(sync.update(ms, v, true).is_none());
		}
		assert_eq!(sync.histogram()[3], sync.histogram()[13]);
		assert!(sync.histogram()[3] > 20);
	}

	#[test]
	fn needs_clear_winner() {
		let mut sync = BitSync::new(20, 4.0);
		// Alternating every millisecond spreads the changes over all bins
		for ms in 0..2000u64 {
			let v = if ms % 2 == 0 { 1.0 } else { -1.0 };
			assert!(sync.update(ms, v, true).is_none());
		}
		assert_eq!(sync.bit_ref(), None);
	}

}
