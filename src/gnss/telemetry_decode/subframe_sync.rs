
use std::collections::VecDeque;

use log::{info, warn};

use crate::gnss::telemetry_decode::{parity, PREAMBLE, SUBFRAME_BITS, SUBFRAME_DATA_BITS, WORD_BITS};
use crate::utils::bools_to_int;

// The two bits before a subframe plus the subframe itself
const HISTORY:usize = SUBFRAME_BITS + 2;
// D29*, D30*, TLM and HOW
const SYNC_WINDOW:usize = 2 + 2*WORD_BITS;

const MAX_TOW_COUNT:u64 = 100800;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
	/// TLM and HOW have been found.  `tow_s` is the GPS time of week at the start of the subframe
	/// beginning with bit `start_bit`.
	Synced{ start_bit:u64, subframe_id:u8, tow_s:f64 },
	Subframe{ start_bit:u64, data:[bool; SUBFRAME_DATA_BITS] },
	ParityFailure{ start_bit:u64 },
}

/// Tracks subframe boundaries in a stream of navigation bits.  Bits are counted from zero in the
/// order they are pushed.
#[derive(Debug, Clone)]
pub struct SubframeSync {
	prn:usize,
	bits:VecDeque<bool>,
	total:u64,
	next_start:Option<u64>,
	last_tow_s:Option<f64>,
}

impl SubframeSync {

	pub fn new(prn:usize) -> Self {
		Self{ prn, bits: VecDeque::with_capacity(HISTORY + 1), total: 0, next_start: None, last_tow_s: None }
	}

	pub fn last_tow_s(&self) -> Option<f64> { self.last_tow_s }

	pub fn push(&mut self, bit:bool) -> Option<SyncEvent> {
		self.bits.push_back(bit);
		if self.bits.len() > HISTORY { self.bits.pop_front(); }
		self.total += 1;

		match self.next_start {
			None => self.search(),
			Some(start) if self.total == start + (SUBFRAME_BITS as u64) => {
				let recent:&[bool] = self.bits.make_contiguous();
				match parity::recover_data(&recent[2..], recent[0], recent[1]) {
					Ok(data) => {
						self.next_start = Some(start + (SUBFRAME_BITS as u64));
						let tow_count:u64 = bools_to_int::to_u64(&data[24..41]).unwrap_or(0);
						self.last_tow_s = Some((tow_count as f64) * 6.0 - 6.0);
						Some(SyncEvent::Subframe{ start_bit: start, data })
					},
					Err(_) => {
						warn!("PRN {}: parity failure in subframe starting at bit {}", self.prn, start);
						self.next_start = None;
						Some(SyncEvent::ParityFailure{ start_bit: start })
					}
				}
			},
			Some(_) => None,
		}
	}

	fn search(&mut self) -> Option<SyncEvent> {
		if self.bits.len() < SYNC_WINDOW { return None; }
		let len = self.bits.len();
		let w:&[bool] = &self.bits.make_contiguous()[len - SYNC_WINDOW..];

		let upright:bool = w[2..10].iter().zip(PREAMBLE.iter()).all(|(a, b)| a == b);
		let inverted:bool = w[2..10].iter().zip(PREAMBLE.iter()).all(|(a, b)| a != b);
		if !(upright || inverted) { return None; }

		let (tlm, how) = (&w[2..32], &w[32..62]);
		if !parity::parity_check(tlm, w[0], w[1]) || !parity::parity_check(how, tlm[28], tlm[29]) { return None; }

		// HOW source data bits
		let how_data:Vec<bool> = how[..24].iter().map(|b| b ^ tlm[29]).collect();
		let tow_count:u64 = bools_to_int::to_u64(&how_data[0..17]).unwrap_or(MAX_TOW_COUNT);
		let subframe_id:u8 = bools_to_int::to_u8(&how_data[19..22]).unwrap_or(0);
		if tow_count >= MAX_TOW_COUNT || !(1..=5).contains(&subframe_id) { return None; }

		let start_bit:u64 = self.total - (SYNC_WINDOW as u64) + 2;
		let tow_s:f64 = (tow_count as f64) * 6.0 - 6.0;
		self.next_start = Some(start_bit);
		self.last_tow_s = Some(tow_s);
		info!("PRN {}: subframe sync at bit {}, subframe {}, TOW {} s{}", self.prn, start_bit, subframe_id, tow_s,
			if inverted { " (inverted)" } else { "" });
		Some(SyncEvent::Synced{ start_bit, subframe_id, tow_s })
	}

}

#[cfg(test)]
mod tests {

	use rand::{Rng, SeedableRng};
	use rand::rngs::StdRng;

	use super::*;
	use crate::gnss::telemetry_decode::parity::encode_subframe;
	use crate::utils::bools_to_int::write_bits;

	// Source data of a subframe with the given TOW count and subframe id, random elsewhere
	fn source_data(rng:&mut StdRng, tow_count:u64, subframe_id:u64) -> Vec<bool> {
		let mut data:Vec<bool> = (0..240).map(|_| rng.gen::<bool>()).collect();
		data[0..8].copy_from_slice(&PREAMBLE);
		write_bits(&mut data[24..41], tow_count as i64);
		write_bits(&mut data[43..46], subframe_id as i64);
		data
	}

	fn stream(rng:&mut StdRng, first_tow:u64, n_subframes:u64) -> (Vec<bool>, Vec<Vec<bool>>) {
		let mut bits:Vec<bool> = (0..37).map(|_| rng.gen::<bool>()).collect();
		// Bits before a subframe end in 00 like word 10 does
		bits.push(false);
		bits.push(false);
		let mut sources = vec![];
		for k in 0..n_subframes {
			let src = source_data(rng, first_tow + k, (k % 5) + 1);
			let encoded = encode_subframe(&src, false, false).unwrap();
			bits.extend_from_slice(&encoded);
			sources.push(src);
		}
		(bits, sources)
	}

	fn run(sync:&mut SubframeSync, bits:&[bool]) -> Vec<SyncEvent> {
		bits.iter().filter_map(|b| sync.push(*b)).collect()
	}

	#[test]
	fn finds_subframes_and_recovers_data() {
		let mut rng = StdRng::seed_from_u64(13);
		let (bits, sources) = stream(&mut rng, 1000, 3);
		let mut sync = SubframeSync::new(5);
		let events = run(&mut sync, &bits);

		assert_eq!(events[0], SyncEvent::Synced{ start_bit: 39, subframe_id: 1, tow_s: 5994.0 });
		let decoded:Vec<(u64, [bool; 240])> = events.iter().filter_map(|e| match e {
			SyncEvent::Subframe{ start_bit, data } => Some((*start_bit, *data)),
			_ => None,
		}).collect();
		assert_eq!(decoded.len(), 3);
		for (k, (start, data)) in decoded.iter().enumerate() {
			assert_eq!(*start, 39 + 300 * (k as u64));
			assert_eq!(data[..46], sources[k][..46]);
			assert_eq!(data[48..238], sources[k][48..238]);
		}
		assert_eq!(sync.last_tow_s(), Some(1002.0 * 6.0 - 6.0));
	}

	#[test]
	fn inverted_stream_syncs() {
		let mut rng = StdRng::seed_from_u64(14);
		let (bits, sources) = stream(&mut rng, 200, 2);
		let inverted:Vec<bool> = bits.iter().map(|b| !b).collect();
		let mut sync = SubframeSync::new(5);
		let events = run(&mut sync, &inverted);
		assert!(matches!(events[0], SyncEvent::Synced{ start_bit: 39, .. }));
		match &events[1] {
			SyncEvent::Subframe{ data, .. } => assert_eq!(data[48..238], sources[0][48..238]),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn corrupted_subframe_drops_sync() {
		let mut rng = StdRng::seed_from_u64(15);
		let (mut bits, _) = stream(&mut rng, 300, 2);
		bits[39 + 300 + 150] ^= true;
		let mut sync = SubframeSync::new(5);
		let events = run(&mut sync, &bits);
		assert!(events.contains(&SyncEvent::ParityFailure{ start_bit: 339 }));
		assert!(matches!(events[1], SyncEvent::Subframe{ start_bit: 39, .. }));
	}

	#[test]
	fn random_bits_rarely_sync() {
		let mut rng = StdRng::seed_from_u64(16);
		let bits:Vec<bool> = (0..3000).map(|_| rng.gen::<bool>()).collect();
		let mut sync = SubframeSync::new(5);
		let events = run(&mut sync, &bits);
		// A false lock needs 8 preamble bits and 12 parity bits by chance
		assert!(events.iter().filter(|e| matches!(e, SyncEvent::Synced{ .. })).count() <= 1);
	}

}
