
#![allow(non_snake_case)]

use crate::DigSigProcErr;
use crate::gnss::telemetry_decode::{DATA_BITS_PER_WORD, SUBFRAME_BITS, SUBFRAME_DATA_BITS, WORD_BITS};

/// Parity bits D25..D30 of a word whose source data bits are `d`, given the last two
/// transmitted bits of the previous word
pub fn parity_bits(d:&[bool], last_D29:bool, last_D30:bool) -> [bool; 6] {
	[
		last_D29 ^ d[0] ^ d[1] ^ d[2] ^ d[4] ^ d[5] ^ d[9]  ^ d[10] ^ d[11] ^ d[12] ^ d[13] ^ d[16] ^ d[17] ^ d[19] ^ d[22],
		last_D30 ^ d[1] ^ d[2] ^ d[3] ^ d[5] ^ d[6] ^ d[10] ^ d[11] ^ d[12] ^ d[13] ^ d[14] ^ d[17] ^ d[18] ^ d[20] ^ d[23],
		last_D29 ^ d[0] ^ d[2] ^ d[3] ^ d[4] ^ d[6] ^ d[7]  ^ d[11] ^ d[12] ^ d[13] ^ d[14] ^ d[15] ^ d[18] ^ d[19] ^ d[21],
		last_D30 ^ d[1] ^ d[3] ^ d[4] ^ d[5] ^ d[7] ^ d[8]  ^ d[12] ^ d[13] ^ d[14] ^ d[15] ^ d[16] ^ d[19] ^ d[20] ^ d[22],
		last_D30 ^ d[0] ^ d[2] ^ d[4] ^ d[5] ^ d[6] ^ d[8]  ^ d[9]  ^ d[13] ^ d[14] ^ d[15] ^ d[16] ^ d[17] ^ d[20] ^ d[21] ^ d[23],
		last_D29 ^ d[2] ^ d[4] ^ d[5] ^ d[7] ^ d[8] ^ d[9]  ^ d[10] ^ d[12] ^ d[14] ^ d[18] ^ d[21] ^ d[22] ^ d[23],
	]
}

/// Checks a transmitted 30-bit word.  Bits arriving with inverted polarity pass as well, since
/// the previous word's bits are inverted along with them.
pub fn parity_check(word:&[bool], last_D29:bool, last_D30:bool) -> bool {
	if word.len() != WORD_BITS { return false; }
	let d:Vec<bool> = word.iter().take(DATA_BITS_PER_WORD).map(|b| b ^ last_D30).collect();
	let parity = parity_bits(&d, last_D29, last_D30);
	word[DATA_BITS_PER_WORD..].iter().zip(parity.iter()).all(|(a, b)| a == b)
}

/// Transmitted word for 24 source data bits: the data inverted when D30* is set, then parity
pub fn add_parity(data:&[bool], last_D29:bool, last_D30:bool) -> [bool; WORD_BITS] {
	let mut word = [false; WORD_BITS];
	for (w, d) in word.iter_mut().zip(data.iter().take(DATA_BITS_PER_WORD)) { *w = d ^ last_D30; }
	let parity = parity_bits(data, last_D29, last_D30);
	word[DATA_BITS_PER_WORD..].copy_from_slice(&parity);
	word
}

/// Source data of a subframe, after checking all ten words.  `last_D29` and `last_D30` are the two
/// bits received before the subframe.
pub fn recover_data(subframe:&[bool], last_D29:bool, last_D30:bool) -> Result<[bool; SUBFRAME_DATA_BITS], DigSigProcErr> {
	if subframe.len() != SUBFRAME_BITS { return Err(DigSigProcErr::InvalidTelemetryData("subframe must hold 300 bits")); }
	let mut ans = [false; SUBFRAME_DATA_BITS];
	let (mut d29, mut d30) = (last_D29, last_D30);
	for (word_idx, word) in subframe.chunks(WORD_BITS).enumerate() {
		if !parity_check(word, d29, d30) { return Err(DigSigProcErr::InvalidTelemetryData("subframe parity failure")); }
		for bit_idx in 0..DATA_BITS_PER_WORD {
			ans[word_idx*DATA_BITS_PER_WORD + bit_idx] = word[bit_idx] ^ d30;
		}
		d29 = word[28];
		d30 = word[29];
	}
	Ok(ans)
}

/// Transmitted subframe for 240 source data bits.  The last two data bits of the HOW and of word
/// 10 are chosen so those words end in zeros, as the signal does.
pub fn encode_subframe(data:&[bool], last_D29:bool, last_D30:bool) -> Result<[bool; SUBFRAME_BITS], DigSigProcErr> {
	if data.len() != SUBFRAME_DATA_BITS { return Err(DigSigProcErr::InvalidTelemetryData("subframe data must hold 240 bits")); }
	let mut ans = [false; SUBFRAME_BITS];
	let (mut d29, mut d30) = (last_D29, last_D30);
	for word_idx in 0..10 {
		let mut src:Vec<bool> = data[word_idx*DATA_BITS_PER_WORD..(word_idx+1)*DATA_BITS_PER_WORD].to_vec();
		let mut word = add_parity(&src, d29, d30);
		if word_idx == 1 || word_idx == 9 {
			for t in 0..4 {
				src[22] = t & 2 != 0;
				src[23] = t & 1 != 0;
				word = add_parity(&src, d29, d30);
				if !word[28] && !word[29] { break; }
			}
		}
		ans[word_idx*WORD_BITS..(word_idx+1)*WORD_BITS].copy_from_slice(&word);
		d29 = word[28];
		d30 = word[29];
	}
	Ok(ans)
}

#[cfg(test)]
mod tests {

	use rand::{Rng, SeedableRng};
	use rand::rngs::StdRng;

	use super::*;

	#[test]
	fn parity_of_encoded_word_checks() {
		let mut rng = StdRng::seed_from_u64(4);
		for _ in 0..200 {
			let data:Vec<bool> = (0..24).map(|_| rng.gen::<bool>()).collect();
			let (d29, d30) = (rng.gen::<bool>(), rng.gen::<bool>());
			let word = add_parity(&data, d29, d30);
			assert!(parity_check(&word, d29, d30));

			// Any single bit error is caught
			let flip = rng.gen_range(0, 30);
			let mut bad = word;
			bad[flip] = !bad[flip];
			assert!(!parity_check(&bad, d29, d30));
		}
	}

	#[test]
	fn inverted_polarity_passes_parity() {
		let data:Vec<bool> = (0..24).map(|i| i % 3 == 0).collect();
		let word = add_parity(&data, false, true);
		let inverted:Vec<bool> = word.iter().map(|b| !b).collect();
		assert!(parity_check(&inverted, true, false));
	}

	#[test]
	fn subframe_round_trip() {
		let mut rng = StdRng::seed_from_u64(9);
		let data:Vec<bool> = (0..240).map(|_| rng.gen::<bool>()).collect();
		let encoded = encode_subframe(&data, false, false).unwrap();
		assert!(!encoded[58] && !encoded[59]);
		assert!(!encoded[298] && !encoded[299]);
		let decoded = recover_data(&encoded, false, false).unwrap();
		for idx in 0..240 {
			// The HOW and word 10 trailing bits are overwritten by the encoder
			if idx == 46 || idx == 47 || idx == 238 || idx == 239 { continue; }
			assert_eq!(decoded[idx], data[idx], "bit {}", idx);
		}

		let inverted:Vec<bool> = encoded.iter().map(|b| !b).collect();
		assert_eq!(recover_data(&inverted, true, true).unwrap()[..46], decoded[..46]);

		let mut corrupted = encoded;
		corrupted[150] = !corrupted[150];
		assert!(recover_data(&corrupted, false, false).is_err());
	}

}
