
use crate::DigSigProcErr;
use crate::gnss::signal::SignalKind;

// Per-PRN initial states of the 27-stage CM code generator, stage 1 first (IS-GPS-200 Table 3-IIa)
pub const CM_INITIAL_STATE:[[bool; 27]; 32] = [
	[true,  true,  true,  true,  false, false, false, true,  false, true,  false, false, false, false, true,  true,  true,  true,  true,  true,  false, true,  true,  false, true,  false, false ],	// PRN 01
	[true,  true,  true,  true,  false, true,  true,  true,  false, false, false, false, false, false, true,  true,  false, false, false, false, false, false, true,  true,  true,  false, true  ],	// PRN 02
	[false, false, false, false, false, false, false, true,  false, true,  true,  true,  true,  false, false, true,  true,  true,  false, false, true,  true,  false, false, true,  false, false ],	// PRN 03
	[false, false, false, true,  true,  false, true,  true,  false, false, true,  false, true,  true,  false, true,  false, true,  true,  true,  true,  false, true,  false, true,  false, false ],	// PRN 04
	[true,  true,  false, false, false, false, false, false, true,  true,  false, false, false, false, false, false, true,  true,  true,  false, false, true,  true,  true,  false, false, true  ],	// PRN 05
	[true,  true,  true,  false, false, false, false, true,  true,  false, true,  false, false, true,  true,  false, true,  false, true,  true,  true,  false, true,  true,  false, true,  true  ],	// PRN 06
	[false, false, true,  false, true,  false, true,  false, false, true,  false, true,  false, false, true,  false, false, false, false, false, false, true,  true,  true,  false, false, false ],	// PRN 07
	[true,  true,  false, false, false, true,  true,  true,  true,  false, true,  true,  false, false, true,  true,  true,  false, false, true,  true,  true,  true,  false, false, false, true  ],	// PRN 08
	[false, false, false, true,  false, false, true,  true,  true,  true,  false, true,  true,  false, false, false, false, true,  true,  true,  false, false, true,  false, false, false, true  ],	// PRN 09
	[true,  true,  true,  false, true,  true,  false, true,  true,  false, false, false, false, true,  true,  false, false, true,  false, false, false, true,  false, false, true,  true,  false ],	// PRN 10
	[true,  true,  true,  false, false, true,  false, true,  true,  true,  false, true,  false, false, true,  false, true,  false, false, false, true,  true,  false, false, true,  false, true  ],	// PRN 11
	[false, false, false, false, true,  false, true,  false, false, true,  false, false, false, true,  true,  true,  true,  true,  true,  true,  false, false, false, false, true,  true,  false ],	// PRN 12
	[false, false, false, false, true,  false, false, false, true,  false, true,  false, true,  true,  false, true,  false, false, false, false, false, false, false, false, false, true,  true  ],	// PRN 13
	[false, true,  false, false, true,  true,  false, false, false, true,  true,  false, true,  false, true,  true,  false, true,  false, true,  true,  true,  false, true,  false, false, true  ],	// PRN 14
	[false, false, false, false, false, false, false, false, true,  false, true,  true,  false, false, true,  true,  false, false, true,  false, false, false, false, false, false, false, false ],	// PRN 15
	[false, true,  false, false, true,  false, false, true,  false, false, false, false, false, true,  false, false, false, true,  true,  false, true,  false, false, false, true,  true,  false ],	// PRN 16
	[true,  false, true,  true,  false, false, false, false, false, false, true,  false, true,  true,  false, true,  false, false, false, false, false, false, true,  false, true,  true,  false ],	// PRN 17
	[false, true,  false, false, false, false, true,  false, true,  true,  false, true,  false, true,  false, false, false, true,  true,  true,  true,  false, false, false, true,  false, true  ],	// PRN 18
	[false, false, false, true,  true,  false, true,  false, false, false, false, false, false, true,  false, false, true,  false, false, false, true,  true,  false, false, true,  false, false ],	// PRN 19
	[false, false, true,  false, true,  false, false, false, false, false, false, true,  true,  true,  false, false, false, true,  false, true,  false, true,  true,  true,  true,  false, false ],	// PRN 20
	[false, false, false, true,  false, false, true,  false, false, false, false, false, false, true,  false, false, true,  true,  true,  false, true,  false, true,  true,  false, true,  true  ],	// PRN 21
	[true,  true,  true,  false, true,  false, true,  false, false, true,  true,  true,  true,  false, false, true,  false, false, false, true,  true,  false, true,  false, true,  true,  true  ],	// PRN 22
	[false, false, false, true,  false, false, true,  false, true,  true,  true,  true,  true,  false, false, false, true,  true,  true,  false, true,  true,  true,  true,  true,  true,  true  ],	// PRN 23
	[true,  true,  true,  true,  false, false, false, false, true,  false, true,  false, false, false, false, false, false, true,  true,  true,  false, true,  true,  false, false, false, false ],	// PRN 24
	[true,  true,  true,  false, false, false, false, false, false, false, true,  false, true,  true,  true,  true,  false, false, false, false, true,  false, true,  true,  true,  false, false ],	// PRN 25
	[false, false, false, false, false, true,  false, false, false, false, true,  false, true,  false, false, true,  true,  true,  false, true,  false, true,  true,  false, false, false, true  ],	// PRN 26
	[true,  true,  true,  false, false, true,  false, true,  true,  true,  false, false, false, true,  true,  false, true,  true,  true,  false, false, true,  false, false, true,  false, true  ],	// PRN 27
	[true,  true,  true,  false, true,  true,  true,  true,  true,  false, true,  true,  false, true,  false, true,  false, false, false, false, true,  true,  true,  false, false, true,  false ],	// PRN 28
	[false, true,  true,  false, false, true,  false, false, true,  true,  true,  false, false, true,  false, true,  true,  true,  true,  false, false, false, true,  true,  true,  false, false ],	// PRN 29
	[true,  true,  true,  false, false, true,  false, false, false, true,  false, false, true,  false, true,  false, true,  false, false, false, false, false, false, false, true,  true,  true  ],	// PRN 30
	[true,  true,  true,  false, true,  false, false, true,  false, true,  false, false, true,  true,  false, false, true,  false, false, false, true,  false, true,  true,  false, true,  true  ],	// PRN 31
	[false, false, false, true,  false, true,  false, false, false, false, false, true,  true,  true,  true,  false, true,  false, false, true,  false, false, false, true,  false, true,  true  ]	// PRN 32
	];


/// Modular (Galois) form of the CM generator polynomial
/// 1 + x^3 + x^4 + x^5 + x^6 + x^9 + x^11 + x^13 + x^16 + x^19 + x^21 + x^24 + x^27
pub struct ModularShiftRegister {
	pub state: [bool; 27],
}

impl ModularShiftRegister {

	pub fn new(initial_state:[bool; 27]) -> Self { Self{ state: initial_state } }

	pub fn shift(&mut self) -> bool {
		let out:bool = self.state[26];
		for idx in (1..27).rev() {
			self.state[idx] = self.state[idx-1] ^ (out && FEEDBACK_TAPS[idx]);
		}
		self.state[0] = out;
		out
	}

}

// Stages whose input is XOR'ed with the register output
const FEEDBACK_TAPS:[bool; 27] = [false, false, false, true, false, false, true, false, true, false, false, true, false, false, true, false, true, false, true, false, false, true, true, true, true, false, false];

/// Logic-level CM code; the register is stepped 10230 times from the PRN's initial state
pub fn cm_code_bits(prn:usize) -> Result<Vec<bool>, DigSigProcErr> {
	if prn < 1 || prn > 32 { return Err(DigSigProcErr::UnsupportedPrn{ prn, signal: SignalKind::GpsL2Cm }); }
	let mut shift_reg = ModularShiftRegister::new(CM_INITIAL_STATE[prn-1]);
	Ok((0..SignalKind::GpsL2Cm.code_length()).map(|_| shift_reg.shift()).collect())
}

/// CM chips as +/-1; a logic one maps to +1
pub fn cm_code(prn:usize) -> Result<Vec<i8>, DigSigProcErr> {
	Ok(cm_code_bits(prn)?.into_iter().map(|b| if b { 1 } else { -1 }).collect())
}

#[cfg(test)]
mod tests {

	use super::*;

	// Register contents just before the 10230th shift (IS-GPS-200 Table 3-IIa, end states)
	#[rustfmt::skip]
	const CM_FINAL_STATE:[[bool; 27]; 32] = [
		[true, false, true, true, false, true, false, true, false, true, false, true, true, true, false, true, true, false, false, false, false,  false, false, false,  false, true, false, ],		// PRN 01
		[false, false, false,  false, true, true, true, false, false, true, false, false, true, false, false, true, false, true, false, false, false,  false, true, true, true, false, false, ],		// PRN 02
		[true, true, true, false, true, false, false, true, true, true, false, false, true, false, false, false, true, true, true, true, true, false, false, true, false, false, true, ],		// PRN 03
		[true, false, true, false, false, true, false, false, true, false, true, false, false, true, false, false, true, false, false, false, false,  false, false, true, false, true, true, ],		// PRN 04
		[true, false, false, true, true, false, false, true, true, false, false, false,  true, false, true, true, false, true, false, true, false, false, false, true, false, true, true, ],		// PRN 05
		[true, true, false, true, true, false, true, true, true, false, false, false,  true, false, false, true, false, false, true, false, true, false, true, false, true, false, false, ],		// PRN 06
		[true, true, false, true, false, true, false, true, false, false, true, true, false, true, false, false, true, false, true, true, false, true, false, true, false, true, true, ],		// PRN 07
		[true, false, true, false, false, false,  true, false, true, true, true, true, false, false, false,  false, true, true, false, true, true, true, false, false, true, false, false, ],		// PRN 08
		[true, false, true, false, true, false, false, false, false,  false, true, true, false, false, false,  false, true, false, true, true, true, true, true, true, true, false, true, ],		// PRN 09
		[false, true, false, true, false, false, true, false, false, false, true, false, false, false, false,  true, false, true, true, false, true, false, false, false,  true, true, false, ],		// PRN 10
		[false, true, false, false, true, true, true, true, false, false, false, true, true, true, true, true, false, false, false, false, false,  false, false, false,  false, true, false, ],		// PRN 11
		[true, true, false, true, false, true, true, false, false, false, true, true, false, false, false,  true, false, true, true, false, true, false, true, true, false, false, true, ],		// PRN 12
		[true, false, false, false, true, true, true, false, true, false, false, false,  true, true, true, false, false, false,  true, false, true, true, true, true, false, false, true, ],		// PRN 13
		[true, true, false, false, true, true, false, false, false,  true, false, false, false, true, true, false, false, true, false, true, false, true, false, true, false, false, true, ],		// PRN 14
		[false, true, false, false, true, true, true, false, false, false, false, false,  true, false, false, false, true, true, true, false, false, false, false, true, true, true, true, ],		// PRN 15
		[true, false, true, false, true, true, true, false, true, true, false, true, true, false, false, false, false, false,  true, true, true, true, false, false, true, false, true, ],		// PRN 16
		[false, false, false,  true, false, false, false, true, true, false, false, false,  true, false, true, true, true, false, true, true, true, false, true, true, true, false, false, ],		// PRN 17
		[true, true, true, false, true, true, false, false, true, false, true, true, false, false, false,  true, false, false, false, false, true, false, false, false,  false, true, true, ],		// PRN 18
		[true, false, false, false, false, true, false, true, false, false, false, true, false, true, false, false, false, false,  false, false, true, false, false, false,  true, false, true, ],		// PRN 19
		[false, true, true, true, true, false, true, false, true, true, true, false, false, true, true, true, true, false, false, false, true, false, false, true, false, false, true, ],		// PRN 20
		[false, false, true, true, false, false, false, true, true, false, true, true, false, true, false, true, false, false, true, true, false, true, false, true, true, true, true, ],		// PRN 21
		[false, false, true, false, false, true, false, false, false,  true, true, true, true, true, false, true, true, false, true, false, false, true, true, false, false, true, false, ],		// PRN 22
		[true, true, false, false, false, false,  false, true, false, true, false, false, false, false, false,  true, false, true, false, true, false, false, false, false,  false, true, true, ],		// PRN 23
		[false, false, true, true, true, true, true, true, true, true, true, true, false, true, true, true, false, true, true, true, false, true, false, true, false, false, false,  ],		// PRN 24
		[true, true, false, false, true, true, false, false, false,  false, false, true, true, true, true, true, true, true, true, false, true, true, true, false, false, false, false,  ],		// PRN 25
		[true, true, false, true, false, true, false, true, true, true, false, false, true, true, false, true, true, true, false, false, true, false, false, false,  true, true, true, ],		// PRN 26
		[true, false, false, false, false, false,  true, true, false, true, false, true, true, true, true, true, true, false, true, true, false, false, true, true, false, false, false,  ],		// PRN 27
		[false, true, false, false, true, false, false, false, true, true, true, true, true, true, true, true, true, true, false, false, true, false, false, false,  false, false, false,  ],		// PRN 28
		[true, true, true, true, true, true, false, true, true, false, true, false, true, true, false, true, true, false, true, true, false, true, true, true, false, true, true, ],		// PRN 29
		[false, false, true, false, false, false,  false, false, false,  false, false, false,  false, false, true, false, false, false,  true, true, true, false, false, true, false, false, false,  ],		// PRN 30
		[true, false, false, false, true, true, false, false, true, false, false, false,  false, true, true, true, true, true, false, false, true, false, true, true, false, true, false, ],		// PRN 31
		[true, true, false, false, true, false, true, false, false, false, false, true, false, true, false, true, true, true, true, false, false, true, true, true, true, false, true, ]			// PRN 32
	];

	#[test]
	fn end_states_match_table() {
		for prn in 1..=32 {
			let mut shift_reg = ModularShiftRegister::new(CM_INITIAL_STATE[prn-1]);
			for _ in 0..10229 { shift_reg.shift(); }
			assert_eq!(shift_reg.state, CM_FINAL_STATE[prn-1], "PRN {}", prn);
		}
	}

	#[test]
	fn code_is_full_length_and_nearly_balanced() {
		let code = cm_code(1).unwrap();
		assert_eq!(code.len(), 10230);
		let sum:i32 = code.iter().map(|c| *c as i32).sum();
		assert!(sum.abs() < 500);
	}

	#[test]
	fn rejects_out_of_range_prn() {
		assert!(matches!(cm_code(0), Err(DigSigProcErr::UnsupportedPrn{ prn: 0, .. })));
		assert!(matches!(cm_code(33), Err(DigSigProcErr::UnsupportedPrn{ prn: 33, .. })));
	}

}
