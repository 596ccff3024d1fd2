
use crate::gnss::constants::glonass::CODE_LENGTH;

/// GLONASS ranging code shared by every satellite: a 511-chip maximal-length sequence from the
/// 9-stage register 1 + x^5 + x^9, initialized all ones and read from the 7th stage
pub fn st_code() -> Vec<i8> {
	let mut reg:[bool; 9] = [true; 9];
	(0..CODE_LENGTH).map(|_| {
		let out:bool = reg[6];
		let feedback:bool = reg[4] ^ reg[8];
		for idx in (1..9).rev() { reg[idx] = reg[idx-1]; }
		reg[0] = feedback;
		if out { 1 } else { -1 }
	}).collect()
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn maximal_length_properties() {
		let code = st_code();
		assert_eq!(code.len(), 511);

		// 256 ones and 255 zeros
		let sum:i32 = code.iter().map(|c| *c as i32).sum();
		assert_eq!(sum, 1);

		// Two-valued periodic autocorrelation
		for lag in 1..511 {
			let auto:i32 = (0..511).map(|i| (code[i] as i32) * (code[(i + lag) % 511] as i32)).sum();
			assert_eq!(auto, -1, "lag {}", lag);
		}
	}

}
