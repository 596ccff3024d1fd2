
use crate::DigSigProcErr;
use crate::gnss::constants::gps::CA_CODE_LENGTH;
use crate::gnss::signal::SignalKind;

// G2 delay in chips for PRN 1 through 32 (IS-GPS-200 Table 3-Ia)
pub const G2_DELAY:[usize; 32] = [
	  5,   6,   7,   8,  17,  18, 139, 140, 141, 251,
	252, 254, 255, 256, 257, 258, 469, 470, 471, 472,
	473, 474, 509, 512, 513, 514, 515, 516, 859, 860,
	861, 862,
];

/// Index offset into the G2 sequence for a PRN, so that chip i of the code uses g2[(i + shift) mod 1023]
pub fn g2_shift(prn:usize) -> Result<usize, DigSigProcErr> {
	if prn < 1 || prn > 32 { return Err(DigSigProcErr::UnsupportedPrn{ prn, signal: SignalKind::GpsL1Ca }); }
	Ok(CA_CODE_LENGTH - G2_DELAY[prn-1])
}

// Registers hold +/-1 with logic one represented as -1, so XOR becomes multiplication
fn lfsr_sequence(taps:&[usize]) -> Vec<i8> {
	let mut reg:[i8; 10] = [-1; 10];
	(0..CA_CODE_LENGTH).map(|_| {
		let out:i8 = reg[9];
		let feedback:i8 = taps.iter().map(|t| reg[t-1]).product();
		for idx in (1..10).rev() { reg[idx] = reg[idx-1]; }
		reg[0] = feedback;
		out
	}).collect()
}

/// C/A Gold code as +/-1 chips where +1 is a logic one
pub fn ca_code(prn:usize) -> Result<Vec<i8>, DigSigProcErr> {
	let shift:usize = g2_shift(prn)?;
	let g1 = lfsr_sequence(&[3, 10]);
	let g2 = lfsr_sequence(&[2, 3, 6, 8, 9, 10]);
	Ok((0..CA_CODE_LENGTH).map(|i| -g1[i] * g2[(i + shift) % CA_CODE_LENGTH]).collect())
}
