
use crate::DigSigProcErr;

pub fn to_u64(bools:&[bool]) -> Result<u64, DigSigProcErr> {
	if bools.len() <= 64 {
		Ok(bools.iter().fold(0u64, |acc, b| (acc << 1) | (*b as u64)))
	} else {
		Err(DigSigProcErr::InvalidTelemetryData("x.len() > 64 in bools_to_int::to_u64"))
	}
}

pub fn to_u8(bools:&[bool]) -> Result<u8, DigSigProcErr> {
	if bools.len() <= 8 { Ok(to_u64(bools)? as u8) }
	else { Err(DigSigProcErr::InvalidTelemetryData("x.len() > 8 in bools_to_int::to_u8")) }
}

pub fn to_u16(bools:&[bool]) -> Result<u16, DigSigProcErr> {
	if bools.len() <= 16 { Ok(to_u64(bools)? as u16) }
	else { Err(DigSigProcErr::InvalidTelemetryData("x.len() > 16 in bools_to_int::to_u16")) }
}

pub fn to_u32(bools:&[bool]) -> Result<u32, DigSigProcErr> {
	if bools.len() <= 32 { Ok(to_u64(bools)? as u32) }
	else { Err(DigSigProcErr::InvalidTelemetryData("x.len() > 32 in bools_to_int::to_u32")) }
}

/// Two's complement value of an n-bit field, most significant bit first
pub fn to_i64(bools:&[bool]) -> Result<i64, DigSigProcErr> {
	let n = bools.len();
	if n == 0 || n > 64 { return Err(DigSigProcErr::InvalidTelemetryData("x.len() not in 1..=64 in bools_to_int::to_i64")); }
	let raw:u64 = to_u64(bools)?;
	if n == 64 { return Ok(raw as i64); }
	let shift = 64 - n as u32;
	Ok(((raw << shift) as i64) >> shift)
}

pub fn to_i8(bools:&[bool]) -> Result<i8, DigSigProcErr> {
	if bools.len() <= 8 { Ok(to_i64(bools)? as i8) }
	else { Err(DigSigProcErr::InvalidTelemetryData("x.len() > 8 in bools_to_int::to_i8")) }
}

pub fn to_i16(bools:&[bool]) -> Result<i16, DigSigProcErr> {
	if bools.len() <= 16 { Ok(to_i64(bools)? as i16) }
	else { Err(DigSigProcErr::InvalidTelemetryData("x.len() > 16 in bools_to_int::to_i16")) }
}

pub fn to_i32(bools:&[bool]) -> Result<i32, DigSigProcErr> {
	if bools.len() <= 32 { Ok(to_i64(bools)? as i32) }
	else { Err(DigSigProcErr::InvalidTelemetryData("x.len() > 32 in bools_to_int::to_i32")) }
}

/// Writes the low `dest.len()` bits of `value`, most significant first.  Negative values are
/// written in two's complement.
pub fn write_bits(dest:&mut [bool], value:i64) {
	let n = dest.len();
	for (idx, bit) in dest.iter_mut().enumerate() {
		*bit = (value >> (n - 1 - idx)) & 1 == 1;
	}
}
