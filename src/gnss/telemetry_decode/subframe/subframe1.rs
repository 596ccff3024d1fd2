
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::utils::bools_to_int;
use super::{SubframeData, scaled_signed, write_scaled};

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
#[allow(non_camel_case_types)]
pub enum CodeOnL2 {
	Reserved,
	P_Code,
	CA_Code,
}

/// Week number, clock correction and health
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Body {
	pub week_number:u16,
	pub code_on_l2:CodeOnL2,
	pub ura_index:u8,
	pub sv_health:u8,
	pub iodc:u16,
	pub t_gd:f64,
	pub t_oc:u32,
	pub a_f2:f64,
	pub a_f1:f64,
	pub a_f0:f64,
}

impl Body {

	pub fn new(bits:&SubframeData) -> Result<Body, DigSigProcErr> {
		let week_number:u16 = bools_to_int::to_u16(&bits[48..58])?;
		let code_on_l2 = match (bits[58], bits[59]) {
			(false, false) => CodeOnL2::Reserved,
			(false, true ) => CodeOnL2::P_Code,
			(true,  false) => CodeOnL2::CA_Code,
			(true,  true ) => return Err(DigSigProcErr::InvalidTelemetryData("invalid code_on_l2 field in subframe 1")),
		};
		let ura_index:u8 = bools_to_int::to_u8(&bits[60..64])?;
		let sv_health:u8 = bools_to_int::to_u8(&bits[64..70])?;
		let iodc:u16     = bools_to_int::to_u16(&[&bits[70..72], &bits[168..176]].concat())?;
		let t_gd:f64     = scaled_signed(&bits[160..168], -31)?;
		let t_oc:u32     = bools_to_int::to_u32(&bits[176..192])? * 16;
		let a_f2:f64     = scaled_signed(&bits[192..200], -55)?;
		let a_f1:f64     = scaled_signed(&bits[200..216], -43)?;
		let a_f0:f64     = scaled_signed(&bits[216..238], -31)?;

		Ok(Body{ week_number, code_on_l2, ura_index, sv_health, iodc, t_gd, t_oc, a_f2, a_f1, a_f0 })
	}

	/// Writes the fields into a subframe, rounding to the broadcast resolution
	pub fn encode(&self, bits:&mut SubframeData) {
		bools_to_int::write_bits(&mut bits[48..58], self.week_number as i64);
		let (a, b) = match self.code_on_l2 {
			CodeOnL2::Reserved => (false, false),
			CodeOnL2::P_Code   => (false, true),
			CodeOnL2::CA_Code  => (true, false),
		};
		bits[58] = a;
		bits[59] = b;
		bools_to_int::write_bits(&mut bits[60..64], self.ura_index as i64);
		bools_to_int::write_bits(&mut bits[64..70], self.sv_health as i64);
		bools_to_int::write_bits(&mut bits[70..72], (self.iodc >> 8) as i64);
		bools_to_int::write_bits(&mut bits[168..176], (self.iodc & 0xFF) as i64);
		write_scaled(&mut bits[160..168], self.t_gd, -31);
		bools_to_int::write_bits(&mut bits[176..192], (self.t_oc / 16) as i64);
		write_scaled(&mut bits[192..200], self.a_f2, -55);
		write_scaled(&mut bits[200..216], self.a_f1, -43);
		write_scaled(&mut bits[216..238], self.a_f0, -31);
	}

}
