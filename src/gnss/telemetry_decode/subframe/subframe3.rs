
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::utils::bools_to_int;
use super::{SubframeData, scaled_signed, write_scaled};

/// Second half of the ephemeris.  Angles are in semicircles and rates in semicircles/s.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Body {
	pub cic:f64,
	pub omega0:f64,
	pub cis:f64,
	pub i0:f64,
	pub crc:f64,
	pub omega:f64,
	pub omega_dot:f64,
	pub iode:u8,
	pub idot:f64,
}

impl Body {

	pub fn new(bits:&SubframeData) -> Result<Body, DigSigProcErr> {
		let cic:f64       = scaled_signed(&bits[48..64], -29)?;
		let omega0:f64    = scaled_signed(&bits[64..96], -31)?;
		let cis:f64       = scaled_signed(&bits[96..112], -29)?;
		let i0:f64        = scaled_signed(&bits[112..144], -31)?;
		let crc:f64       = scaled_signed(&bits[144..160], -5)?;
		let omega:f64     = scaled_signed(&bits[160..192], -31)?;
		let omega_dot:f64 = scaled_signed(&bits[192..216], -43)?;
		let iode:u8       = bools_to_int::to_u8(&bits[216..224])?;
		let idot:f64      = scaled_signed(&bits[224..238], -43)?;
		Ok(Body{ cic, omega0, cis, i0, crc, omega, omega_dot, iode, idot })
	}

	pub fn encode(&self, bits:&mut SubframeData) {
		write_scaled(&mut bits[48..64], self.cic, -29);
		write_scaled(&mut bits[64..96], self.omega0, -31);
		write_scaled(&mut bits[96..112], self.cis, -29);
		write_scaled(&mut bits[112..144], self.i0, -31);
		write_scaled(&mut bits[144..160], self.crc, -5);
		write_scaled(&mut bits[160..192], self.omega, -31);
		write_scaled(&mut bits[192..216], self.omega_dot, -43);
		bools_to_int::write_bits(&mut bits[216..224], self.iode as i64);
		write_scaled(&mut bits[224..238], self.idot, -43);
	}

}
