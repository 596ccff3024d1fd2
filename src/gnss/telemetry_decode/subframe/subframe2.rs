
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::utils::bools_to_int;
use super::{SubframeData, scaled_signed, scaled_unsigned, write_scaled};

/// First half of the ephemeris.  Angles are in semicircles.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Body {
	pub iode:u8,
	pub crs:f64,
	pub dn:f64,
	pub m0:f64,
	pub cuc:f64,
	pub e:f64,
	pub cus:f64,
	pub sqrt_a:f64,
	pub t_oe:f64,
	pub fit_interval:bool,
	pub aodo:u8,
}

impl Body {

	pub fn new(bits:&SubframeData) -> Result<Body, DigSigProcErr> {
		let iode:u8     = bools_to_int::to_u8(&bits[48..56])?;
		let crs:f64     = scaled_signed(&bits[56..72], -5)?;
		let dn:f64      = scaled_signed(&bits[72..88], -43)?;
		let m0:f64      = scaled_signed(&bits[88..120], -31)?;
		let cuc:f64     = scaled_signed(&bits[120..136], -29)?;
		let e:f64       = scaled_unsigned(&bits[136..168], -33)?;
		let cus:f64     = scaled_signed(&bits[168..184], -29)?;
		let sqrt_a:f64  = scaled_unsigned(&bits[184..216], -19)?;
		let t_oe:f64    = scaled_unsigned(&bits[216..232], 4)?;
		let fit_interval:bool = bits[232];
		let aodo:u8     = bools_to_int::to_u8(&bits[233..238])?;
		Ok(Body{ iode, crs, dn, m0, cuc, e, cus, sqrt_a, t_oe, fit_interval, aodo })
	}

	pub fn encode(&self, bits:&mut SubframeData) {
		bools_to_int::write_bits(&mut bits[48..56], self.iode as i64);
		write_scaled(&mut bits[56..72], self.crs, -5);
		write_scaled(&mut bits[72..88], self.dn, -43);
		write_scaled(&mut bits[88..120], self.m0, -31);
		write_scaled(&mut bits[120..136], self.cuc, -29);
		write_scaled(&mut bits[136..168], self.e, -33);
		write_scaled(&mut bits[168..184], self.cus, -29);
		write_scaled(&mut bits[184..216], self.sqrt_a, -19);
		write_scaled(&mut bits[216..232], self.t_oe, 4);
		bits[232] = self.fit_interval;
		bools_to_int::write_bits(&mut bits[233..238], self.aodo as i64);
	}

}
