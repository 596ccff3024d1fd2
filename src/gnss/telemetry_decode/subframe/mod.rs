
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::gnss::telemetry_decode::SUBFRAME_DATA_BITS;
use crate::utils::bools_to_int;

pub mod subframe1;
pub mod subframe2;
pub mod subframe3;

pub type SubframeData = [bool; SUBFRAME_DATA_BITS];

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Subframe {
	pub tow_count:u32,
	pub subframe_id:u8,
	pub body:SubframeBody,
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub enum SubframeBody {
	Subframe1(subframe1::Body),
	Subframe2(subframe2::Body),
	Subframe3(subframe3::Body),
	/// Almanac pages are not decoded
	Other,
}

impl Subframe {

	/// GPS time of week at the start of the subframe
	pub fn start_time_of_week(&self) -> f64 { (self.tow_count as f64) * 6.0 - 6.0 }

}

pub fn subframe_id(bits:&SubframeData) -> Result<u8, DigSigProcErr> { bools_to_int::to_u8(&bits[43..46]) }

pub fn decode(bits:&SubframeData) -> Result<Subframe, DigSigProcErr> {
	let tow_count:u32 = bools_to_int::to_u32(&bits[24..41])?;
	let subframe_id:u8 = subframe_id(bits)?;

	let body = match subframe_id {
		1 => SubframeBody::Subframe1(subframe1::Body::new(bits)?),
		2 => SubframeBody::Subframe2(subframe2::Body::new(bits)?),
		3 => SubframeBody::Subframe3(subframe3::Body::new(bits)?),
		4 | 5 => SubframeBody::Other,
		_ => return Err(DigSigProcErr::InvalidTelemetryData("subframe id other than 1 through 5")),
	};

	Ok(Subframe{ tow_count, subframe_id, body })
}

// Field helpers shared by the subframe bodies

pub(crate) fn scaled_signed(bits:&[bool], scale_exp:i32) -> Result<f64, DigSigProcErr> {
	Ok((bools_to_int::to_i64(bits)? as f64) * (2.0_f64).powi(scale_exp))
}

pub(crate) fn scaled_unsigned(bits:&[bool], scale_exp:i32) -> Result<f64, DigSigProcErr> {
	Ok((bools_to_int::to_u64(bits)? as f64) * (2.0_f64).powi(scale_exp))
}

pub(crate) fn write_scaled(dest:&mut [bool], value:f64, scale_exp:i32) {
	bools_to_int::write_bits(dest, (value / (2.0_f64).powi(scale_exp)).round() as i64);
}

/// Data bits of a subframe with the TLM preamble, TOW count and subframe id filled in
pub fn header(tow_count:u32, subframe_id:u8) -> SubframeData {
	let mut bits = [false; SUBFRAME_DATA_BITS];
	bits[0..8].copy_from_slice(&crate::gnss::telemetry_decode::PREAMBLE);
	bools_to_int::write_bits(&mut bits[24..41], tow_count as i64);
	bools_to_int::write_bits(&mut bits[43..46], subframe_id as i64);
	bits
}
