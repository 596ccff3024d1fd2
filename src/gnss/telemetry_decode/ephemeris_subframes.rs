
use log::debug;

use crate::DigSigProcErr;
use crate::gnss::ephemeris::Ephemeris;
use crate::gnss::telemetry_decode::subframe::{self, Subframe, SubframeBody, SubframeData, subframe1, subframe2, subframe3};

/// Latest subframes 1, 2 and 3 of one satellite
#[derive(Debug, Clone, Default)]
pub struct EphemerisSubframes {
	sf1:Option<subframe1::Body>,
	sf2:Option<subframe2::Body>,
	sf3:Option<subframe3::Body>,
}

impl EphemerisSubframes {

	pub fn new() -> Self { Self::default() }

	/// Decodes a parity-checked subframe and keeps it when it belongs to the ephemeris
	pub fn insert(&mut self, data:&SubframeData) -> Result<Subframe, DigSigProcErr> {
		let sf = subframe::decode(data)?;
		match sf.body {
			SubframeBody::Subframe1(b) => { debug!("subframe 1 IODC={}", b.iodc); self.sf1 = Some(b) },
			SubframeBody::Subframe2(b) => { debug!("subframe 2 IODE={}", b.iode); self.sf2 = Some(b) },
			SubframeBody::Subframe3(b) => { debug!("subframe 3 IODE={}", b.iode); self.sf3 = Some(b) },
			SubframeBody::Other => {},
		}
		Ok(sf)
	}

	/// All three subframes are present and come from the same issue of data
	pub fn is_complete(&self) -> bool {
		match (&self.sf1, &self.sf2, &self.sf3) {
			(Some(a), Some(b), Some(c)) => (a.iodc & 0xFF) as u8 == b.iode && b.iode == c.iode,
			_ => false,
		}
	}

	pub fn ephemeris(&self) -> Option<Ephemeris> {
		if !self.is_complete() { return None; }
		match (&self.sf1, &self.sf2, &self.sf3) {
			(Some(a), Some(b), Some(c)) => Some(Ephemeris::from_subframes(a, b, c)),
			_ => None,
		}
	}

	pub fn clear(&mut self) { *self = Self::default(); }

}

/// Data bits of subframes 1, 2 and 3 carrying `eph`, the first with TOW count `tow_count`
pub fn encode_ephemeris(eph:&Ephemeris, tow_count:u32) -> [SubframeData; 3] {
	let (b1, b2, b3) = eph.to_subframes();
	let mut sf1 = subframe::header(tow_count, 1);
	let mut sf2 = subframe::header(tow_count + 1, 2);
	let mut sf3 = subframe::header(tow_count + 2, 3);
	b1.encode(&mut sf1);
	b2.encode(&mut sf2);
	b3.encode(&mut sf3);
	[sf1, sf2, sf3]
}

#[cfg(test)]
mod tests {

	use super::*;
	use crate::gnss::ephemeris::tests::sample_ephemeris;
	use crate::gnss::telemetry_decode::parity::{encode_subframe, recover_data};

	fn lsb(exp:i32) -> f64 { (2.0_f64).powi(exp) }

	#[test]
	fn ephemeris_survives_the_air_interface() {
		let eph = sample_ephemeris();
		let mut acc = EphemerisSubframes::new();
		let (mut d29, mut d30) = (false, false);
		for data in encode_ephemeris(&eph, 57600).iter() {
			let tx = encode_subframe(data, d29, d30).unwrap();
			let rx = recover_data(&tx, d29, d30).unwrap();
			d29 = tx[298];
			d30 = tx[299];
			acc.insert(&rx).unwrap();
		}
		assert!(acc.is_complete());
		let out = acc.ephemeris().unwrap();

		assert_eq!(out.week_number, eph.week_number);
		assert_eq!(out.iodc, eph.iodc);
		assert_eq!(out.iode, eph.iode);
		assert_eq!(out.aodo, eph.aodo);
		assert_eq!(out.t_oe, eph.t_oe);
		assert_eq!(out.t_oc, eph.t_oc);
		let checks:[(&str, f64, f64, i32); 20] = [
			("sqrt_a", out.sqrt_a, eph.sqrt_a, -19), ("e", out.e, eph.e, -33),
			("m0", out.m0, eph.m0, -31), ("omega", out.omega, eph.omega, -31),
			("omega0", out.omega0, eph.omega0, -31), ("i0", out.i0, eph.i0, -31),
			("omega_dot", out.omega_dot, eph.omega_dot, -43), ("idot", out.idot, eph.idot, -43),
			("dn", out.dn, eph.dn, -43), ("crs", out.crs, eph.crs, -5),
			("crc", out.crc, eph.crc, -5), ("cus", out.cus, eph.cus, -29),
			("cuc", out.cuc, eph.cuc, -29), ("cis", out.cis, eph.cis, -29),
			("cic", out.cic, eph.cic, -29), ("a_f0", out.a_f0, eph.a_f0, -31),
			("a_f1", out.a_f1, eph.a_f1, -43), ("a_f2", out.a_f2, eph.a_f2, -55),
			("t_gd", out.t_gd, eph.t_gd, -31), ("t_oe", out.t_oe, eph.t_oe, 4),
		];
		for (name, got, want, exp) in checks.iter() {
			assert!((got - want).abs() <= lsb(*exp), "{}: {} vs {}", name, got, want);
		}
	}

	#[test]
	fn mismatched_issue_of_data_is_incomplete() {
		let eph = sample_ephemeris();
		let mut newer = eph;
		newer.iode = eph.iode.wrapping_add(1);
		newer.iodc = eph.iodc + 1;

		let old = encode_ephemeris(&eph, 100);
		let new = encode_ephemeris(&newer, 200);
		let mut acc = EphemerisSubframes::new();
		acc.insert(&old[0]).unwrap();
		acc.insert(&old[1]).unwrap();
		acc.insert(&new[2]).unwrap();
		assert!(!acc.is_complete());
		assert!(acc.ephemeris().is_none());

		acc.insert(&new[0]).unwrap();
		acc.insert(&new[1]).unwrap();
		assert!(acc.is_complete());
		assert_eq!(acc.ephemeris().unwrap().iode, newer.iode);

		acc.clear();
		assert!(!acc.is_complete());
	}

	#[test]
	fn almanac_pages_are_ignored() {
		let mut acc = EphemerisSubframes::new();
		let sf = acc.insert(&subframe::header(10, 4)).unwrap();
		assert_eq!(sf.body, SubframeBody::Other);
		assert!(!acc.is_complete());
	}

}
