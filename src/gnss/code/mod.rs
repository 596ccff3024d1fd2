
use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::DigSigProcErr;
use crate::gnss::signal::SignalKind;

pub mod glonass;
pub mod l1_ca;
pub mod l2_cm;

static REGISTRY:Lazy<CodeRegistry> = Lazy::new(CodeRegistry::build);

/// Owns one immutable chip table per (signal, PRN).  GLONASS satellites share a single code,
/// so every GLONASS slot resolves to the same table.
pub struct CodeRegistry {
	tables: HashMap<(SignalKind, usize), Vec<i8>>,
	glonass: Vec<i8>,
}

impl CodeRegistry {

	fn build() -> Self {
		let mut tables:HashMap<(SignalKind, usize), Vec<i8>> = HashMap::new();
		for prn in 1..=32 {
			// Both generators accept every PRN in this range
			if let Ok(code) = l1_ca::ca_code(prn) { tables.insert((SignalKind::GpsL1Ca, prn), code); }
			if let Ok(code) = l2_cm::cm_code(prn) { tables.insert((SignalKind::GpsL2Cm, prn), code); }
		}
		log::debug!("Built code registry with {} GPS tables", tables.len());
		Self{ tables, glonass: glonass::st_code() }
	}

	pub fn global() -> &'static CodeRegistry { &REGISTRY }

	pub fn get(&self, prn:usize, signal:SignalKind) -> Result<&[i8], DigSigProcErr> {
		if !signal.supports_prn(prn) { return Err(DigSigProcErr::UnsupportedPrn{ prn, signal }); }
		match signal {
			SignalKind::GlonassL1 | SignalKind::GlonassL2 => Ok(&self.glonass),
			_ => self.tables.get(&(signal, prn)).map(|v| v.as_slice()).ok_or(DigSigProcErr::UnsupportedPrn{ prn, signal }),
		}
	}

}

/// Code table for a satellite, built on first use of the registry
pub fn get_code(prn:usize, signal:SignalKind) -> Result<&'static [i8], DigSigProcErr> {
	CodeRegistry::global().get(prn, signal)
}

/// Chip of the replica at a (possibly fractional or negative) replica phase.  For L2 CM the odd
/// slots belong to CL and carry no CM energy.
#[inline]
pub fn replica_chip(code:&[i8], signal:SignalKind, replica_phase:f64) -> i8 {
	let len:i64 = signal.replica_length() as i64;
	let idx:i64 = (replica_phase.floor() as i64).rem_euclid(len);
	match signal {
		SignalKind::GpsL2Cm => if idx % 2 == 0 { code[(idx/2) as usize] } else { 0 },
		_ => code[idx as usize],
	}
}
