
use serde::{Serialize, Deserialize};

use crate::gnss::constants::{gps, glonass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
	GpsL1,
	GpsL2,
	GlonassL1,
	GlonassL2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalKind {
	GpsL1Ca,
	GpsL2Cm,
	GlonassL1,
	GlonassL2,
}

impl SignalKind {

	pub fn band(&self) -> Band {
		match self {
			SignalKind::GpsL1Ca   => Band::GpsL1,
			SignalKind::GpsL2Cm   => Band::GpsL2,
			SignalKind::GlonassL1 => Band::GlonassL1,
			SignalKind::GlonassL2 => Band::GlonassL2,
		}
	}

	/// Number of chips in the stored code table
	pub fn code_length(&self) -> usize {
		match self {
			SignalKind::GpsL1Ca => gps::CA_CODE_LENGTH,
			SignalKind::GpsL2Cm => gps::CM_CODE_LENGTH,
			SignalKind::GlonassL1 | SignalKind::GlonassL2 => glonass::CODE_LENGTH,
		}
	}

	/// Number of replica chips in one code period.  Differs from the code length only for L2 CM,
	/// whose chips occupy every other slot of the CM/CL multiplex.
	pub fn replica_length(&self) -> usize {
		match self {
			SignalKind::GpsL2Cm => 2 * gps::CM_CODE_LENGTH,
			_ => self.code_length(),
		}
	}

	pub fn chip_rate_hz(&self) -> f64 {
		match self {
			SignalKind::GpsL1Ca => gps::CA_CHIP_RATE_HZ,
			SignalKind::GpsL2Cm => gps::L2C_CHIP_RATE_HZ,
			SignalKind::GlonassL1 | SignalKind::GlonassL2 => glonass::CHIP_RATE_HZ,
		}
	}

	pub fn chips_per_ms(&self) -> f64 { self.chip_rate_hz() / 1000.0 }

	pub fn code_period_ms(&self) -> u64 {
		((self.replica_length() as f64) / self.chips_per_ms()).round() as u64
	}

	pub fn prn_range(&self) -> (usize, usize) {
		match self {
			SignalKind::GpsL1Ca | SignalKind::GpsL2Cm => (1, 32),
			SignalKind::GlonassL1 | SignalKind::GlonassL2 => (glonass::MIN_SLOT, glonass::MAX_SLOT),
		}
	}

	pub fn supports_prn(&self, prn:usize) -> bool {
		let (lo, hi) = self.prn_range();
		prn >= lo && prn <= hi
	}

	/// Carrier frequency of the signal before downconversion
	pub fn carrier_freq_hz(&self, prn:usize) -> f64 {
		match self {
			SignalKind::GpsL1Ca   => gps::L1_FREQ_HZ,
			SignalKind::GpsL2Cm   => gps::L2_FREQ_HZ,
			SignalKind::GlonassL1 => glonass::L1_BASE_FREQ_HZ + (glonass_channel(prn) as f64)*glonass::L1_FREQ_STEP_HZ,
			SignalKind::GlonassL2 => glonass::L2_BASE_FREQ_HZ + (glonass_channel(prn) as f64)*glonass::L2_FREQ_STEP_HZ,
		}
	}

	/// Offset of this satellite's carrier from the band center, nonzero only for GLONASS FDMA slots
	pub fn slot_offset_hz(&self, prn:usize) -> f64 {
		match self {
			SignalKind::GlonassL1 => (glonass_channel(prn) as f64)*glonass::L1_FREQ_STEP_HZ,
			SignalKind::GlonassL2 => (glonass_channel(prn) as f64)*glonass::L2_FREQ_STEP_HZ,
			_ => 0.0,
		}
	}

	pub fn carr_to_code(&self, prn:usize) -> f64 {
		match self {
			SignalKind::GpsL1Ca => gps::CARR_TO_CODE_L1,
			SignalKind::GpsL2Cm => gps::CARR_TO_CODE_L2,
			SignalKind::GlonassL1 | SignalKind::GlonassL2 => self.carrier_freq_hz(prn) / glonass::CHIP_RATE_HZ,
		}
	}

	/// Signals with a 1 ms code period can be found by the parallel code phase search
	pub fn is_acquirable(&self) -> bool { self.code_period_ms() == 1 }

	/// Signals whose navigation message this crate decodes into ephemerides
	pub fn has_lnav(&self) -> bool { *self == SignalKind::GpsL1Ca }

}

pub fn glonass_channel(prn:usize) -> i32 { (prn as i32) - glonass::SLOT_OFFSET }

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn code_periods() {
		assert_eq!(SignalKind::GpsL1Ca.code_period_ms(), 1);
		assert_eq!(SignalKind::GpsL2Cm.code_period_ms(), 20);
		assert_eq!(SignalKind::GlonassL1.code_period_ms(), 1);
		assert!(!SignalKind::GpsL2Cm.is_acquirable());
	}

	#[test]
	fn glonass_slots() {
		assert_eq!(glonass_channel(1), -7);
		assert_eq!(glonass_channel(14), 6);
		assert!((SignalKind::GlonassL1.carrier_freq_hz(8) - 1.602e9).abs() < 1.0e-3);
		assert!((SignalKind::GlonassL1.carr_to_code(8) - 3135.03).abs() < 0.01);
		assert!(!SignalKind::GlonassL1.supports_prn(15));
	}

	#[test]
	fn carrier_aiding_ratios() {
		assert_eq!(SignalKind::GpsL1Ca.carr_to_code(1), 1540.0);
		assert_eq!(SignalKind::GpsL2Cm.carr_to_code(1), 1200.0);
		let l1_ratio = gps::L1_FREQ_HZ / gps::CA_CHIP_RATE_HZ;
		assert!((l1_ratio - 1540.0).abs() < 1.0e-9);
	}

}
