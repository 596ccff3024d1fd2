
use serde::{Serialize, Deserialize};

use crate::filters::{LoopOrder, LoopParams};
use crate::gnss::tracking::lock_detector::LockPreset;

/// Coherent integration lengths a channel may use, in ms
pub const INTEGRATION_MS:[u32; 6] = [1, 2, 4, 5, 10, 20];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileName {
	Slow,
	Med,
	Fast,
	ExtraFast,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageParams {
	pub integration_ms:u32,
	pub code_bw:f64,
	pub carr_bw:f64,
	pub fll_bw:f64,
	pub loop_order:LoopOrder,
	pub lock:LockPreset,
}

impl StageParams {

	/// Loop parameters when the filter runs once per `update_ms`
	pub fn loop_params(&self, update_ms:u32) -> LoopParams {
		LoopParams{ code_bw: self.code_bw, carr_bw: self.carr_bw, fll_bw: self.fll_bw, integration_s: (update_ms as f64) * 1.0e-3 }
	}

}

/// Pull-in stage followed by the steady-state stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingProfile {
	pub name:ProfileName,
	pub stages:[StageParams; 2],
}

fn stage(integration_ms:u32, code_bw:f64, carr_bw:f64, fll_bw:f64, loop_order:LoopOrder, lock:LockPreset) -> StageParams {
	StageParams{ integration_ms, code_bw, carr_bw, fll_bw, loop_order, lock }
}

impl ProfileName {

	pub fn profile(&self) -> TrackingProfile {
		use LoopOrder::{Second, Third};
		use LockPreset::{Pessimistic, Normal, Optimistic};
		let stages = match self {
			ProfileName::Slow      => [stage(1, 1.0, 10.0, 2.0, Second, Pessimistic), stage(20, 0.5,  5.0, 0.0, Second, Normal)],
			ProfileName::Med       => [stage(1, 1.5, 15.0, 3.0, Second, Pessimistic), stage(10, 0.7,  8.0, 0.0, Second, Normal)],
			ProfileName::Fast      => [stage(1, 2.0, 20.0, 5.0, Second, Pessimistic), stage(5,  1.0, 12.0, 1.0, Second, Normal)],
			ProfileName::ExtraFast => [stage(1, 3.0, 30.0, 8.0, Second, Pessimistic), stage(2,  1.5, 25.0, 2.0, Third,  Optimistic)],
		};
		TrackingProfile{ name: *self, stages }
	}

}

#[cfg(test)]
mod tests {

	use super::*;
	use crate::filters::make_loop;
	use crate::filters::LoopAiding;

	const ALL:[ProfileName; 4] = [ProfileName::Slow, ProfileName::Med, ProfileName::Fast, ProfileName::ExtraFast];

	#[test]
	fn stages_use_supported_integration_lengths() {
		for name in ALL.iter() {
			let p = name.profile();
			assert_eq!(p.stages[0].integration_ms, 1);
			for s in p.stages.iter() {
				assert!(INTEGRATION_MS.contains(&s.integration_ms));
			}
			assert!(p.stages[1].carr_bw <= p.stages[0].carr_bw);
		}
	}

	#[test]
	fn every_stage_builds_a_loop() {
		let aiding = LoopAiding{ intermediate_freq_hz: 0.0, nominal_code_freq_hz: 1.023e6, carr_to_code: 1540.0 };
		for name in ALL.iter() {
			for s in name.profile().stages.iter() {
				assert!(make_loop(s.loop_order, &s.loop_params(s.integration_ms), aiding, 1.023e6, 0.0).is_ok(), "{:?} {:?}", name, s);
			}
		}
	}

	#[test]
	fn profile_names_in_json() {
		assert_eq!(serde_json::to_string(&ProfileName::ExtraFast).unwrap(), "\"extrafast\"");
		let p:ProfileName = serde_json::from_str("\"slow\"").unwrap();
		assert_eq!(p, ProfileName::Slow);
	}

}
