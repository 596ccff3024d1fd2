
use serde::{Serialize, Deserialize};

use crate::gnss::signal::SignalKind;

pub mod alias_detector;
pub mod channel;
pub mod correlator;
pub mod lock_detector;
pub mod profiles;

pub use self::channel::{ChannelEvent, ChannelOutput, ChannelState, ChannelStatus, Handover, LostReason, TrackingChannel};

/// One integration of one channel, as written to the tracking stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSample {
	pub prn:usize,
	pub signal:SignalKind,
	/// First sample of the integration
	pub absolute_sample:u64,
	pub ms_tracked:u64,
	pub code_phase:f64,
	pub carrier_freq:f64,
	pub code_freq:f64,
	pub i_p:f64,
	pub q_p:f64,
	pub lock_detect_outo:bool,
	pub lock_detect_outp:bool,
	pub cn0_dbhz:f64,
}
