
/*	GPS LNAV decoding chain:
	- Bit sync from prompt sign changes
	- Preamble search with TLM/HOW parity
	- Subframe parity and data recovery
	- Subframe 1/2/3 fields, collected until the issue of data matches
*/

pub mod bit_sync;
pub mod ephemeris_subframes;
pub mod parity;
pub mod subframe;
pub mod subframe_sync;

pub const WORD_BITS:usize = 30;
pub const DATA_BITS_PER_WORD:usize = 24;
pub const SUBFRAME_BITS:usize = 300;
pub const SUBFRAME_DATA_BITS:usize = 240;

pub const PREAMBLE:[bool; 8] = [true, false, false, false, true, false, true, true];

pub use self::bit_sync::BitSync;
pub use self::ephemeris_subframes::EphemerisSubframes;
pub use self::subframe_sync::{SubframeSync, SyncEvent};
