
pub const SPEED_OF_LIGHT:f64 = 2.99792458e8;		// [m/s]

pub mod gps {
	pub const L1_FREQ_HZ:f64 = 1.57542e9;
	pub const L2_FREQ_HZ:f64 = 1.22760e9;

	pub const CA_CHIP_RATE_HZ:f64 = 1.023e6;
	pub const CA_CODE_LENGTH:usize = 1023;

	// L2 CM is time-multiplexed with CL, so the replica runs at the composite 1.023 Mchip/s rate
	pub const L2C_CHIP_RATE_HZ:f64 = 1.023e6;
	pub const CM_CODE_LENGTH:usize = 10230;

	pub const CARR_TO_CODE_L1:f64 = 1540.0;
	pub const CARR_TO_CODE_L2:f64 = 1200.0;

	pub const MS_PER_BIT:u64 = 20;

	pub const SEC_PER_WEEK:f64 = 604800.0;

	// Travel time assumed for the first receiver clock estimate
	pub const NOMINAL_TRAVEL_TIME_S:f64 = 0.086;
}

pub mod glonass {
	pub const L1_BASE_FREQ_HZ:f64 = 1.602e9;
	pub const L1_FREQ_STEP_HZ:f64 = 562.5e3;
	pub const L2_BASE_FREQ_HZ:f64 = 1.246e9;
	pub const L2_FREQ_STEP_HZ:f64 = 437.5e3;

	pub const CHIP_RATE_HZ:f64 = 0.511e6;
	pub const CODE_LENGTH:usize = 511;

	// Frequency slots are addressed as prn = k + 8 so that k in -7..=6 maps to 1..=14
	pub const MIN_SLOT:usize = 1;
	pub const MAX_SLOT:usize = 14;
	pub const SLOT_OFFSET:i32 = 8;
}
