
use std::f64::consts;

use serde::{Serialize, Deserialize};

use crate::gnss::constants::gps::SEC_PER_WEEK;
use crate::gnss::telemetry_decode::subframe::{subframe1, subframe2, subframe3};

pub const MU:f64 = 3.986005e14;              // [m^3/s^2] WGS-84 value of the earth's gravitational constant
pub const F:f64 = -4.442807633e-10;          // [sec/root-meter]
pub const OMEGA_E:f64 = 7.2921151467e-5;     // [rad/s] WGS-84 value of the earth's rotation rate

const KEPLER_TOL:f64 = 1.0e-12;
const KEPLER_MAX_ITER:usize = 20;

/// Broadcast orbit and clock of one satellite.  Angles are in semicircles as transmitted.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Ephemeris {
	pub week_number:u16, pub t_gd:f64,    pub aodo:u8,     pub fit_interval:bool,
	pub t_oc:f64,        pub a_f0:f64,    pub a_f1:f64,    pub a_f2:f64,
	pub t_oe:f64,        pub sqrt_a:f64,  pub dn:f64,      pub m0:f64,
	pub e:f64,           pub omega:f64,   pub omega0:f64,  pub omega_dot:f64,
	pub cus:f64,         pub cuc:f64,     pub crs:f64,     pub crc:f64,
	pub cis:f64,         pub cic:f64,     pub i0:f64,      pub idot:f64,
	pub iodc:u16,        pub iode:u8,     pub sv_health:u8, pub ura_index:u8,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SatellitePosition {
	pub ecef_m:[f64; 3],
	/// Satellite clock offset from GPS time for L1 C/A users, relativity and TGD included
	pub clock_correction_s:f64,
}

/// Time difference corrected for the end-of-week crossover
pub fn week_difference(t:f64, reference:f64) -> f64 {
	let mut dt = t - reference;
	if dt > SEC_PER_WEEK / 2.0 { dt -= SEC_PER_WEEK; }
	else if dt < -SEC_PER_WEEK / 2.0 { dt += SEC_PER_WEEK; }
	dt
}

impl Ephemeris {

	pub fn from_subframes(sf1:&subframe1::Body, sf2:&subframe2::Body, sf3:&subframe3::Body) -> Self {
		Self {
			week_number: sf1.week_number, t_gd: sf1.t_gd, aodo: sf2.aodo, fit_interval: sf2.fit_interval,
			t_oc: sf1.t_oc as f64, a_f0: sf1.a_f0, a_f1: sf1.a_f1, a_f2: sf1.a_f2,
			t_oe: sf2.t_oe, sqrt_a: sf2.sqrt_a, dn: sf2.dn, m0: sf2.m0,
			e: sf2.e, omega: sf3.omega, omega0: sf3.omega0, omega_dot: sf3.omega_dot,
			cus: sf2.cus, cuc: sf2.cuc, crs: sf2.crs, crc: sf3.crc,
			cis: sf3.cis, cic: sf3.cic, i0: sf3.i0, idot: sf3.idot,
			iodc: sf1.iodc, iode: sf2.iode, sv_health: sf1.sv_health, ura_index: sf1.ura_index,
		}
	}

	/// Splits back into the three subframe bodies
	pub fn to_subframes(&self) -> (subframe1::Body, subframe2::Body, subframe3::Body) {
		let sf1 = subframe1::Body{ week_number: self.week_number, code_on_l2: subframe1::CodeOnL2::CA_Code,
			ura_index: self.ura_index, sv_health: self.sv_health, iodc: self.iodc, t_gd: self.t_gd,
			t_oc: self.t_oc as u32, a_f2: self.a_f2, a_f1: self.a_f1, a_f0: self.a_f0 };
		let sf2 = subframe2::Body{ iode: self.iode, crs: self.crs, dn: self.dn, m0: self.m0, cuc: self.cuc, e: self.e,
			cus: self.cus, sqrt_a: self.sqrt_a, t_oe: self.t_oe, fit_interval: self.fit_interval, aodo: self.aodo };
		let sf3 = subframe3::Body{ cic: self.cic, omega0: self.omega0, cis: self.cis, i0: self.i0, crc: self.crc,
			omega: self.omega, omega_dot: self.omega_dot, iode: self.iode, idot: self.idot };
		(sf1, sf2, sf3)
	}

	/// Polynomial satellite clock offset, without relativity or TGD
	pub fn dt_sv(&self, t:f64) -> f64 {
		let dt = week_difference(t, self.t_oc);
		self.a_f0 + self.a_f1*dt + self.a_f2*dt.powi(2)
	}

	fn eccentric_anomaly(&self, mk:f64) -> f64 {
		let mut ek:f64 = mk;
		for _ in 0..KEPLER_MAX_ITER {
			let step = (ek - self.e*ek.sin() - mk) / (1.0 - self.e*ek.cos());
			ek -= step;
			if step.abs() < KEPLER_TOL { break; }
		}
		ek
	}

	/// ECEF position at GPS time of week `t` (the transmit time) following IS-GPS-200 Table 20-IV
	pub fn pos_and_clock(&self, t:f64) -> SatellitePosition {
		let a:f64 = self.sqrt_a.powi(2);
		let n0:f64 = (MU / a.powi(3)).sqrt();
		let tk:f64 = week_difference(t, self.t_oe);
		let n:f64 = n0 + self.dn * consts::PI;

		let mk:f64 = self.m0 * consts::PI + n*tk;
		let ek:f64 = self.eccentric_anomaly(mk);

		let nu_k:f64 = {
			let denom:f64 = 1.0 - self.e*ek.cos();
			let y:f64 = (1.0 - self.e.powi(2)).sqrt() * ek.sin() / denom;
			let x:f64 = (ek.cos() - self.e) / denom;
			y.atan2(x)
		};

		let phi_k:f64 = nu_k + self.omega * consts::PI;
		let (s2, c2) = (2.0*phi_k).sin_cos();

		let u_k:f64 = phi_k + self.cus*s2 + self.cuc*c2;
		let r_k:f64 = a*(1.0 - self.e*ek.cos()) + self.crs*s2 + self.crc*c2;
		let i_k:f64 = self.i0 * consts::PI + self.cis*s2 + self.cic*c2 + self.idot * consts::PI * tk;

		let x_kp:f64 = r_k * u_k.cos();
		let y_kp:f64 = r_k * u_k.sin();

		let omega_k:f64 = self.omega0 * consts::PI + (self.omega_dot * consts::PI - OMEGA_E)*tk - OMEGA_E*self.t_oe;
		let (so, co) = omega_k.sin_cos();

		let ecef_m = [
			x_kp*co - y_kp*i_k.cos()*so,
			x_kp*so + y_kp*i_k.cos()*co,
			y_kp*i_k.sin(),
		];

		let dt_r:f64 = F * self.e * self.sqrt_a * ek.sin();
		SatellitePosition{ ecef_m, clock_correction_s: self.dt_sv(t) + dt_r - self.t_gd }
	}

}

#[cfg(test)]
pub(crate) mod tests {

	use super::*;

	/// Values in the range of a real broadcast ephemeris
	pub(crate) fn sample_ephemeris() -> Ephemeris {
		Ephemeris {
			week_number: 187, t_gd: -1.117587e-8, aodo: 7, fit_interval: false,
			t_oc: 345600.0, a_f0: -2.169376e-4, a_f1: -2.842171e-12, a_f2: 0.0,
			t_oe: 345600.0, sqrt_a: 5153.6544, dn: 1.4064e-9, m0: 0.3141,
			e: 0.01097, omega: -0.5233, omega0: 0.2856, omega_dot: -2.6078e-9,
			cus: 4.6454e-6, cuc: -5.8096e-7, crs: -12.375, crc: 285.5,
			cis: 1.0058e-7, cic: -2.0489e-8, i0: 0.3044, idot: 1.3642e-11,
			iodc: 0x143, iode: 0x43, sv_health: 0, ura_index: 0,
		}
	}

	fn norm(v:&[f64; 3]) -> f64 { v.iter().map(|x| x*x).sum::<f64>().sqrt() }

	#[test]
	fn orbit_radius_within_ellipse() {
		let eph = sample_ephemeris();
		let a = eph.sqrt_a.powi(2);
		for k in 0..48 {
			let t = eph.t_oe - 7200.0 + (k as f64) * 300.0;
			let pos = eph.pos_and_clock(t);
			let r = norm(&pos.ecef_m);
			assert!(r > a*(1.0 - eph.e) - 1000.0 && r < a*(1.0 + eph.e) + 1000.0, "r = {}", r);
		}
	}

	#[test]
	fn satellite_speed_is_orbital() {
		let eph = sample_ephemeris();
		let p0 = eph.pos_and_clock(eph.t_oe).ecef_m;
		let p1 = eph.pos_and_clock(eph.t_oe + 1.0).ecef_m;
		let v = norm(&[p1[0]-p0[0], p1[1]-p0[1], p1[2]-p0[2]]);
		// Inertial speed near 3.87 km/s, less in the rotating frame
		assert!(v > 2500.0 && v < 4200.0, "v = {}", v);
	}

	#[test]
	fn clock_includes_relativity_and_tgd() {
		let eph = sample_ephemeris();
		let t = eph.t_oc + 100.0;
		let pos = eph.pos_and_clock(t);
		let poly = eph.a_f0 + eph.a_f1 * 100.0;
		assert!((eph.dt_sv(t) - poly).abs() < 1.0e-18);
		let residual = pos.clock_correction_s - poly + eph.t_gd;
		// The relativistic term is bounded by |F| e sqrt(A)
		assert!(residual.abs() <= F.abs() * eph.e * eph.sqrt_a + 1.0e-15);
		assert!(residual.abs() > 0.0);
	}

	#[test]
	fn week_crossover() {
		assert_eq!(week_difference(10.0, SEC_PER_WEEK - 20.0), 30.0);
		assert_eq!(week_difference(SEC_PER_WEEK - 20.0, 10.0), -30.0);
		assert_eq!(week_difference(500.0, 400.0), 100.0);
	}

}
