
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::debug;
use serde::{Serialize, Deserialize};

use crate::DigSigProcErr;
use crate::gnss::acquisition::{AcquisitionResult, sort_by_snr};
use crate::gnss::measurement::MeasurementEpoch;
use crate::gnss::signal::SignalKind;
use crate::gnss::tracking::TrackingSample;

pub const FORMAT_VERSION:u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
	Acquisition(AcquisitionResult),
	Tracking(TrackingSample),
	Measurement(MeasurementEpoch),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
	format_version:u32,
	records:Vec<Record>,
}

pub fn save_records<W: Write>(dest:W, records:&[Record]) -> Result<(), DigSigProcErr> {
	let envelope = Envelope{ format_version: FORMAT_VERSION, records: records.to_vec() };
	serde_json::to_writer_pretty(dest, &envelope)?;
	Ok(())
}

pub fn load_records<R: Read>(src:R) -> Result<Vec<Record>, DigSigProcErr> {
	let value:serde_json::Value = serde_json::from_reader(src)?;
	let version = value.get("format_version").and_then(|v| v.as_u64()).unwrap_or(0);
	if version != FORMAT_VERSION as u64 {
		return Err(DigSigProcErr::UnsupportedVersion(version as u32));
	}
	let envelope:Envelope = serde_json::from_value(value)?;
	Ok(envelope.records)
}

/// Writes the results by descending SNR
pub fn save_acquisition_results<W: Write>(dest:W, results:&[AcquisitionResult]) -> Result<(), DigSigProcErr> {
	let mut sorted:Vec<AcquisitionResult> = results.to_vec();
	sort_by_snr(&mut sorted);
	let records:Vec<Record> = sorted.into_iter().map(Record::Acquisition).collect();
	save_records(dest, &records)
}

pub fn load_acquisition_results<R: Read>(src:R) -> Result<Vec<AcquisitionResult>, DigSigProcErr> {
	Ok(load_records(src)?.into_iter().filter_map(|r| match r {
		Record::Acquisition(a) => Some(a),
		_ => None,
	}).collect())
}

/// Destination for everything a run produces
pub trait ResultSink {
	fn record(&mut self, record:Record) -> Result<(), DigSigProcErr>;

	fn measurement_epoch(&mut self, epoch:&MeasurementEpoch) -> Result<(), DigSigProcErr> {
		self.record(Record::Measurement(epoch.clone()))
	}

	fn flush(&mut self) -> Result<(), DigSigProcErr>;
}

/// Keeps every record in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
	pub records:Vec<Record>,
}

impl MemorySink {

	pub fn new() -> Self { Self::default() }

	pub fn tracking(&self) -> impl Iterator<Item=&TrackingSample> {
		self.records.iter().filter_map(|r| match r { Record::Tracking(t) => Some(t), _ => None })
	}

	pub fn epochs(&self) -> impl Iterator<Item=&MeasurementEpoch> {
		self.records.iter().filter_map(|r| match r { Record::Measurement(m) => Some(m), _ => None })
	}

}

impl ResultSink for MemorySink {

	fn record(&mut self, record:Record) -> Result<(), DigSigProcErr> {
		self.records.push(record);
		Ok(())
	}

	fn flush(&mut self) -> Result<(), DigSigProcErr> { Ok(()) }

}

/// One JSON object per line.  Tracking samples go to `{base}_{signal}_prn{prn}.jsonl`, acquisition
/// results and measurement epochs to `{base}_acquisition.jsonl` and `{base}_measurements.jsonl`.
pub struct JsonLinesSink {
	base:PathBuf,
	streams:BTreeMap<String, BufWriter<File>>,
}

impl JsonLinesSink {

	pub fn new<P: AsRef<Path>>(base:P) -> Self {
		Self{ base: base.as_ref().to_path_buf(), streams: BTreeMap::new() }
	}

	pub fn stream_path(&self, suffix:&str) -> PathBuf {
		let mut name = self.base.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
		name.push('_');
		name.push_str(suffix);
		name.push_str(".jsonl");
		self.base.with_file_name(name)
	}

	pub fn tracking_suffix(prn:usize, signal:SignalKind) -> String { format!("{:?}_prn{}", signal, prn) }

	fn write_line<T: Serialize>(&mut self, suffix:String, value:&T) -> Result<(), DigSigProcErr> {
		if !self.streams.contains_key(&suffix) {
			let path = self.stream_path(&suffix);
			debug!("Opening result stream {}", path.display());
			self.streams.insert(suffix.clone(), BufWriter::new(File::create(path)?));
		}
		if let Some(w) = self.streams.get_mut(&suffix) {
			serde_json::to_writer(&mut *w, value)?;
			w.write_all(b"\n")?;
		}
		Ok(())
	}

}

impl ResultSink for JsonLinesSink {

	fn record(&mut self, record:Record) -> Result<(), DigSigProcErr> {
		match &record {
			Record::Acquisition(a) => self.write_line("acquisition".to_string(), a),
			Record::Tracking(t) => self.write_line(Self::tracking_suffix(t.prn, t.signal), t),
			Record::Measurement(m) => self.write_line("measurements".to_string(), m),
		}
	}

	fn measurement_epoch(&mut self, epoch:&MeasurementEpoch) -> Result<(), DigSigProcErr> {
		self.write_line("measurements".to_string(), epoch)
	}

	fn flush(&mut self) -> Result<(), DigSigProcErr> {
		for w in self.streams.values_mut() { w.flush()?; }
		Ok(())
	}

}

/// Reads back one JSON-lines tracking stream
pub fn read_tracking_stream<R: Read>(src:R) -> Result<Vec<TrackingSample>, DigSigProcErr> {
	let stream = serde_json::Deserializer::from_reader(src).into_iter::<TrackingSample>();
	Ok(stream.collect::<Result<Vec<TrackingSample>, serde_json::Error>>()?)
}

/// Text listing of every tracking sample, all channels merged by absolute sample
pub fn combined_dump(records:&[Record]) -> String {
	let mut streams:BTreeMap<(usize, SignalKind), Vec<&TrackingSample>> = BTreeMap::new();
	for r in records {
		if let Record::Tracking(t) = r { streams.entry((t.prn, t.signal)).or_insert_with(Vec::new).push(t); }
	}

	streams.into_iter()
		.map(|(_, v)| v.into_iter())
		.kmerge_by(|a, b| a.absolute_sample < b.absolute_sample)
		.map(|t| format!("{:>12} {:>3} {:<9} {:>8} {:>10.4} {:>12.3} {:>13.3} {:>10.1} {:>10.1} {} {} {:>5.1}",
			t.absolute_sample, t.prn, format!("{:?}", t.signal), t.ms_tracked, t.code_phase, t.carrier_freq, t.code_freq,
			t.i_p, t.q_p, t.lock_detect_outo as u8, t.lock_detect_outp as u8, t.cn0_dbhz))
		.join("\n")
}

#[cfg(test)]
mod tests {

	use super::*;
	use crate::gnss::acquisition::AcquisitionStatus;

	fn acq(prn:usize, snr:f64) -> AcquisitionResult {
		AcquisitionResult{ prn, signal: SignalKind::GpsL1Ca, carrier_freq_hz: 4.092e6 + 250.0, code_phase_chips: 12.5,
			snr, status: AcquisitionStatus::Acquired, sample_index: 0 }
	}

	fn trk(prn:usize, absolute_sample:u64) -> TrackingSample {
		TrackingSample{ prn, signal: SignalKind::GpsL1Ca, absolute_sample, ms_tracked: absolute_sample / 1000,
			code_phase: 0.0, carrier_freq: 1000.0, code_freq: 1.023e6, i_p: 100.0, q_p: -3.0,
			lock_detect_outo: true, lock_detect_outp: true, cn0_dbhz: 44.0 }
	}

	fn scratch(name:&str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("gnss_records_{}_{}", name, std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		dir
	}

	#[test]
	fn acquisition_results_saved_by_snr() {
		let mut buf:Vec<u8> = vec![];
		save_acquisition_results(&mut buf, &[acq(4, 21.0), acq(9, 35.0), acq(2, 28.0)]).unwrap();
		let loaded = load_acquisition_results(&buf[..]).unwrap();
		let prns:Vec<usize> = loaded.iter().map(|a| a.prn).collect();
		assert_eq!(prns, vec![9, 2, 4]);
		assert_eq!(loaded[0], acq(9, 35.0));
	}

	#[test]
	fn unknown_version_is_rejected() {
		let text = r#"{"format_version": 7, "records": []}"#;
		assert!(matches!(load_records(text.as_bytes()), Err(DigSigProcErr::UnsupportedVersion(7))));
	}

	#[test]
	fn records_are_tagged() {
		let mut buf:Vec<u8> = vec![];
		save_records(&mut buf, &[Record::Tracking(trk(3, 10))]).unwrap();
		let text = String::from_utf8(buf.clone()).unwrap();
		assert!(text.contains("\"type\": \"Tracking\""));
		assert_eq!(load_records(&buf[..]).unwrap(), vec![Record::Tracking(trk(3, 10))]);
	}

	#[test]
	fn dump_merges_channels_by_sample() {
		let records = vec![
			Record::Tracking(trk(5, 0)), Record::Tracking(trk(5, 2000)), Record::Tracking(trk(5, 4000)),
			Record::Acquisition(acq(5, 30.0)),
			Record::Tracking(trk(12, 900)), Record::Tracking(trk(12, 2900)),
		];
		let dump = combined_dump(&records);
		let samples:Vec<u64> = dump.lines().map(|l| l.split_whitespace().next().unwrap().parse().unwrap()).collect();
		assert_eq!(samples, vec![0, 900, 2000, 2900, 4000]);
	}

	#[test]
	fn json_lines_one_stream_per_channel() {
		let base = scratch("jsonl").join("run");
		let mut sink = JsonLinesSink::new(&base);
		sink.record(Record::Tracking(trk(5, 0))).unwrap();
		sink.record(Record::Tracking(trk(12, 100))).unwrap();
		sink.record(Record::Tracking(trk(5, 2000))).unwrap();
		sink.flush().unwrap();

		let path = sink.stream_path(&JsonLinesSink::tracking_suffix(5, SignalKind::GpsL1Ca));
		assert_eq!(path.file_name().unwrap().to_string_lossy(), "run_GpsL1Ca_prn5.jsonl");
		let prn5 = read_tracking_stream(File::open(path).unwrap()).unwrap();
		assert_eq!(prn5, vec![trk(5, 0), trk(5, 2000)]);
		let prn12 = read_tracking_stream(File::open(sink.stream_path("GpsL1Ca_prn12")).unwrap()).unwrap();
		assert_eq!(prn12.len(), 1);
	}

}
