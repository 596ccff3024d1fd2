
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use clap::{Arg, App};
use colored::*;
use env_logger::{Builder, Env};
use log::info;

use gnss_receiver_core::{Configuration, DigSigProcErr, Scheduler, StopReason};
use gnss_receiver_core::gnss::signal::SignalKind;
use gnss_receiver_core::gnss::tracking::{ChannelState, ChannelStatus};
use gnss_receiver_core::io::FileSource;
use gnss_receiver_core::io::records::{self, JsonLinesSink, MemorySink, Record, ResultSink};

// Forwards to the JSON-lines streams and keeps the tracking records for the combined dump
struct DumpingSink {
	streams:JsonLinesSink,
	kept:Option<MemorySink>,
}

impl ResultSink for DumpingSink {

	fn record(&mut self, record:Record) -> Result<(), DigSigProcErr> {
		if let (Some(kept), Record::Tracking(_)) = (self.kept.as_mut(), &record) { kept.record(record.clone())?; }
		self.streams.record(record)
	}

	fn flush(&mut self) -> Result<(), DigSigProcErr> { self.streams.flush() }

}

fn parse_prns(s:&str) -> Result<Vec<usize>, DigSigProcErr> {
	let bad = || DigSigProcErr::InvalidConfiguration(format!("unable to parse PRN list '{}'", s));
	let mut prns:Vec<usize> = vec![];
	for part in s.split(',').map(|p| p.trim()).filter(|p| !p.is_empty()) {
		match part.find('-') {
			Some(idx) => {
				let lo:usize = part[..idx].parse().map_err(|_| bad())?;
				let hi:usize = part[idx+1..].parse().map_err(|_| bad())?;
				prns.extend(lo..=hi);
			},
			None => prns.push(part.parse().map_err(|_| bad())?),
		}
	}
	Ok(prns)
}

fn main() -> Result<(), DigSigProcErr> {

	Builder::from_env(Env::default().default_filter_or("info"))
		.format_timestamp_secs()
		.format_module_path(false)
		.init();

	let matches = App::new("GNSS Receiver")
		.version("0.1.0")
		.about("Acquires and tracks GPS satellites in a file of int8 IF samples and writes tracking streams and measurement epochs")
		.arg(Arg::with_name("config")
			.short("c").long("config")
			.help("JSON receiver configuration; defaults are used when omitted")
			.takes_value(true))
		.arg(Arg::with_name("input")
			.short("i").long("input")
			.help("Input file of int8 samples, bands interleaved in configuration order")
			.required(true).takes_value(true))
		.arg(Arg::with_name("prns")
			.short("p").long("prns")
			.help("PRNs to search, e.g. 1-32 or 3,7,22")
			.takes_value(true))
		.arg(Arg::with_name("max_seconds")
			.short("m").long("max-seconds")
			.takes_value(true))
		.arg(Arg::with_name("output")
			.short("o").long("output")
			.help("Base name of the output files")
			.takes_value(true))
		.arg(Arg::with_name("dump")
			.short("d").long("dump")
			.help("Also write every tracking record to one text file ordered by sample"))
		.get_matches();

	let config:Configuration = match matches.value_of("config") {
		Some(fname) => Configuration::from_json_file(fname)?,
		None => Configuration::default(),
	};
	let config = Arc::new(config);

	let fname:&str = matches.value_of("input").ok_or_else(|| DigSigProcErr::InvalidConfiguration("no input file".to_string()))?;
	let prns:Vec<usize> = parse_prns(matches.value_of("prns").unwrap_or("1-32"))?;
	let max_samples:Option<u64> = match matches.value_of("max_seconds") {
		Some(s) => {
			let secs:f64 = s.parse().map_err(|_| DigSigProcErr::InvalidConfiguration(format!("unable to parse max seconds '{}'", s)))?;
			Some((secs * config.sampling_freq_hz) as u64)
		},
		None => None,
	};
	let base:String = matches.value_of("output").unwrap_or("gnss").to_string();

	eprintln!("Processing {} at {} [samples/sec], PRNs {:?}", fname, config.sampling_freq_hz, prns);

	let source = FileSource::from_config(BufReader::new(File::open(fname)?), &config)?;
	let mut scheduler = Scheduler::new(config.clone(), source)?;

	let stop = scheduler.stop_handle();
	ctrlc::set_handler(move || {
		stop.store(true, Ordering::SeqCst);
	}).map_err(|e| DigSigProcErr::InvalidConfiguration(format!("unable to install Ctrl-C handler: {}", e)))?;

	let targets:Vec<(usize, SignalKind)> = prns.iter().map(|p| (*p, SignalKind::GpsL1Ca)).collect();
	let acquired = scheduler.acquire(&targets)?;
	if acquired.is_empty() {
		eprintln!("{}", "No satellites acquired".red());
		return Err(DigSigProcErr::NoSatellitesAcquired);
	}
	for r in acquired.iter() {
		eprintln!("{}", format!("PRN {:2}: {:9.1} [Hz], {:7.2} [chips], SNR {:5.1}", r.prn, r.carrier_freq_hz, r.code_phase_chips, r.snr).green());
	}
	records::save_acquisition_results(BufWriter::new(File::create(format!("{}_acquisition.json", base))?), &acquired)?;

	let mut sink = DumpingSink{ streams: JsonLinesSink::new(&base), kept: if matches.is_present("dump") { Some(MemorySink::new()) } else { None } };
	for r in acquired.iter() { sink.record(Record::Acquisition(r.clone()))?; }
	scheduler.start_channels(&acquired)?;
	let summary = scheduler.run(&mut sink, max_samples)?;

	if let Some(kept) = sink.kept.as_ref() {
		let mut f = BufWriter::new(File::create(format!("{}_combined.txt", base))?);
		f.write_all(records::combined_dump(&kept.records).as_bytes())?;
		f.write_all(b"\n")?;
		f.flush()?;
	}

	let reason = match &summary.stop_reason {
		StopReason::EndOfStream       => "end of stream".green(),
		StopReason::SampleLimit       => "sample limit".green(),
		StopReason::Stopped           => "stopped".yellow(),
		StopReason::ProviderFailed(e) => format!("provider failed: {}", e).red(),
	};
	eprintln!("Run ended ({}) after {:.3} [sec], {} measurement epochs", reason, (summary.samples_processed as f64) / config.sampling_freq_hz, summary.epochs);
	for ch in summary.channels.iter() {
		let line = format!("PRN {:2} {:?}: {:?}, {} [ms] tracked, Doppler {:8.1} [Hz]", ch.prn, ch.signal, ch.state, ch.ms_tracked, ch.doppler_hz);
		match (ch.status, ch.state) {
			(ChannelStatus::Lost(r), _)            => eprintln!("{} {}", line.red(), format!("lost ({:?})", r).red()),
			(_, ChannelState::Measuring)           => eprintln!("{}", line.green()),
			_                                      => eprintln!("{}", line.yellow()),
		}
	}
	info!("Results written with base name {}", base);

	Ok(())

}
