use std::process::ExitCode;

use clap::Parser;
use log::{error, LevelFilter};
use tilemin::{run, Args, Config, RunStatus};

fn main() -> ExitCode {
	let args = Args::parse();
	let level = match args.verbose {
		0 => LevelFilter::Info,
		1 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};
	env_logger::Builder::from_default_env().filter_level(level).init();
	match Config::from_args(args).and_then(|config| run(&config)) {
		Ok(RunStatus::UpToDate | RunStatus::Written(_)) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{} ({:?} error)", err, err.kind());
			ExitCode::FAILURE
		}
	}
}
