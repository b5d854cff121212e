use bake_batch::worker::SubprocessRunner;
use bake_batch::{BatchSettings, run_batch};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct BatchArgs {
	#[arg(short, long)]
	input_dir: PathBuf,
	#[arg(short, long)]
	output_dir: PathBuf,
	/// Path to the single-asset pipeline binary.
	#[arg(short, long)]
	pipeline_exe: PathBuf,
	/// Checkpoint file; defaults to bake_state.txt next to the outputs.
	#[arg(long)]
	state_file: Option<PathBuf>,
	/// Failure log; defaults to bake_glb.log next to the outputs.
	#[arg(long)]
	log_file: Option<PathBuf>,
	/// Override the worker's bake resolution.
	#[arg(long)]
	bake_resolution: Option<u32>,
	/// Override the worker's dilation margin.
	#[arg(long)]
	bake_margin: Option<u32>,
}

pub fn main() -> anyhow::Result<()> {
	env_logger::init();
	let args = BatchArgs::parse();
	let settings = BatchSettings {
		state_file: args.state_file.unwrap_or_else(|| args.output_dir.join("bake_state.txt")),
		log_file: args.log_file.unwrap_or_else(|| args.output_dir.join("bake_glb.log")),
		input_dir: args.input_dir,
		output_dir: args.output_dir,
	};
	std::fs::create_dir_all(&settings.output_dir)?;

	let mut runner = SubprocessRunner::new(args.pipeline_exe);
	runner.resolution = args.bake_resolution;
	runner.margin = args.bake_margin;
	let report = run_batch(&settings, &mut runner)?;
	println!(
		"{} assets attempted, {} succeeded, {} failed",
		report.attempted, report.succeeded, report.failed
	);
	Ok(())
}
