//! Batch orchestration over a directory of assets: lexicographic
//! enumeration, one subprocess per asset, a plain-integer checkpoint
//! written after every attempt so a crashed run resumes where it stopped.

pub mod checkpoint;
pub mod logfile;
pub mod worker;

use crate::checkpoint::Checkpoint;
use crate::logfile::BatchLog;
use crate::worker::{PipelineTask, TaskRunner, WorkerOutcome, WorkerStatus};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Clone, Debug)]
pub struct BatchSettings {
	pub input_dir: PathBuf,
	pub output_dir: PathBuf,
	pub state_file: PathBuf,
	pub log_file: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
	pub attempted: usize,
	pub succeeded: usize,
	pub failed: usize,
}

/// All `*.glb` files directly inside `dir`, lexicographic by file name.
/// The order must be stable across runs or the checkpoint is meaningless.
pub fn enumerate_assets(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
	let mut assets = Vec::new();
	for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
		let entry = entry?;
		if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "glb") {
			assets.push(entry.path().to_path_buf());
		}
	}
	Ok(assets)
}

pub fn run_batch(settings: &BatchSettings, runner: &mut dyn TaskRunner) -> anyhow::Result<BatchReport> {
	let assets = enumerate_assets(&settings.input_dir)?;
	let checkpoint = Checkpoint::new(settings.state_file.clone());
	let failure_log = BatchLog::new(settings.log_file.clone());

	let start = checkpoint.load();
	if start > 0 {
		log::info!("resuming at asset {start} of {}", assets.len());
	}

	let mut report = BatchReport::default();
	for (index, input) in assets.iter().enumerate().skip(start) {
		let asset = input
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();
		let stem = input.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();
		let task = PipelineTask {
			input: input.clone(),
			output: settings.output_dir.join(format!("{stem}_baked.glb")),
		};

		log::info!("[{}/{}] {asset}", index + 1, assets.len());
		report.attempted += 1;
		let outcome = WorkerOutcome {
			asset,
			status: match runner.run(&task) {
				Ok(status) => status,
				// spawn failures count as a failed attempt, not a batch abort
				Err(err) => WorkerStatus::Failed {
					code: None,
					stderr: err.to_string(),
				},
			},
		};

		match &outcome.status {
			WorkerStatus::Success => report.succeeded += 1,
			WorkerStatus::Failed { code, stderr } => {
				report.failed += 1;
				let code = code.map_or("signal".to_string(), |code| code.to_string());
				log::error!("{} failed (exit {code})", outcome.asset);
				let message = format!("exit {code}: {}", stderr.trim_end());
				if let Err(err) = failure_log.error(&outcome.asset, &message) {
					log::warn!("failure log not written: {err}");
				}
			}
		}

		// a missed checkpoint redoes work on resume, it never stops the run
		if let Err(err) = checkpoint.advance_to(index + 1) {
			log::warn!("checkpoint not persisted: {err}");
		}
	}
	Ok(report)
}
