//! Typed subprocess worker around the single-asset binary.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// One asset's bake job, fully resolved paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineTask {
	pub input: PathBuf,
	pub output: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerStatus {
	Success,
	Failed {
		/// None when the worker was killed by a signal.
		code: Option<i32>,
		stderr: String,
	},
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerOutcome {
	pub asset: String,
	pub status: WorkerStatus,
}

/// Runs one task to completion. Injectable so the orchestrator can be
/// tested without spawning real processes.
pub trait TaskRunner {
	fn run(&mut self, task: &PipelineTask) -> io::Result<WorkerStatus>;
}

impl<F: FnMut(&PipelineTask) -> io::Result<WorkerStatus>> TaskRunner for F {
	fn run(&mut self, task: &PipelineTask) -> io::Result<WorkerStatus> {
		self(task)
	}
}

/// Spawns the single-asset pipeline binary per task and captures its
/// output. Blocking, no timeout.
pub struct SubprocessRunner {
	pub exe: PathBuf,
	/// Forwarded as `--bake-resolution` when set.
	pub resolution: Option<u32>,
	/// Forwarded as `--bake-margin` when set.
	pub margin: Option<u32>,
}

impl SubprocessRunner {
	pub fn new(exe: PathBuf) -> Self {
		SubprocessRunner {
			exe,
			resolution: None,
			margin: None,
		}
	}

	/// The full argument list for one task. Debug snapshots are always
	/// disabled, they would triple the disk footprint of a large batch.
	fn args(&self, task: &PipelineTask) -> Vec<OsString> {
		let mut args: Vec<OsString> = vec![
			"--input-file".into(),
			task.input.clone().into(),
			"--output-file".into(),
			task.output.clone().into(),
			"--disable-export-debug".into(),
		];
		if let Some(resolution) = self.resolution {
			args.push("--bake-resolution".into());
			args.push(resolution.to_string().into());
		}
		if let Some(margin) = self.margin {
			args.push("--bake-margin".into());
			args.push(margin.to_string().into());
		}
		args
	}
}

impl TaskRunner for SubprocessRunner {
	fn run(&mut self, task: &PipelineTask) -> io::Result<WorkerStatus> {
		let output = Command::new(&self.exe).args(self.args(task)).output()?;
		if output.status.success() {
			Ok(WorkerStatus::Success)
		} else {
			Ok(WorkerStatus::Failed {
				code: output.status.code(),
				stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
			})
		}
	}
}
