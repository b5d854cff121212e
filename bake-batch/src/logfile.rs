//! Append-only failure log kept next to the state file, so a whole
//! overnight run can be audited afterwards.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

pub struct BatchLog {
	path: PathBuf,
}

impl BatchLog {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	pub fn error(&self, asset: &str, message: &str) -> io::Result<()> {
		let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
		let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
		writeln!(file, "{timestamp} ERROR {asset}: {message}")
	}
}
