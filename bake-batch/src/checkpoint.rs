//! Crash-resume checkpoint, persisted as a plain integer file.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Index of the next asset to process. Monotone: `advance_to` never moves
/// the persisted value backwards.
pub struct Checkpoint {
	path: PathBuf,
}

impl Checkpoint {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	/// An absent or unreadable state file restarts from the beginning.
	pub fn load(&self) -> usize {
		match fs::read_to_string(&self.path) {
			Ok(contents) => match contents.trim().parse() {
				Ok(index) => index,
				Err(_) => {
					log::warn!("corrupt state file {}, starting over", self.path.display());
					0
				}
			},
			Err(_) => 0,
		}
	}

	pub fn advance_to(&self, index: usize) -> io::Result<()> {
		if index < self.load() {
			return Ok(());
		}
		fs::write(&self.path, format!("{index}\n"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::{SystemTime, UNIX_EPOCH};

	fn scratch_file(name: &str) -> PathBuf {
		let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
		std::env::temp_dir().join(format!("bake-batch-{name}-{}-{nanos}", std::process::id()))
	}

	#[test]
	fn absent_file_loads_zero() {
		let checkpoint = Checkpoint::new(scratch_file("absent"));
		assert_eq!(checkpoint.load(), 0);
	}

	#[test]
	fn corrupt_file_loads_zero() {
		let path = scratch_file("corrupt");
		fs::write(&path, "not a number").unwrap();
		let checkpoint = Checkpoint::new(path.clone());
		assert_eq!(checkpoint.load(), 0);
		fs::remove_file(path).unwrap();
	}

	#[test]
	fn roundtrip_and_monotonicity() {
		let path = scratch_file("roundtrip");
		let checkpoint = Checkpoint::new(path.clone());
		checkpoint.advance_to(7).unwrap();
		assert_eq!(checkpoint.load(), 7);
		checkpoint.advance_to(3).unwrap();
		assert_eq!(checkpoint.load(), 7);
		checkpoint.advance_to(8).unwrap();
		assert_eq!(checkpoint.load(), 8);
		fs::remove_file(path).unwrap();
	}
}
