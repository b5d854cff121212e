//! The seam towards the external 3D engine.
//!
//! Everything the pipeline needs from a renderer goes through
//! [`RenderBackend`]: a path-traced bake parameterized by pass type,
//! margin and camera, plus a persistent project-snapshot save. The call is
//! opaque and blocking; there is no cancellation or timeout at this
//! granularity, a stalled bake stalls the asset's process.

pub mod software;

use crate::bake::BakePass;
use crate::frame::CameraFrame;
use crate::graph::MaterialGraph;
use crate::scene::ConsolidatedMesh;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug)]
pub enum BackendError {
	Bake(String),
	Snapshot(String),
}

impl Display for BackendError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			BackendError::Bake(msg) => write!(f, "bake operation failed: {msg}"),
			BackendError::Snapshot(msg) => write!(f, "snapshot save failed: {msg}"),
		}
	}
}

impl std::error::Error for BackendError {}

pub trait RenderBackend {
	/// Runs one bake pass over the mesh with the given per-material pass
	/// graphs (each already carrying the active bake target) and returns
	/// the pixel buffer, `pass.size * pass.size` RGBA entries.
	fn bake(
		&mut self,
		mesh: &ConsolidatedMesh,
		graphs: &[MaterialGraph],
		pass: &BakePass,
		camera: Option<&CameraFrame>,
	) -> Result<Vec<[f32; 4]>, BackendError>;

	/// Saves a debug snapshot of the backend's scene state.
	fn save_snapshot(&mut self, mesh: &ConsolidatedMesh, path: &Path) -> Result<(), BackendError>;
}
