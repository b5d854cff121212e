//! Bake pass descriptions, image lifecycle and the per-asset state machine.

use crate::engine::RenderBackend;
use crate::error::PipelineError;
use crate::frame::CameraFrame;
use crate::graph::MaterialGraph;
use crate::scene::ConsolidatedMesh;
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PassKind {
	Normal,
	Color,
	MetallicRoughness,
}

impl PassKind {
	/// Normal and metallic-roughness data is raw values, only the color
	/// pass is display-encoded.
	pub fn colorspace(&self) -> Colorspace {
		match self {
			PassKind::Color => Colorspace::Srgb,
			PassKind::Normal | PassKind::MetallicRoughness => Colorspace::Linear,
		}
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Colorspace {
	Linear,
	Srgb,
}

#[derive(Copy, Clone, Debug)]
pub struct BakePass {
	pub kind: PassKind,
	/// Target image edge length in pixels.
	pub size: u32,
	/// Dilation in pixels to suppress seam bleeding.
	pub margin: u32,
}

#[derive(Clone, Debug)]
pub struct BakeImage {
	pub name: String,
	pub size: u32,
	pub colorspace: Colorspace,
	pub pixels: Vec<[f32; 4]>,
}

/// Stages of one asset's run. `Failed` is reachable from every
/// non-terminal stage; there are no retries within a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineStage {
	Idle,
	Consolidating,
	Unwrapping,
	BakingNormal,
	BakingColor,
	BakingMr,
	Finalizing,
	Exporting,
	Done,
	Failed(&'static str),
}

impl PipelineStage {
	pub fn is_terminal(&self) -> bool {
		matches!(self, PipelineStage::Done | PipelineStage::Failed(_))
	}

	pub fn name(&self) -> &'static str {
		match self {
			PipelineStage::Idle => "idle",
			PipelineStage::Consolidating => "consolidating",
			PipelineStage::Unwrapping => "unwrapping",
			PipelineStage::BakingNormal => "baking normal",
			PipelineStage::BakingColor => "baking color",
			PipelineStage::BakingMr => "baking metallic-roughness",
			PipelineStage::Finalizing => "finalizing",
			PipelineStage::Exporting => "exporting",
			PipelineStage::Done => "done",
			PipelineStage::Failed(during) => during,
		}
	}
}

impl Display for PipelineStage {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			PipelineStage::Failed(during) => write!(f, "failed while {during}"),
			stage => f.write_str(stage.name()),
		}
	}
}

/// Drives the external renderer's bake operation per pass and owns the
/// bake-image lifecycle.
pub struct BakeExecutor<'a, B: RenderBackend> {
	backend: &'a mut B,
	resolution: u32,
	margin: u32,
}

impl<'a, B: RenderBackend> BakeExecutor<'a, B> {
	pub fn new(backend: &'a mut B, resolution: u32, margin: u32) -> Self {
		Self {
			backend,
			resolution,
			margin,
		}
	}

	/// Allocates the pass's target image, attaches it as the active bake
	/// target across every material graph and runs the backend's bake.
	pub fn run_pass(
		&mut self,
		mesh: &ConsolidatedMesh,
		graphs: &[MaterialGraph],
		kind: PassKind,
		image_name: &str,
		camera: Option<&CameraFrame>,
	) -> Result<BakeImage, PipelineError> {
		let pass = BakePass {
			kind,
			size: self.resolution,
			margin: self.margin,
		};
		let targeted: Vec<MaterialGraph> = graphs.iter().map(|g| g.with_bake_target(image_name)).collect();

		log::debug!("baking {kind:?} into {image_name} at {0}x{0}", self.resolution);
		let pixels = self.backend.bake(mesh, &targeted, &pass, camera)?;
		debug_assert_eq!(pixels.len(), (pass.size * pass.size) as usize);

		Ok(BakeImage {
			name: image_name.to_string(),
			size: pass.size,
			colorspace: kind.colorspace(),
			pixels,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stage_terminality() {
		assert!(PipelineStage::Done.is_terminal());
		assert!(PipelineStage::Failed("baking color").is_terminal());
		assert!(!PipelineStage::BakingNormal.is_terminal());
	}

	#[test]
	fn pass_colorspaces() {
		assert_eq!(PassKind::Color.colorspace(), Colorspace::Srgb);
		assert_eq!(PassKind::Normal.colorspace(), Colorspace::Linear);
		assert_eq!(PassKind::MetallicRoughness.colorspace(), Colorspace::Linear);
	}
}
