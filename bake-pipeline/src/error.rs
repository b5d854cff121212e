use crate::engine::BackendError;
use std::fmt::{Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum PipelineError {
	EmptyAsset,
	EmptyShotGrid,
	PrimitiveMustBeTriangleList,
	NoVertexPositions,
	Import(gltf::Error),
	Format(glb_codec::error::GlbError),
	RenderBackend(BackendError),
	ImageEncode(image::ImageError),
	Io(io::Error),
}

impl Display for PipelineError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			PipelineError::EmptyAsset => f.write_str("Asset contains zero mesh primitives"),
			PipelineError::EmptyShotGrid => f.write_str("Shot settings generate zero camera shots"),
			PipelineError::PrimitiveMustBeTriangleList => f.write_str("All primitives must be triangle lists"),
			PipelineError::NoVertexPositions => f.write_str("A mesh primitive exists with no vertex positions"),
			PipelineError::Import(err) => write!(f, "Importing the asset failed: {err}"),
			PipelineError::Format(err) => Display::fmt(err, f),
			PipelineError::RenderBackend(err) => write!(f, "Render backend failed: {err}"),
			PipelineError::ImageEncode(err) => write!(f, "Encoding a baked image failed: {err}"),
			PipelineError::Io(err) => Display::fmt(err, f),
		}
	}
}

impl std::error::Error for PipelineError {}

impl From<gltf::Error> for PipelineError {
	fn from(value: gltf::Error) -> Self {
		Self::Import(value)
	}
}

impl From<glb_codec::error::GlbError> for PipelineError {
	fn from(value: glb_codec::error::GlbError) -> Self {
		Self::Format(value)
	}
}

impl From<BackendError> for PipelineError {
	fn from(value: BackendError) -> Self {
		Self::RenderBackend(value)
	}
}

impl From<image::ImageError> for PipelineError {
	fn from(value: image::ImageError) -> Self {
		Self::ImageEncode(value)
	}
}

impl From<io::Error> for PipelineError {
	fn from(value: io::Error) -> Self {
		Self::Io(value)
	}
}
