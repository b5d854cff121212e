//! Asset data model and mesh consolidation.

pub mod import;

use crate::error::PipelineError;
use crate::graph::MaterialGraph;
use glam::{Vec2, Vec3};

/// One imported mesh primitive with its own material, optional UV channel
/// and optional per-corner color. All per-corner vectors hold
/// `indices.len() * 3` entries.
#[derive(Clone, Debug)]
pub struct MeshPrimitive {
	pub positions: Vec<Vec3>,
	pub indices: Vec<[u32; 3]>,
	pub normals: Vec<Vec3>,
	pub uv: Option<Vec<Vec2>>,
	pub corner_colors: Option<Vec<[f32; 4]>>,
	pub material: MaterialGraph,
}

/// A whole imported asset; read-only once imported.
#[derive(Clone, Debug)]
pub struct Asset {
	pub name: String,
	pub primitives: Vec<MeshPrimitive>,
}

#[derive(Clone, Debug)]
pub struct UvChannel {
	pub name: String,
	/// Per corner, `faces.len() * 3` entries.
	pub coords: Vec<Vec2>,
}

#[derive(Clone, Debug)]
pub struct ColorAttribute {
	pub name: String,
	/// Per corner, `faces.len() * 3` entries.
	pub values: Vec<[f32; 4]>,
}

/// The merged mesh the whole pipeline operates on. Exactly one UV channel
/// is active at any time; material slots stay per-face until finalization
/// collapses them to one.
#[derive(Clone, Debug)]
pub struct ConsolidatedMesh {
	pub positions: Vec<Vec3>,
	pub faces: Vec<[u32; 3]>,
	/// Per corner.
	pub normals: Vec<Vec3>,
	pub uv_channels: Vec<UvChannel>,
	active_uv: usize,
	pub colors: ColorAttribute,
	pub material_slots: Vec<MaterialGraph>,
	/// Per face, an index into `material_slots`.
	pub face_slots: Vec<u32>,
}

impl ConsolidatedMesh {
	pub fn active_uv(&self) -> &UvChannel {
		&self.uv_channels[self.active_uv]
	}

	/// Adds a channel and makes it the single active one.
	pub fn add_uv_channel(&mut self, channel: UvChannel) {
		self.uv_channels.push(channel);
		self.active_uv = self.uv_channels.len() - 1;
	}

	/// Drops every channel except the active one, as the last step before
	/// export.
	pub fn retain_active_uv(&mut self) {
		let active = self.uv_channels.swap_remove(self.active_uv);
		self.uv_channels = vec![active];
		self.active_uv = 0;
	}

	/// Replaces all material slots with the one final material.
	pub fn finalize_material(&mut self, material: MaterialGraph) {
		self.material_slots = vec![material];
		self.face_slots = vec![0; self.faces.len()];
	}

	pub fn corner_position(&self, face: usize, corner: usize) -> Vec3 {
		self.positions[self.faces[face][corner] as usize]
	}

	pub fn face_normal(&self, face: usize) -> Vec3 {
		let [a, b, c] = self.faces[face];
		let (a, b, c) = (
			self.positions[a as usize],
			self.positions[b as usize],
			self.positions[c as usize],
		);
		(b - a).cross(c - a).normalize_or_zero()
	}
}

pub const DEFAULT_UV_NAME: &str = "UVMap";
pub const DEFAULT_COLOR_NAME: &str = "Col";

/// Merges all mesh primitives of an asset into one [`ConsolidatedMesh`].
///
/// Exactly one UV channel survives (created zeroed under `uv_name` if no
/// primitive had one), exactly one per-corner color attribute survives
/// (defaulted to opaque white), and the per-face material slot assignment
/// is preserved. Primitives sharing a material graph by name share a slot.
pub fn consolidate(asset: &Asset, uv_name: &str, color_name: &str) -> Result<ConsolidatedMesh, PipelineError> {
	if asset.primitives.is_empty() {
		return Err(PipelineError::EmptyAsset);
	}

	let mut mesh = ConsolidatedMesh {
		positions: Vec::new(),
		faces: Vec::new(),
		normals: Vec::new(),
		uv_channels: vec![UvChannel {
			name: uv_name.to_string(),
			coords: Vec::new(),
		}],
		active_uv: 0,
		colors: ColorAttribute {
			name: color_name.to_string(),
			values: Vec::new(),
		},
		material_slots: Vec::new(),
		face_slots: Vec::new(),
	};

	for primitive in &asset.primitives {
		let slot = match mesh.material_slots.iter().position(|m| m.name == primitive.material.name) {
			Some(slot) => slot as u32,
			None => {
				mesh.material_slots.push(primitive.material.clone());
				(mesh.material_slots.len() - 1) as u32
			}
		};

		let base = mesh.positions.len() as u32;
		mesh.positions.extend_from_slice(&primitive.positions);
		for (face, indices) in primitive.indices.iter().enumerate() {
			mesh.faces.push([base + indices[0], base + indices[1], base + indices[2]]);
			mesh.face_slots.push(slot);
			for corner in 0..3 {
				let corner_index = face * 3 + corner;
				mesh.normals.push(primitive.normals[corner_index]);
				mesh.uv_channels[0].coords.push(match &primitive.uv {
					Some(uv) => uv[corner_index],
					None => Vec2::ZERO,
				});
				mesh.colors.values.push(match &primitive.corner_colors {
					Some(colors) => colors[corner_index],
					None => [1., 1., 1., 1.],
				});
			}
		}
	}

	Ok(mesh)
}
