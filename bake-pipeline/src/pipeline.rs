//! The single-asset pipeline: import, consolidate, unwrap, bake the three
//! passes in their required order, finalize, export.
//!
//! Every stage receives its operands explicitly; nothing is inferred from
//! ambient scene state. Pass order Normal -> Color -> MetallicRoughness is
//! a correctness invariant: the Color rewrite replaces each material's
//! surface output, so the original Base-Color sources must be captured
//! from the untouched graphs first.

use crate::atlas::{AtlasSettings, unwrap_and_pack};
use crate::bake::{BakeExecutor, BakeImage, PassKind, PipelineStage};
use crate::engine::RenderBackend;
use crate::error::PipelineError;
use crate::frame::{BoundingSphere, ShotSettings, generate_shots};
use crate::graph::MaterialGraph;
use crate::graph::synthesize::{
	BaseColorSource, build_final_material, capture_base_color_source, synthesize_color_pass, synthesize_mr_pass,
};
use crate::scene::{Asset, ConsolidatedMesh, DEFAULT_COLOR_NAME, consolidate};
use glb_codec::writer::{ExportMesh, ExportTextures, write_glb};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct PipelineSettings {
	pub resolution: u32,
	pub margin: u32,
	/// Name of the source UV channel consolidation normalizes to.
	pub old_uv_name: String,
	/// Name of the atlas UV channel the bake renders against.
	pub uv_name: String,
	pub color_image_name: String,
	pub normal_image_name: String,
	pub mr_image_name: String,
	pub final_material_name: String,
	pub pack_iterations: u32,
	pub export_debug_snapshot: bool,
	/// Camera grid for the view-gated color captures.
	pub shots: ShotSettings,
}

impl Default for PipelineSettings {
	fn default() -> Self {
		Self {
			resolution: 2048,
			margin: 4,
			old_uv_name: "UVMap".to_string(),
			uv_name: "BakedUV".to_string(),
			color_image_name: "BakedTexture".to_string(),
			normal_image_name: "NormalBake".to_string(),
			mr_image_name: "MetallicRoughnessBake".to_string(),
			final_material_name: "BakedMaterial".to_string(),
			pack_iterations: 2,
			export_debug_snapshot: true,
			shots: ShotSettings::default(),
		}
	}
}

/// Everything `run_asset` produces: the serialized container plus the
/// finalized mesh for snapshot and inspection purposes.
#[derive(Debug)]
pub struct BakedAsset {
	pub glb: Vec<u8>,
	pub mesh: ConsolidatedMesh,
}

pub struct Pipeline<'a, B: RenderBackend> {
	backend: &'a mut B,
	settings: PipelineSettings,
	stage: PipelineStage,
}

impl<'a, B: RenderBackend> Pipeline<'a, B> {
	pub fn new(backend: &'a mut B, settings: PipelineSettings) -> Self {
		Self {
			backend,
			settings,
			stage: PipelineStage::Idle,
		}
	}

	pub fn stage(&self) -> PipelineStage {
		self.stage
	}

	fn enter(&mut self, stage: PipelineStage) {
		debug_assert!(!self.stage.is_terminal());
		log::info!("{stage}");
		self.stage = stage;
	}

	/// Bakes `input` and writes the result to `output`. On failure the
	/// stage is left at `Failed` with the stage the error surfaced in.
	pub fn run(&mut self, input: &Path, output: &Path) -> Result<(), PipelineError> {
		let result = self.run_inner(input, output);
		if let Err(err) = &result {
			self.stage = PipelineStage::Failed(self.stage.name());
			log::error!("{}: {err}", self.stage);
		}
		result
	}

	fn run_inner(&mut self, input: &Path, output: &Path) -> Result<(), PipelineError> {
		let asset = crate::scene::import::import_asset(input)?;
		let baked = self.run_asset(&asset)?;

		self.enter(PipelineStage::Exporting);
		fs::write(output, &baked.glb)?;
		log::info!("wrote {}", output.display());
		if self.settings.export_debug_snapshot {
			let debug_path = output.with_extension("debug.txt");
			// a lost snapshot loses a debugging aid, not the output
			if let Err(err) = self.backend.save_snapshot(&baked.mesh, &debug_path) {
				log::warn!("debug snapshot not saved: {err}");
			}
		}
		self.stage = PipelineStage::Done;
		Ok(())
	}

	/// Runs everything between import and serialization, returning the
	/// container bytes and the finalized mesh.
	pub fn run_asset(&mut self, asset: &Asset) -> Result<BakedAsset, PipelineError> {
		self.enter(PipelineStage::Consolidating);
		let mut mesh = consolidate(asset, &self.settings.old_uv_name, DEFAULT_COLOR_NAME)?;

		self.enter(PipelineStage::Unwrapping);
		let stats = unwrap_and_pack(
			&mut mesh,
			&AtlasSettings {
				pack_iterations: self.settings.pack_iterations,
				uv_name: self.settings.uv_name.clone(),
				..AtlasSettings::default()
			},
		);
		log::debug!("{} islands packed, pass areas {:?}", stats.islands, stats.pass_areas);

		let sphere = BoundingSphere::of_points(mesh.positions.iter().copied());
		let shots = generate_shots(sphere, &self.settings.shots);
		let camera = shots
			.first()
			.map(|shot| shot.world_camera(sphere.center))
			.ok_or(PipelineError::EmptyShotGrid)?;

		let mut executor = BakeExecutor::new(self.backend, self.settings.resolution, self.settings.margin);

		self.stage = PipelineStage::BakingNormal;
		log::info!("{}", self.stage);
		let normal = executor.run_pass(
			&mesh,
			&mesh.material_slots,
			PassKind::Normal,
			&self.settings.normal_image_name,
			Some(&camera),
		)?;

		// capture every slot's Base-Color source before any rewrite
		let captured: Vec<BaseColorSource> = mesh.material_slots.iter().map(capture_base_color_source).collect();

		// every shot bakes its own view-gated capture; compositing fills
		// the texels earlier views left black
		self.stage = PipelineStage::BakingColor;
		log::info!("{}", self.stage);
		let mut color: Option<BakeImage> = None;
		for shot in &shots {
			let view = shot.world_camera(sphere.center);
			let color_graphs: Vec<MaterialGraph> = mesh
				.material_slots
				.iter()
				.zip(&captured)
				.map(|(graph, &captured)| synthesize_color_pass(graph, captured, view.position))
				.collect();
			let capture = executor.run_pass(
				&mesh,
				&color_graphs,
				PassKind::Color,
				&self.settings.color_image_name,
				Some(&view),
			)?;
			color = Some(match color {
				Some(mut composite) => {
					composite_captures(&mut composite, &capture);
					composite
				}
				None => capture,
			});
		}
		// shots is non-empty, the first camera came from it
		let color = color.ok_or(PipelineError::EmptyShotGrid)?;

		self.stage = PipelineStage::BakingMr;
		log::info!("{}", self.stage);
		let mr_graphs: Vec<MaterialGraph> = mesh.material_slots.iter().map(synthesize_mr_pass).collect();
		let mr = executor.run_pass(
			&mesh,
			&mr_graphs,
			PassKind::MetallicRoughness,
			&self.settings.mr_image_name,
			Some(&camera),
		)?;

		self.enter(PipelineStage::Finalizing);
		mesh.finalize_material(build_final_material(
			&self.settings.final_material_name,
			&self.settings.uv_name,
			&color.name,
			&mr.name,
			&normal.name,
		));
		mesh.retain_active_uv();

		let textures = ExportTextures {
			base_color: encode_png(&color)?,
			normal: encode_png(&normal)?,
			metallic_roughness: encode_png(&mr)?,
			mime_type: "image/png".to_string(),
		};
		let glb = write_glb(&export_mesh(asset, &mesh), &textures, &self.settings.final_material_name)?;
		Ok(BakedAsset { glb, mesh })
	}
}

/// Expands the indexed mesh back to per-corner attribute streams.
fn export_mesh(asset: &Asset, mesh: &ConsolidatedMesh) -> ExportMesh {
	let corners = mesh.faces.len() * 3;
	let mut out = ExportMesh {
		name: asset.name.clone(),
		positions: Vec::with_capacity(corners),
		normals: Vec::with_capacity(corners),
		uvs: Vec::with_capacity(corners),
		colors: mesh.colors.values.clone(),
	};
	let uv = mesh.active_uv();
	for (face, indices) in mesh.faces.iter().enumerate() {
		for (corner, index) in indices.iter().enumerate() {
			out.positions.push(mesh.positions[*index as usize].to_array());
			out.normals.push(mesh.normals[face * 3 + corner].to_array());
			out.uvs.push(uv.coords[face * 3 + corner].to_array());
		}
	}
	out
}

/// Channel-wise maximum. The view-facing gate emits zero radiance for
/// texels a view cannot see, so any view that saw the texel wins.
fn composite_captures(composite: &mut BakeImage, capture: &BakeImage) {
	debug_assert_eq!(composite.pixels.len(), capture.pixels.len());
	for (base, new) in composite.pixels.iter_mut().zip(&capture.pixels) {
		for channel in 0..4 {
			base[channel] = base[channel].max(new[channel]);
		}
	}
}

fn encode_png(image: &BakeImage) -> Result<Vec<u8>, PipelineError> {
	let size = image.size;
	let raster = RgbaImage::from_fn(size, size, |x, y| {
		let p = image.pixels[(y * size + x) as usize];
		image::Rgba(p.map(|v| (v.clamp(0., 1.) * 255.) as u8))
	});
	let mut bytes = Cursor::new(Vec::new());
	DynamicImage::ImageRgba8(raster).write_to(&mut bytes, ImageFormat::Png)?;
	Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests;
