use super::*;
use crate::engine::software::SoftwareBaker;
use crate::frame::ShotSettings;
use crate::graph::{GraphBuilder, InputSocket, NodeKind, OutputSocket};
use crate::scene::MeshPrimitive;
use glam::{Vec2, Vec3};
use glb_codec::chunk::Glb;
use glb_codec::document::Document;

fn pbr_material(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> MaterialGraph {
	let mut b = GraphBuilder::new(name);
	let output = b.add(NodeKind::OutputMaterial);
	let principled = b.add(NodeKind::PrincipledBsdf {
		base_color,
		metallic,
		roughness,
	});
	b.link(principled, OutputSocket::Shader, output, InputSocket::Surface);
	b.build()
}

fn quad(offset: Vec3, material: MaterialGraph) -> MeshPrimitive {
	MeshPrimitive {
		positions: vec![offset, offset + Vec3::X, offset + Vec3::X + Vec3::Y, offset + Vec3::Y],
		indices: vec![[0, 1, 2], [0, 2, 3]],
		normals: vec![Vec3::Z; 6],
		uv: Some(vec![
			Vec2::ZERO,
			Vec2::X,
			Vec2::ONE,
			Vec2::ZERO,
			Vec2::ONE,
			Vec2::Y,
		]),
		corner_colors: None,
		material,
	}
}

fn two_quad_asset() -> Asset {
	Asset {
		name: "quads".to_string(),
		primitives: vec![
			quad(Vec3::ZERO, pbr_material("matte", [1., 0., 0., 1.], 0., 0.8)),
			quad(Vec3::X * 2., pbr_material("shiny", [0., 0., 1., 1.], 1., 0.1)),
		],
	}
}

fn small_settings() -> PipelineSettings {
	PipelineSettings {
		resolution: 16,
		margin: 1,
		export_debug_snapshot: false,
		shots: ShotSettings {
			jitter: 0.,
			..ShotSettings::default()
		},
		..PipelineSettings::default()
	}
}

#[test]
fn run_asset_produces_a_parsable_container() -> anyhow::Result<()> {
	let asset = two_quad_asset();
	let mut backend = SoftwareBaker::default();
	let mut pipeline = Pipeline::new(&mut backend, small_settings());

	let baked = pipeline.run_asset(&asset)?;
	assert_eq!(pipeline.stage(), PipelineStage::Finalizing);

	let glb = Glb::parse(&baked.glb)?;
	let document = Document::from_json(glb.json_chunk()?)?;
	assert_eq!(document.materials.len(), 1);
	assert_eq!(document.images.len(), 3);
	assert_eq!(document.meshes.len(), 1);

	// the finalized mesh carries one material and one uv channel
	assert_eq!(baked.mesh.material_slots.len(), 1);
	assert_eq!(baked.mesh.uv_channels.len(), 1);
	assert_eq!(baked.mesh.active_uv().name, "BakedUV");
	assert!(baked.mesh.face_slots.iter().all(|&slot| slot == 0));
	Ok(())
}

#[test]
fn baked_images_are_png_encoded() -> anyhow::Result<()> {
	let asset = two_quad_asset();
	let mut backend = SoftwareBaker::default();
	let mut pipeline = Pipeline::new(&mut backend, small_settings());

	let baked = pipeline.run_asset(&asset)?;
	let glb = Glb::parse(&baked.glb)?;
	let document = Document::from_json(glb.json_chunk()?)?;
	let bin = glb.bin_chunk().unwrap();

	for image in &document.images {
		assert_eq!(image.mime_type.as_deref(), Some("image/png"));
		let view = &document.buffer_views[image.buffer_view.unwrap()];
		let bytes = &bin[view.byte_offset..view.byte_offset + view.byte_length];
		let decoded = image::load_from_memory(bytes)?;
		assert_eq!(decoded.width(), 16);
		assert_eq!(decoded.height(), 16);
	}
	Ok(())
}

#[test]
fn empty_asset_fails_while_consolidating() {
	let asset = Asset {
		name: "empty".to_string(),
		primitives: Vec::new(),
	};
	let mut backend = SoftwareBaker::default();
	let mut pipeline = Pipeline::new(&mut backend, small_settings());

	assert!(pipeline.run_asset(&asset).is_err());
	assert_eq!(pipeline.stage(), PipelineStage::Consolidating);
}

#[test]
fn run_reports_failure_stage_for_missing_input() {
	let mut backend = SoftwareBaker::default();
	let mut pipeline = Pipeline::new(&mut backend, small_settings());

	let missing = Path::new("/nonexistent/input.glb");
	let output = Path::new("/nonexistent/output.glb");
	assert!(pipeline.run(missing, output).is_err());
	assert!(matches!(pipeline.stage(), PipelineStage::Failed(_)));
}

#[test]
fn shot_settings_without_shots_are_rejected() {
	let mut settings = small_settings();
	settings.shots.shots_per_ring = 0;
	let mut backend = SoftwareBaker::default();
	let mut pipeline = Pipeline::new(&mut backend, settings);

	let err = pipeline.run_asset(&two_quad_asset()).unwrap_err();
	assert!(matches!(err, PipelineError::EmptyShotGrid));
}

/// A quad in the YZ plane facing either +X or -X; no single camera can
/// see both at once.
fn side_quad(facing: f32, color: [f32; 4], name: &str) -> MeshPrimitive {
	let indices = if facing > 0. {
		vec![[0, 1, 2], [0, 2, 3]]
	} else {
		vec![[0, 2, 1], [0, 3, 2]]
	};
	MeshPrimitive {
		positions: vec![
			Vec3::new(0., 0., 0.),
			Vec3::new(0., 1., 0.),
			Vec3::new(0., 1., 1.),
			Vec3::new(0., 0., 1.),
		],
		indices,
		normals: vec![Vec3::X * facing; 6],
		uv: None,
		corner_colors: None,
		material: pbr_material(name, color, 0., 1.),
	}
}

#[test]
fn shot_grid_captures_both_sides_of_the_subject() -> anyhow::Result<()> {
	let asset = Asset {
		name: "sides".to_string(),
		primitives: vec![
			side_quad(1., [1., 0., 0., 1.], "east"),
			side_quad(-1., [0., 0., 1., 1.], "west"),
		],
	};
	let mut backend = SoftwareBaker::default();
	let mut pipeline = Pipeline::new(&mut backend, small_settings());

	let baked = pipeline.run_asset(&asset)?;
	let glb = Glb::parse(&baked.glb)?;
	let document = Document::from_json(glb.json_chunk()?)?;
	let bin = glb.bin_chunk().unwrap();

	// images[0] is the composited color capture
	let view = &document.buffer_views[document.images[0].buffer_view.unwrap()];
	let decoded = image::load_from_memory(&bin[view.byte_offset..view.byte_offset + view.byte_length])?.to_rgba8();
	let has_color = |rgb: [u8; 3]| decoded.pixels().any(|p| p.0[0] == rgb[0] && p.0[1] == rgb[1] && p.0[2] == rgb[2]);
	assert!(has_color([255, 0, 0]), "the +X facing quad never got captured");
	assert!(has_color([0, 0, 255]), "the -X facing quad never got captured");
	Ok(())
}

#[test]
fn export_mesh_expands_corners() -> anyhow::Result<()> {
	let asset = two_quad_asset();
	let mut backend = SoftwareBaker::default();
	let mut pipeline = Pipeline::new(&mut backend, small_settings());

	let baked = pipeline.run_asset(&asset)?;
	let out = export_mesh(&asset, &baked.mesh);
	let corners = baked.mesh.faces.len() * 3;
	assert_eq!(out.positions.len(), corners);
	assert_eq!(out.normals.len(), corners);
	assert_eq!(out.uvs.len(), corners);
	assert_eq!(out.colors.len(), corners);
	Ok(())
}
