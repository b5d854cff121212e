use super::*;
use crate::graph::{GraphBuilder, InputSocket, NodeKind, OutputSocket};
use crate::scene::{Asset, MeshPrimitive, consolidate};
use glam::Vec3;

fn flat_material(name: &str) -> crate::graph::MaterialGraph {
	let mut b = GraphBuilder::new(name);
	let output = b.add(NodeKind::OutputMaterial);
	let principled = b.add(NodeKind::PrincipledBsdf {
		base_color: [1., 1., 1., 1.],
		metallic: 0.,
		roughness: 1.,
	});
	b.link(principled, OutputSocket::Shader, output, InputSocket::Surface);
	b.build()
}

/// An axis-aligned cube: six planar quads whose normals differ by 90
/// degrees, so the default unwrap angle splits them into separate islands.
fn cube_asset() -> Asset {
	let mut positions = Vec::new();
	let mut indices = Vec::new();
	let faces = [
		(Vec3::Z, Vec3::X, Vec3::Y),
		(-Vec3::Z, Vec3::Y, Vec3::X),
		(Vec3::X, Vec3::Y, Vec3::Z),
		(-Vec3::X, Vec3::Z, Vec3::Y),
		(Vec3::Y, Vec3::Z, Vec3::X),
		(-Vec3::Y, Vec3::X, Vec3::Z),
	];
	for (normal, u, v) in faces {
		let base = positions.len() as u32;
		let origin = normal * 0.5;
		positions.extend([
			origin - u * 0.5 - v * 0.5,
			origin + u * 0.5 - v * 0.5,
			origin + u * 0.5 + v * 0.5,
			origin - u * 0.5 + v * 0.5,
		]);
		indices.push([base, base + 1, base + 2]);
		indices.push([base, base + 2, base + 3]);
	}
	let normals = indices
		.iter()
		.zip(faces.iter().flat_map(|f| [f; 2]))
		.flat_map(|(_, (normal, ..))| [*normal; 3])
		.collect();
	Asset {
		name: "cube".to_string(),
		primitives: vec![MeshPrimitive {
			positions,
			indices,
			normals,
			uv: None,
			corner_colors: None,
			material: flat_material("cube_mat"),
		}],
	}
}

#[test]
fn cube_unwraps_into_six_islands() -> anyhow::Result<()> {
	let asset = cube_asset();
	let mut mesh = consolidate(&asset, "UVMap", "Col")?;
	let stats = unwrap_and_pack(&mut mesh, &AtlasSettings::default());
	assert_eq!(stats.islands, 6);
	assert_eq!(mesh.active_uv().name, "BakedUV");
	Ok(())
}

#[test]
fn packed_uvs_stay_inside_the_unit_square() -> anyhow::Result<()> {
	let asset = cube_asset();
	let mut mesh = consolidate(&asset, "UVMap", "Col")?;
	unwrap_and_pack(&mut mesh, &AtlasSettings::default());
	for uv in &mesh.active_uv().coords {
		assert!(uv.x >= 0. && uv.x <= 1., "u out of range: {uv:?}");
		assert!(uv.y >= 0. && uv.y <= 1., "v out of range: {uv:?}");
	}
	Ok(())
}

#[test]
fn later_packing_passes_never_increase_bounding_area() -> anyhow::Result<()> {
	let asset = cube_asset();
	let mut mesh = consolidate(&asset, "UVMap", "Col")?;
	let stats = unwrap_and_pack(
		&mut mesh,
		&AtlasSettings {
			pack_iterations: 4,
			..AtlasSettings::default()
		},
	);
	assert_eq!(stats.pass_areas.len(), 4);
	for pair in stats.pass_areas.windows(2) {
		assert!(pair[1] <= pair[0] + 1e-6, "pass areas increased: {:?}", stats.pass_areas);
	}
	Ok(())
}

#[test]
fn pack_iteration_count_is_configurable() -> anyhow::Result<()> {
	let asset = cube_asset();
	let mut mesh = consolidate(&asset, "UVMap", "Col")?;
	let stats = unwrap_and_pack(
		&mut mesh,
		&AtlasSettings {
			pack_iterations: 1,
			..AtlasSettings::default()
		},
	);
	assert_eq!(stats.pass_areas.len(), 1);
	Ok(())
}

#[test]
fn islands_do_not_overlap() -> anyhow::Result<()> {
	let asset = cube_asset();
	let mut mesh = consolidate(&asset, "UVMap", "Col")?;
	unwrap_and_pack(&mut mesh, &AtlasSettings::default());

	// compare island bounding boxes pairwise, faces 2i/2i+1 share a quad
	let coords = &mesh.active_uv().coords;
	let mut boxes = Vec::new();
	for quad in 0..6 {
		let mut min = glam::Vec2::INFINITY;
		let mut max = glam::Vec2::NEG_INFINITY;
		for corner in quad * 6..quad * 6 + 6 {
			min = min.min(coords[corner]);
			max = max.max(coords[corner]);
		}
		boxes.push((min, max));
	}
	for a in 0..boxes.len() {
		for b in a + 1..boxes.len() {
			let overlap_x = boxes[a].1.x > boxes[b].0.x + 1e-6 && boxes[b].1.x > boxes[a].0.x + 1e-6;
			let overlap_y = boxes[a].1.y > boxes[b].0.y + 1e-6 && boxes[b].1.y > boxes[a].0.y + 1e-6;
			assert!(!(overlap_x && overlap_y), "islands {a} and {b} overlap");
		}
	}
	Ok(())
}
