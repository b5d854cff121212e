//! UV unwrapping and island packing for the consolidated mesh.
//!
//! Unwrapping is an angle-based projection heuristic: faces grow into
//! islands while their normal stays within the unwrap angle of the island
//! seed, and each island projects onto the plane of its seed normal.
//! Packing then arranges island bounds into the unit square. Packing runs
//! `pack_iterations` times with each pass re-packing the previous output
//! and keeping the result only if it does not lose ground; two passes is
//! the empirically useful default, not a principled fixed point.

#[cfg(test)]
mod tests;

use crate::scene::{ConsolidatedMesh, UvChannel};
use glam::{Vec2, Vec3};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct AtlasSettings {
	/// Faces join an island while deviating less than this from the seed
	/// normal, radians.
	pub unwrap_angle: f32,
	/// Spacing between packed islands in UV units.
	pub island_margin: f32,
	pub pack_iterations: u32,
	/// Name of the UV channel the atlas writes.
	pub uv_name: String,
}

impl Default for AtlasSettings {
	fn default() -> Self {
		Self {
			unwrap_angle: 66f32.to_radians(),
			island_margin: 0.02,
			pack_iterations: 2,
			uv_name: "BakedUV".to_string(),
		}
	}
}

/// Per-pass packing diagnostics; the bounding area must never increase
/// from one pass to the next.
#[derive(Clone, Debug, Default)]
pub struct AtlasStats {
	pub islands: usize,
	pub pass_areas: Vec<f32>,
}

struct Island {
	faces: Vec<usize>,
	/// Local projected coords, one triple per face.
	coords: Vec<[Vec2; 3]>,
}

impl Island {
	fn bounds(&self) -> (Vec2, Vec2) {
		let mut min = Vec2::INFINITY;
		let mut max = Vec2::NEG_INFINITY;
		for corners in &self.coords {
			for corner in corners {
				min = min.min(*corner);
				max = max.max(*corner);
			}
		}
		(min, max)
	}
}

/// Unwraps and packs the mesh, then installs the result as the active UV
/// channel. Returns packing diagnostics.
pub fn unwrap_and_pack(mesh: &mut ConsolidatedMesh, settings: &AtlasSettings) -> AtlasStats {
	let islands = build_islands(mesh, settings.unwrap_angle);
	let mut stats = AtlasStats {
		islands: islands.len(),
		pass_areas: Vec::new(),
	};

	let mut best: Option<(Vec<Vec2>, f32)> = None;
	for _ in 0..settings.pack_iterations.max(1) {
		let hint = best.as_ref().map(|(_, side)| *side);
		let (offsets, side) = pack_pass(&islands, settings.island_margin, hint);
		match &best {
			Some((_, best_side)) if side >= *best_side => {}
			_ => best = Some((offsets, side)),
		}
		let side = best.as_ref().map(|(_, side)| *side).unwrap_or(side);
		stats.pass_areas.push(side * side);
	}
	let (offsets, side) = best.expect("at least one packing pass runs");

	// scale everything uniformly into the unit square, margin inset
	let scale = (1. - settings.island_margin * 2.) / side.max(1e-12);
	let mut coords = vec![Vec2::ZERO; mesh.faces.len() * 3];
	for (island, offset) in islands.iter().zip(&offsets) {
		let (min, _) = island.bounds();
		for (face, corners) in island.faces.iter().zip(&island.coords) {
			for (corner, uv) in corners.iter().enumerate() {
				coords[face * 3 + corner] =
					(*uv - min + *offset) * scale + Vec2::splat(settings.island_margin);
			}
		}
	}

	mesh.add_uv_channel(UvChannel {
		name: settings.uv_name.clone(),
		coords,
	});
	stats
}

/// Greedy BFS clustering of faces into islands bounded by the unwrap
/// angle, each projected onto its seed face's plane.
fn build_islands(mesh: &ConsolidatedMesh, unwrap_angle: f32) -> Vec<Island> {
	let mut edge_to_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
	for (face, indices) in mesh.faces.iter().enumerate() {
		for i in 0..3 {
			let (a, b) = (indices[i], indices[(i + 1) % 3]);
			let edge = (a.min(b), a.max(b));
			edge_to_faces.entry(edge).or_default().push(face);
		}
	}

	let cos_limit = unwrap_angle.cos();
	let mut assigned = vec![false; mesh.faces.len()];
	let mut islands = Vec::new();
	for seed in 0..mesh.faces.len() {
		if assigned[seed] {
			continue;
		}
		let seed_normal = mesh.face_normal(seed);
		let mut faces = Vec::new();
		let mut queue = vec![seed];
		assigned[seed] = true;
		while let Some(face) = queue.pop() {
			faces.push(face);
			let indices = mesh.faces[face];
			for i in 0..3 {
				let (a, b) = (indices[i], indices[(i + 1) % 3]);
				for &neighbor in &edge_to_faces[&(a.min(b), a.max(b))] {
					if !assigned[neighbor] && mesh.face_normal(neighbor).dot(seed_normal) >= cos_limit {
						assigned[neighbor] = true;
						queue.push(neighbor);
					}
				}
			}
		}

		let coords = project_faces(mesh, &faces, seed_normal);
		islands.push(Island { faces, coords });
	}
	islands
}

/// Projects face corners onto the plane orthogonal to `normal`, using a
/// dominant-axis tangent basis.
fn project_faces(mesh: &ConsolidatedMesh, faces: &[usize], normal: Vec3) -> Vec<[Vec2; 3]> {
	let up = if normal.z.abs() < 0.999 { Vec3::Z } else { Vec3::X };
	let tangent = up.cross(normal).normalize_or_zero();
	let tangent = if tangent == Vec3::ZERO { Vec3::X } else { tangent };
	let bitangent = normal.cross(tangent);

	faces
		.iter()
		.map(|&face| {
			[0, 1, 2].map(|corner| {
				let p = mesh.corner_position(face, corner);
				Vec2::new(p.dot(tangent), p.dot(bitangent))
			})
		})
		.collect()
}

/// One shelf-packing pass: places island bounds left to right into shelves
/// of a target strip width, returning per-island offsets and the side
/// length of the occupied square. `width_hint` lets a later pass retry at
/// the bound the previous pass achieved.
fn pack_pass(islands: &[Island], margin: f32, width_hint: Option<f32>) -> (Vec<Vec2>, f32) {
	let sizes: Vec<Vec2> = islands
		.iter()
		.map(|island| {
			let (min, max) = island.bounds();
			max - min
		})
		.collect();

	let total_area: f32 = sizes.iter().map(|s| (s.x + margin) * (s.y + margin)).sum();
	let width = width_hint.unwrap_or_else(|| total_area.sqrt().max(sizes.iter().map(|s| s.x).fold(0., f32::max)));
	let width = width.max(sizes.iter().map(|s| s.x).fold(0., f32::max));

	// tallest first keeps shelves dense
	let mut order: Vec<usize> = (0..islands.len()).collect();
	order.sort_by(|&a, &b| sizes[b].y.total_cmp(&sizes[a].y).then(a.cmp(&b)));

	let mut offsets = vec![Vec2::ZERO; islands.len()];
	let mut cursor = Vec2::ZERO;
	let mut shelf_height = 0f32;
	let mut used = Vec2::ZERO;
	for &island in &order {
		let size = sizes[island];
		if cursor.x > 0. && cursor.x + size.x > width {
			cursor = Vec2::new(0., cursor.y + shelf_height + margin);
			shelf_height = 0.;
		}
		offsets[island] = cursor;
		shelf_height = shelf_height.max(size.y);
		used = used.max(cursor + size);
		cursor.x += size.x + margin;
	}

	(offsets, used.x.max(used.y))
}
