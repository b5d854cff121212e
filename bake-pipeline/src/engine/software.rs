//! A deterministic CPU fallback backend.
//!
//! [`SoftwareBaker`] rasterizes every face into its active-UV triangle and
//! evaluates the material's pass graph flat at each covered texel: no
//! lighting transport, no occlusion, just the graph's emission chain. It
//! keeps the pipeline, its pass semantics and the CLI fully runnable
//! without a GPU engine attached; a real path tracer implements the same
//! trait.

use crate::bake::{BakePass, PassKind};
use crate::engine::{BackendError, RenderBackend};
use crate::frame::{Aabb, CameraFrame};
use crate::graph::{InputSocket, MaterialGraph, MathOp, NodeKind, OutputRef, OutputSocket, VectorOp};
use crate::scene::ConsolidatedMesh;
use glam::{Vec2, Vec3};
use std::fs;
use std::path::Path;

#[derive(Default)]
pub struct SoftwareBaker {}

impl RenderBackend for SoftwareBaker {
	fn bake(
		&mut self,
		mesh: &ConsolidatedMesh,
		graphs: &[MaterialGraph],
		pass: &BakePass,
		_camera: Option<&CameraFrame>,
	) -> Result<Vec<[f32; 4]>, BackendError> {
		if graphs.len() != mesh.material_slots.len() {
			return Err(BackendError::Bake(format!(
				"{} pass graphs against {} material slots",
				graphs.len(),
				mesh.material_slots.len()
			)));
		}
		let size = pass.size as usize;
		let mut pixels = vec![[0f32; 4]; size * size];
		let mut covered = vec![false; size * size];

		let uvs = &mesh.active_uv().coords;
		let source_uvs = &mesh.uv_channels[0].coords;
		for (face, slot) in mesh.face_slots.iter().enumerate() {
			let graph = &graphs[*slot as usize];
			let corners = [0, 1, 2].map(|c| uvs[face * 3 + c] * pass.size as f32);
			rasterize(&corners, size, |x, y, bary| {
				let point = ShadePoint {
					position: interpolate3(
						[0, 1, 2].map(|c| mesh.corner_position(face, c)),
						bary,
					),
					normal: interpolate3([0, 1, 2].map(|c| mesh.normals[face * 3 + c]), bary).normalize_or_zero(),
					source_uv: interpolate2([0, 1, 2].map(|c| source_uvs[face * 3 + c]), bary),
				};
				let color = match pass.kind {
					// flat tangent-space normal, the geometric detail a
					// path tracer would capture is out of this backend's
					// reach
					PassKind::Normal => [0.5, 0.5, 1., 1.],
					_ => Evaluator { graph, point }.surface(),
				};
				pixels[y * size + x] = color;
				covered[y * size + x] = true;
			});
		}

		dilate(&mut pixels, &mut covered, size, pass.margin);
		Ok(pixels)
	}

	fn save_snapshot(&mut self, mesh: &ConsolidatedMesh, path: &Path) -> Result<(), BackendError> {
		let aabb = Aabb::of_points(mesh.positions.iter().copied());
		let (floor, floor_scale) = aabb.ground_plane();
		let summary = format!(
			"software baker snapshot\nfaces: {}\nuv channels: {}\nmaterial slots: {}\nground plane: {floor} scaled {floor_scale}\n",
			mesh.faces.len(),
			mesh.uv_channels.len(),
			mesh.material_slots.len()
		);
		fs::write(path, summary).map_err(|err| BackendError::Snapshot(err.to_string()))
	}
}

fn interpolate3(values: [Vec3; 3], bary: [f32; 3]) -> Vec3 {
	values[0] * bary[0] + values[1] * bary[1] + values[2] * bary[2]
}

fn interpolate2(values: [Vec2; 3], bary: [f32; 3]) -> Vec2 {
	values[0] * bary[0] + values[1] * bary[1] + values[2] * bary[2]
}

/// Visits every texel whose center falls inside the (pixel-space) UV
/// triangle, passing barycentric coordinates.
fn rasterize(corners: &[Vec2; 3], size: usize, mut visit: impl FnMut(usize, usize, [f32; 3])) {
	let min_x = corners.iter().map(|c| c.x).fold(f32::INFINITY, f32::min).floor().max(0.) as usize;
	let min_y = corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min).floor().max(0.) as usize;
	let max_x = (corners.iter().map(|c| c.x).fold(0., f32::max).ceil() as usize).min(size.saturating_sub(1));
	let max_y = (corners.iter().map(|c| c.y).fold(0., f32::max).ceil() as usize).min(size.saturating_sub(1));

	let [a, b, c] = *corners;
	let area = (b - a).perp_dot(c - a);
	if area.abs() < 1e-12 {
		return;
	}
	for y in min_y..=max_y {
		for x in min_x..=max_x {
			let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
			let wa = (b - p).perp_dot(c - p) / area;
			let wb = (c - p).perp_dot(a - p) / area;
			let wc = 1. - wa - wb;
			let eps = -1e-5;
			if wa >= eps && wb >= eps && wc >= eps {
				visit(x, y, [wa, wb, wc]);
			}
		}
	}
}

/// Pixel dilation to suppress seam bleeding: `margin` rounds of flooding
/// covered colors into uncovered neighbours.
fn dilate(pixels: &mut [[f32; 4]], covered: &mut [bool], size: usize, margin: u32) {
	for _ in 0..margin {
		let snapshot = covered.to_vec();
		let source = pixels.to_vec();
		for y in 0..size {
			for x in 0..size {
				if snapshot[y * size + x] {
					continue;
				}
				let mut sum = [0f32; 4];
				let mut count = 0;
				for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
					let (nx, ny) = (x as i64 + dx, y as i64 + dy);
					if nx < 0 || ny < 0 || nx >= size as i64 || ny >= size as i64 {
						continue;
					}
					let n = ny as usize * size + nx as usize;
					if snapshot[n] {
						for i in 0..4 {
							sum[i] += source[n][i];
						}
						count += 1;
					}
				}
				if count > 0 {
					pixels[y * size + x] = sum.map(|v| v / count as f32);
					covered[y * size + x] = true;
				}
			}
		}
	}
}

struct ShadePoint {
	position: Vec3,
	normal: Vec3,
	source_uv: Vec2,
}

/// Compiles nothing: walks the immutable DAG directly. Graphs are a
/// handful of nodes deep, recursion is fine.
struct Evaluator<'a> {
	graph: &'a MaterialGraph,
	point: ShadePoint,
}

impl Evaluator<'_> {
	fn surface(&self) -> [f32; 4] {
		match self.graph.input_source(self.graph.output(), InputSocket::Surface) {
			Some(from) => self.color(from),
			None => [0., 0., 0., 1.],
		}
	}

	fn input_color(&self, node: crate::graph::NodeId, socket: InputSocket, default: [f32; 4]) -> [f32; 4] {
		match self.graph.input_source(node, socket) {
			Some(from) => self.color(from),
			None => default,
		}
	}

	fn input_scalar(&self, node: crate::graph::NodeId, socket: InputSocket, default: f32) -> f32 {
		match self.graph.input_source(node, socket) {
			Some(from) => self.scalar(from),
			None => default,
		}
	}

	fn input_vector(&self, node: crate::graph::NodeId, socket: InputSocket, default: Vec3) -> Vec3 {
		match self.graph.input_source(node, socket) {
			Some(from) => self.vector(from),
			None => default,
		}
	}

	fn color(&self, from: OutputRef) -> [f32; 4] {
		match self.graph.node(from.node) {
			NodeKind::PrincipledBsdf { base_color, .. } => {
				self.input_color(from.node, InputSocket::BaseColor, *base_color)
			}
			NodeKind::Emission { color, strength } => {
				let c = self.input_color(from.node, InputSocket::Color, *color);
				[c[0] * strength, c[1] * strength, c[2] * strength, c[3]]
			}
			NodeKind::TexImage(texture) => {
				let uv = self.input_vector(from.node, InputSocket::Vector, self.point.source_uv.extend(0.));
				texture.sample(uv.x, uv.y)
			}
			NodeKind::MixShader => {
				let fac = self.input_scalar(from.node, InputSocket::Fac, 0.5).clamp(0., 1.);
				let a = self.input_color(from.node, InputSocket::ShaderA, [0.; 4]);
				let b = self.input_color(from.node, InputSocket::ShaderB, [0.; 4]);
				[0, 1, 2, 3].map(|i| a[i] * (1. - fac) + b[i] * fac)
			}
			NodeKind::CombineRgb { r, g, b } => [
				self.input_scalar(from.node, InputSocket::R, *r),
				self.input_scalar(from.node, InputSocket::G, *g),
				self.input_scalar(from.node, InputSocket::B, *b),
				1.,
			],
			NodeKind::NormalMap => self.input_color(from.node, InputSocket::Color, [0.5, 0.5, 1., 1.]),
			// bake targets are sinks and baked textures only appear in
			// the final material, neither is sampled during a pass
			NodeKind::BakeTarget { .. } | NodeKind::BakedTexture { .. } => [1., 1., 1., 1.],
			_ => {
				let v = self.vector(from);
				[v.x, v.y, v.z, 1.]
			}
		}
	}

	fn scalar(&self, from: OutputRef) -> f32 {
		match self.graph.node(from.node) {
			NodeKind::Value(value) => *value,
			NodeKind::Math { op, default_b } => {
				let a = self.input_scalar(from.node, InputSocket::Value, 0.);
				match op {
					MathOp::Maximum => a.max(*default_b),
					MathOp::GreaterThan => {
						if a > *default_b {
							1.
						} else {
							0.
						}
					}
				}
			}
			NodeKind::VectorMath(VectorOp::DotProduct) => {
				let a = self.input_vector(from.node, InputSocket::VectorA, Vec3::ZERO);
				let b = self.input_vector(from.node, InputSocket::VectorB, Vec3::ZERO);
				a.dot(b)
			}
			NodeKind::SeparateRgb => {
				let c = self.input_color(from.node, InputSocket::Image, [0.; 4]);
				match from.socket {
					OutputSocket::R => c[0],
					OutputSocket::G => c[1],
					OutputSocket::B => c[2],
					_ => 0.,
				}
			}
			_ => {
				let c = self.color(from);
				(c[0] + c[1] + c[2]) / 3.
			}
		}
	}

	fn vector(&self, from: OutputRef) -> Vec3 {
		match self.graph.node(from.node) {
			NodeKind::Geometry => match from.socket {
				OutputSocket::Position => self.point.position,
				_ => self.point.normal,
			},
			NodeKind::UvMap { .. } => self.point.source_uv.extend(0.),
			NodeKind::CombineXyz { x, y, z } => Vec3::new(
				self.input_scalar(from.node, InputSocket::X, *x),
				self.input_scalar(from.node, InputSocket::Y, *y),
				self.input_scalar(from.node, InputSocket::Z, *z),
			),
			NodeKind::VectorMath(op) => {
				let a = self.input_vector(from.node, InputSocket::VectorA, Vec3::ZERO);
				match op {
					VectorOp::Subtract => a - self.input_vector(from.node, InputSocket::VectorB, Vec3::ZERO),
					VectorOp::Normalize => a.normalize_or_zero(),
					VectorOp::DotProduct => Vec3::splat(self.scalar(from)),
				}
			}
			NodeKind::Value(value) => Vec3::splat(*value),
			_ => {
				let c = self.color(from);
				Vec3::new(c[0], c[1], c[2])
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::GraphBuilder;
	use crate::graph::synthesize::{capture_base_color_source, synthesize_color_pass, synthesize_mr_pass};

	fn shade(graph: &MaterialGraph, position: Vec3, normal: Vec3) -> [f32; 4] {
		Evaluator {
			graph,
			point: ShadePoint {
				position,
				normal,
				source_uv: Vec2::ZERO,
			},
		}
		.surface()
	}

	fn red_material() -> MaterialGraph {
		let mut b = GraphBuilder::new("red");
		let output = b.add(NodeKind::OutputMaterial);
		let principled = b.add(NodeKind::PrincipledBsdf {
			base_color: [1., 0., 0., 1.],
			metallic: 0.5,
			roughness: 0.25,
		});
		b.link(principled, OutputSocket::Shader, output, InputSocket::Surface);
		b.build()
	}

	#[test]
	fn view_facing_gate_passes_front_and_blocks_back() {
		let original = red_material();
		let captured = capture_base_color_source(&original);
		let graph = synthesize_color_pass(&original, captured, Vec3::new(0., 0., 10.));

		let front = shade(&graph, Vec3::ZERO, Vec3::Z);
		let back = shade(&graph, Vec3::ZERO, -Vec3::Z);
		assert_eq!(front, [1., 0., 0., 1.]);
		assert_eq!(back, [0., 0., 0., 1.]);
	}

	#[test]
	fn mr_pass_emits_packed_channels() {
		let graph = synthesize_mr_pass(&red_material());
		let c = shade(&graph, Vec3::ZERO, Vec3::Z);
		assert_eq!(c[0], 0.); // red unused
		assert_eq!(c[1], 0.25); // roughness in green
		assert_eq!(c[2], 0.5); // metallic in blue
	}
}
