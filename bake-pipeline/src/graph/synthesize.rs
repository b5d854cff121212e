//! Derives the temporary per-pass graphs and the final consolidated
//! material from the imported source materials.
//!
//! Pass order is a correctness invariant owned by the bake executor:
//! Normal first (no rewrite), then Color, then MetallicRoughness. The
//! Color rewrite replaces the surface output, so the original Base-Color
//! source must be captured before any rewrite graph is derived.

use crate::graph::{GraphBuilder, InputSocket, MaterialGraph, MathOp, NodeKind, OutputRef, OutputSocket, VectorOp};
use glam::Vec3;

/// What fed the principled node's Base Color before the color-pass rewrite.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BaseColorSource {
	Link(OutputRef),
	Constant([f32; 4]),
}

/// Captures the pre-rewrite Base-Color source. Must run against the
/// original graph, never against a pass graph.
pub fn capture_base_color_source(graph: &MaterialGraph) -> BaseColorSource {
	let Some(principled) = graph.principled() else {
		return BaseColorSource::Constant([1., 1., 1., 1.]);
	};
	match graph.input_source(principled, InputSocket::BaseColor) {
		Some(from) => BaseColorSource::Link(from),
		None => match graph.node(principled) {
			NodeKind::PrincipledBsdf { base_color, .. } => BaseColorSource::Constant(*base_color),
			_ => unreachable!("principled role always tags a PrincipledBsdf node"),
		},
	}
}

/// Derives the color-pass graph: the surface output becomes a gated mix of
/// a zero-radiance branch and an emission of the captured Base-Color
/// source. The gate `max(dot(normalize(cam - world), normal), 0) > 0`
/// excludes back-facing geometry from the shared atlas for this view.
pub fn synthesize_color_pass(original: &MaterialGraph, captured: BaseColorSource, camera: Vec3) -> MaterialGraph {
	let mut b = GraphBuilder::from_graph(original);
	let output = original.output();

	let vx = b.add(NodeKind::Value(camera.x));
	let vy = b.add(NodeKind::Value(camera.y));
	let vz = b.add(NodeKind::Value(camera.z));
	let cam = b.add(NodeKind::CombineXyz { x: 0., y: 0., z: 0. });
	b.link(vx, OutputSocket::Value, cam, InputSocket::X);
	b.link(vy, OutputSocket::Value, cam, InputSocket::Y);
	b.link(vz, OutputSocket::Value, cam, InputSocket::Z);

	let geo = b.add(NodeKind::Geometry);
	let view = b.add(NodeKind::VectorMath(VectorOp::Subtract));
	b.link(cam, OutputSocket::Vector, view, InputSocket::VectorA);
	b.link(geo, OutputSocket::Position, view, InputSocket::VectorB);
	let view = {
		let normalize = b.add(NodeKind::VectorMath(VectorOp::Normalize));
		b.link(view, OutputSocket::Vector, normalize, InputSocket::VectorA);
		normalize
	};
	let dot = b.add(NodeKind::VectorMath(VectorOp::DotProduct));
	b.link(view, OutputSocket::Vector, dot, InputSocket::VectorA);
	b.link(geo, OutputSocket::Normal, dot, InputSocket::VectorB);
	let clamped = b.add(NodeKind::Math {
		op: MathOp::Maximum,
		default_b: 0.,
	});
	b.link(dot, OutputSocket::Value, clamped, InputSocket::Value);
	let gate = b.add(NodeKind::Math {
		op: MathOp::GreaterThan,
		default_b: 0.,
	});
	b.link(clamped, OutputSocket::Value, gate, InputSocket::Value);

	let black = b.add(NodeKind::Emission {
		color: [0., 0., 0., 1.],
		strength: 1.,
	});
	let shaded = match captured {
		BaseColorSource::Link(from) => {
			let emission = b.add(NodeKind::Emission {
				color: [1., 1., 1., 1.],
				strength: 1.,
			});
			b.link_from(from, emission, InputSocket::Color);
			emission
		}
		BaseColorSource::Constant(color) => b.add(NodeKind::Emission { color, strength: 1. }),
	};

	let mix = b.add(NodeKind::MixShader);
	b.link(gate, OutputSocket::Value, mix, InputSocket::Fac);
	b.link(black, OutputSocket::Shader, mix, InputSocket::ShaderA);
	b.link(shaded, OutputSocket::Shader, mix, InputSocket::ShaderB);
	b.link(mix, OutputSocket::Shader, output, InputSocket::Surface);

	b.build()
}

/// Derives the metallic-roughness pass graph: metallic packs into the blue
/// channel, roughness into the green channel, red stays zero.
pub fn synthesize_mr_pass(original: &MaterialGraph) -> MaterialGraph {
	let mut b = GraphBuilder::from_graph(original);
	let output = original.output();

	let (metallic, roughness) = match original.principled().map(|id| original.node(id)) {
		Some(NodeKind::PrincipledBsdf { metallic, roughness, .. }) => (*metallic, *roughness),
		_ => (0., 1.),
	};
	let combine = b.add(NodeKind::CombineRgb {
		r: 0.,
		g: roughness,
		b: metallic,
	});
	if let Some(principled) = original.principled() {
		if let Some(from) = original.input_source(principled, InputSocket::Metallic) {
			b.link_from(from, combine, InputSocket::B);
		}
		if let Some(from) = original.input_source(principled, InputSocket::Roughness) {
			b.link_from(from, combine, InputSocket::G);
		}
	}

	let emission = b.add(NodeKind::Emission {
		color: [1., 1., 1., 1.],
		strength: 1.,
	});
	b.link(combine, OutputSocket::Color, emission, InputSocket::Color);
	b.link(emission, OutputSocket::Shader, output, InputSocket::Surface);

	b.build()
}

/// Builds the single final material: the baked color, metallic-roughness
/// and normal textures sampled through the new UV channel. Metallic reads
/// the blue channel and roughness the green one, mirroring the pass-side
/// packing.
pub fn build_final_material(
	name: &str,
	uv_channel: &str,
	color_image: &str,
	mr_image: &str,
	normal_image: &str,
) -> MaterialGraph {
	let mut b = GraphBuilder::new(name);
	let output = b.add(NodeKind::OutputMaterial);
	let principled = b.add(NodeKind::PrincipledBsdf {
		base_color: [1., 1., 1., 1.],
		metallic: 0.,
		roughness: 1.,
	});
	b.link(principled, OutputSocket::Shader, output, InputSocket::Surface);

	let uv = b.add(NodeKind::UvMap {
		channel: uv_channel.to_string(),
	});

	let color_tex = b.add(NodeKind::BakedTexture {
		image: color_image.to_string(),
	});
	b.link(uv, OutputSocket::Uv, color_tex, InputSocket::Vector);
	b.link(color_tex, OutputSocket::Color, principled, InputSocket::BaseColor);

	let mr_tex = b.add(NodeKind::BakedTexture {
		image: mr_image.to_string(),
	});
	b.link(uv, OutputSocket::Uv, mr_tex, InputSocket::Vector);
	let separate = b.add(NodeKind::SeparateRgb);
	b.link(mr_tex, OutputSocket::Color, separate, InputSocket::Image);
	b.link(separate, OutputSocket::B, principled, InputSocket::Metallic);
	b.link(separate, OutputSocket::G, principled, InputSocket::Roughness);

	let normal_tex = b.add(NodeKind::BakedTexture {
		image: normal_image.to_string(),
	});
	b.link(uv, OutputSocket::Uv, normal_tex, InputSocket::Vector);
	let normal_map = b.add(NodeKind::NormalMap);
	b.link(normal_tex, OutputSocket::Color, normal_map, InputSocket::Color);
	b.link(normal_map, OutputSocket::Normal, principled, InputSocket::Normal);

	b.build()
}
