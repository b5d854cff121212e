use super::synthesize::*;
use super::*;
use glam::Vec3;
use std::sync::Arc;

fn checker_texture() -> Arc<SourceTexture> {
	Arc::new(SourceTexture {
		name: "checker".to_string(),
		width: 2,
		height: 2,
		pixels: vec![[1., 1., 1., 1.], [0., 0., 0., 1.], [0., 0., 0., 1.], [1., 1., 1., 1.]],
	})
}

/// A source material the way the importer builds one: textured base color,
/// constant metallic/roughness.
fn textured_material() -> MaterialGraph {
	let mut b = GraphBuilder::new("wood");
	let output = b.add(NodeKind::OutputMaterial);
	let principled = b.add(NodeKind::PrincipledBsdf {
		base_color: [1., 1., 1., 1.],
		metallic: 0.25,
		roughness: 0.75,
	});
	b.link(principled, OutputSocket::Shader, output, InputSocket::Surface);
	let tex = b.add(NodeKind::TexImage(checker_texture()));
	b.link(tex, OutputSocket::Color, principled, InputSocket::BaseColor);
	b.build()
}

#[test]
fn captured_base_color_source_equals_pre_rewrite_link() {
	let original = textured_material();
	let principled = original.principled().unwrap();
	let pre_rewrite = original.input_source(principled, InputSocket::BaseColor).unwrap();

	let captured = capture_base_color_source(&original);
	let rewritten = synthesize_color_pass(&original, captured, Vec3::new(0., -5., 5.));

	assert_eq!(captured, BaseColorSource::Link(pre_rewrite));
	// the rewrite replaced the surface output of the derived graph only
	assert_ne!(
		rewritten.input_source(rewritten.output(), InputSocket::Surface),
		original.input_source(original.output(), InputSocket::Surface),
	);
	assert_eq!(
		original.input_source(original.output(), InputSocket::Surface).map(|f| f.node),
		Some(principled),
	);
}

#[test]
fn capture_falls_back_to_constant_base_color() {
	let mut b = GraphBuilder::new("flat");
	let output = b.add(NodeKind::OutputMaterial);
	let principled = b.add(NodeKind::PrincipledBsdf {
		base_color: [0.2, 0.4, 0.6, 1.],
		metallic: 0.,
		roughness: 1.,
	});
	b.link(principled, OutputSocket::Shader, output, InputSocket::Surface);
	let graph = b.build();

	assert_eq!(
		capture_base_color_source(&graph),
		BaseColorSource::Constant([0.2, 0.4, 0.6, 1.])
	);
}

#[test]
fn color_pass_gates_through_a_mix_shader() {
	let original = textured_material();
	let captured = capture_base_color_source(&original);
	let graph = synthesize_color_pass(&original, captured, Vec3::ZERO);

	let surface = graph.input_source(graph.output(), InputSocket::Surface).unwrap();
	assert_eq!(graph.node(surface.node), &NodeKind::MixShader);
	let fac = graph.input_source(surface.node, InputSocket::Fac).unwrap();
	assert_eq!(
		graph.node(fac.node),
		&NodeKind::Math {
			op: MathOp::GreaterThan,
			default_b: 0.,
		}
	);
	// the zero-radiance branch sits on the first shader input
	let black = graph.input_source(surface.node, InputSocket::ShaderA).unwrap();
	assert_eq!(
		graph.node(black.node),
		&NodeKind::Emission {
			color: [0., 0., 0., 1.],
			strength: 1.,
		}
	);
}

#[test]
fn mr_pass_packs_metallic_blue_roughness_green() {
	let original = textured_material();
	let graph = synthesize_mr_pass(&original);

	let surface = graph.input_source(graph.output(), InputSocket::Surface).unwrap();
	let emission = surface.node;
	let combine = graph.input_source(emission, InputSocket::Color).unwrap();
	assert_eq!(
		graph.node(combine.node),
		&NodeKind::CombineRgb {
			r: 0.,
			g: 0.75,
			b: 0.25,
		}
	);
}

#[test]
fn final_material_wires_all_three_textures() {
	let graph = build_final_material("BakedMaterial", "BakedUV", "BakedTexture", "MetallicRoughnessBake", "NormalBake");
	let principled = graph.principled().unwrap();

	let base = graph.input_source(principled, InputSocket::BaseColor).unwrap();
	assert_eq!(
		graph.node(base.node),
		&NodeKind::BakedTexture {
			image: "BakedTexture".to_string(),
		}
	);

	// metallic reads blue, roughness green, matching the pass-side packing
	let metallic = graph.input_source(principled, InputSocket::Metallic).unwrap();
	let roughness = graph.input_source(principled, InputSocket::Roughness).unwrap();
	assert_eq!(metallic.socket, OutputSocket::B);
	assert_eq!(roughness.socket, OutputSocket::G);
	assert_eq!(metallic.node, roughness.node);
	assert_eq!(graph.node(metallic.node), &NodeKind::SeparateRgb);

	let normal = graph.input_source(principled, InputSocket::Normal).unwrap();
	assert_eq!(graph.node(normal.node), &NodeKind::NormalMap);
}

#[test]
fn bake_target_attaches_without_mutating_the_original() {
	let original = textured_material();
	let with_target = original.with_bake_target("NormalBake");
	assert_eq!(original.bake_target(), None);
	assert_eq!(with_target.bake_target(), Some("NormalBake"));
}
