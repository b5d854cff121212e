//! Immutable shader-graph descriptions.
//!
//! A [`MaterialGraph`] is a DAG of nodes and links built once through a
//! [`GraphBuilder`] and never mutated afterwards; every bake pass derives a
//! fresh graph from the original instead of rewriting shared state. The
//! nodes that matter to the pipeline (principled shading node, surface
//! output, active bake target) carry structural roles assigned at
//! construction, so no stage ever searches nodes by type at runtime.

pub mod synthesize;
#[cfg(test)]
mod tests;

use std::sync::Arc;

/// A decoded source texture referenced by [`NodeKind::TexImage`] nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceTexture {
	pub name: String,
	pub width: u32,
	pub height: u32,
	pub pixels: Vec<[f32; 4]>,
}

impl SourceTexture {
	/// Nearest-neighbour sample with wrap-around, the glTF default.
	pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
		if self.pixels.is_empty() {
			return [0.; 4];
		}
		let x = ((u.rem_euclid(1.) * self.width as f32) as u32).min(self.width - 1);
		let y = ((v.rem_euclid(1.) * self.height as f32) as u32).min(self.height - 1);
		self.pixels[(y * self.width + x) as usize]
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MathOp {
	Maximum,
	GreaterThan,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VectorOp {
	Subtract,
	Normalize,
	DotProduct,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
	/// Principled shading node; unlinked inputs fall back to these factors.
	PrincipledBsdf {
		base_color: [f32; 4],
		metallic: f32,
		roughness: f32,
	},
	Emission {
		color: [f32; 4],
		strength: f32,
	},
	/// Samples a decoded source texture.
	TexImage(Arc<SourceTexture>),
	/// The image a bake writes into; pure sink, never sampled.
	BakeTarget {
		image: String,
	},
	/// References a baked image by name in the final material.
	BakedTexture {
		image: String,
	},
	MixShader,
	CombineRgb {
		r: f32,
		g: f32,
		b: f32,
	},
	SeparateRgb,
	CombineXyz {
		x: f32,
		y: f32,
		z: f32,
	},
	Value(f32),
	Geometry,
	UvMap {
		channel: String,
	},
	NormalMap,
	VectorMath(VectorOp),
	Math {
		op: MathOp,
		default_b: f32,
	},
	OutputMaterial,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputSocket {
	Color,
	Value,
	Vector,
	Shader,
	R,
	G,
	B,
	Normal,
	Position,
	Uv,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputSocket {
	BaseColor,
	Metallic,
	Roughness,
	Normal,
	Surface,
	Color,
	Fac,
	ShaderA,
	ShaderB,
	VectorA,
	VectorB,
	Value,
	Image,
	R,
	G,
	B,
	X,
	Y,
	Z,
	Vector,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutputRef {
	pub node: NodeId,
	pub socket: OutputSocket,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Link {
	pub from: OutputRef,
	pub to: NodeId,
	pub to_socket: InputSocket,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialGraph {
	pub name: String,
	nodes: Vec<NodeKind>,
	links: Vec<Link>,
	output: NodeId,
	principled: Option<NodeId>,
	bake_target: Option<NodeId>,
}

impl MaterialGraph {
	pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeKind)> {
		self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
	}

	pub fn node(&self, id: NodeId) -> &NodeKind {
		&self.nodes[id.0]
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn output(&self) -> NodeId {
		self.output
	}

	pub fn principled(&self) -> Option<NodeId> {
		self.principled
	}

	pub fn bake_target(&self) -> Option<&str> {
		self.bake_target.map(|id| match &self.nodes[id.0] {
			NodeKind::BakeTarget { image } => image.as_str(),
			_ => unreachable!("bake target role always tags a BakeTarget node"),
		})
	}

	/// The link feeding `socket` of `node`, if any.
	pub fn input_source(&self, node: NodeId, socket: InputSocket) -> Option<OutputRef> {
		self.links.iter().find(|l| l.to == node && l.to_socket == socket).map(|l| l.from)
	}

	/// Derives a graph with `image` attached as the active bake target.
	/// The original stays untouched.
	pub fn with_bake_target(&self, image: &str) -> MaterialGraph {
		let mut graph = self.clone();
		let id = NodeId(graph.nodes.len());
		graph.nodes.push(NodeKind::BakeTarget {
			image: image.to_string(),
		});
		graph.bake_target = Some(id);
		graph
	}
}

/// Accumulates nodes and links, then freezes them into a [`MaterialGraph`].
pub struct GraphBuilder {
	name: String,
	nodes: Vec<NodeKind>,
	links: Vec<Link>,
	output: Option<NodeId>,
	principled: Option<NodeId>,
}

impl GraphBuilder {
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			nodes: Vec::new(),
			links: Vec::new(),
			output: None,
			principled: None,
		}
	}

	/// Seeds the builder with a copy of an existing graph; node ids of the
	/// original stay valid for the copy.
	pub fn from_graph(graph: &MaterialGraph) -> Self {
		Self {
			name: graph.name.clone(),
			nodes: graph.nodes.clone(),
			links: graph.links.clone(),
			output: Some(graph.output),
			principled: graph.principled,
		}
	}

	pub fn unlink(&mut self, to: NodeId, to_socket: InputSocket) {
		self.links.retain(|l| !(l.to == to && l.to_socket == to_socket));
	}

	pub fn add(&mut self, kind: NodeKind) -> NodeId {
		let id = NodeId(self.nodes.len());
		match &kind {
			NodeKind::OutputMaterial => self.output = Some(id),
			NodeKind::PrincipledBsdf { .. } => self.principled = Some(id),
			_ => {}
		}
		self.nodes.push(kind);
		id
	}

	pub fn link(&mut self, from: NodeId, from_socket: OutputSocket, to: NodeId, to_socket: InputSocket) {
		// a new link to an occupied input replaces the old one
		self.links.retain(|l| !(l.to == to && l.to_socket == to_socket));
		self.links.push(Link {
			from: OutputRef {
				node: from,
				socket: from_socket,
			},
			to,
			to_socket,
		});
	}

	pub fn link_from(&mut self, from: OutputRef, to: NodeId, to_socket: InputSocket) {
		self.link(from.node, from.socket, to, to_socket);
	}

	pub fn build(self) -> MaterialGraph {
		let output = self.output.expect("every material graph declares an output node");
		MaterialGraph {
			name: self.name,
			nodes: self.nodes,
			links: self.links,
			output,
			principled: self.principled,
			bake_target: None,
		}
	}
}
