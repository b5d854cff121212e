//! Imports a glTF/GLB file into the pipeline's own [`Asset`] model via the
//! external importer. Positions land in world space, so downstream framing
//! and consolidation never consult the node hierarchy again.

use crate::error::PipelineError;
use crate::graph::{GraphBuilder, InputSocket, MaterialGraph, NodeKind, OutputSocket, SourceTexture};
use crate::scene::{Asset, DEFAULT_UV_NAME, MeshPrimitive};
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use glam::{Affine3A, Quat, Vec2, Vec3};
use gltf::buffer::Data;
use gltf::image::Source;
use gltf::mesh::Mode;
use gltf::{Buffer, Document, Material, Node, Scene};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Gltf {
	pub document: Document,
	pub base: PathBuf,
	pub buffers: SmallVec<[Data; 1]>,
}

impl Gltf {
	pub fn open(path: &Path) -> Result<Self, gltf::Error> {
		let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("./"));
		let gltf::Gltf { document, mut blob } = gltf::Gltf::open(path)?;
		let buffers = document
			.buffers()
			.map(|buffer| Data::from_source_and_blob(buffer.source(), Some(base.as_path()), &mut blob))
			.collect::<Result<_, _>>()?;
		Ok(Self { document, base, buffers })
	}

	pub fn buffer(&self, buffer: Buffer) -> Option<&[u8]> {
		self.buffers.get(buffer.index()).map(|b| &b.0[..])
	}

	fn image_bytes(&self, image: gltf::Image) -> Option<Vec<u8>> {
		match image.source() {
			Source::View { view, .. } => {
				let buffer = self.buffer(view.buffer())?;
				buffer.get(view.offset()..view.offset() + view.length()).map(<[u8]>::to_vec)
			}
			Source::Uri { uri, .. } => {
				if let Some(data) = uri.strip_prefix("data:") {
					let b64 = data.split_once(',')?.1;
					BASE64_STANDARD.decode(b64).ok()
				} else {
					fs::read(self.base.join(uri)).ok()
				}
			}
		}
	}

	fn absolute_node_transformations(&self, scene: &Scene) -> Vec<Affine3A> {
		fn walk(out: &mut Vec<Affine3A>, node: Node, parent: Affine3A) {
			let (translation, rotation, scale) = node.transform().decomposed();
			let node_absolute = parent
				* Affine3A::from_scale_rotation_translation(
					Vec3::from(scale),
					Quat::from_array(rotation),
					Vec3::from(translation),
				);
			out[node.index()] = node_absolute;
			for node in node.children() {
				walk(out, node, node_absolute);
			}
		}

		let mut out = vec![Affine3A::IDENTITY; self.nodes().len()];
		for node in scene.nodes() {
			walk(&mut out, node, Affine3A::IDENTITY);
		}
		out
	}
}

impl Deref for Gltf {
	type Target = Document;

	fn deref(&self) -> &Self::Target {
		&self.document
	}
}

/// Decodes and caches source textures so materials sharing an image share
/// one allocation.
struct TextureCache<'a> {
	gltf: &'a Gltf,
	cache: HashMap<usize, Arc<SourceTexture>>,
}

impl<'a> TextureCache<'a> {
	fn get(&mut self, image: gltf::Image<'a>) -> Option<Arc<SourceTexture>> {
		let index = image.index();
		if let Some(texture) = self.cache.get(&index) {
			return Some(texture.clone());
		}
		let bytes = self.gltf.image_bytes(image.clone())?;
		let decoded = match image::load_from_memory(&bytes) {
			Ok(decoded) => decoded.to_rgba8(),
			Err(err) => {
				log::warn!("failed decoding image[{index}], sampling falls back to factors: {err}");
				return None;
			}
		};
		let (width, height) = decoded.dimensions();
		let pixels = decoded
			.pixels()
			.map(|p| [0, 1, 2, 3].map(|i| p.0[i] as f32 / 255.))
			.collect();
		let texture = Arc::new(SourceTexture {
			name: image.name().unwrap_or("image").to_string(),
			width,
			height,
			pixels,
		});
		self.cache.insert(index, texture.clone());
		Some(texture)
	}
}

fn import_material<'a>(material: &Material<'a>, textures: &mut TextureCache<'a>) -> MaterialGraph {
	let pbr = material.pbr_metallic_roughness();
	let name = material
		.name()
		.map(str::to_string)
		.unwrap_or_else(|| format!("material_{}", material.index().map(|i| i as i64).unwrap_or(-1)));

	let mut b = GraphBuilder::new(&name);
	let output = b.add(NodeKind::OutputMaterial);
	let principled = b.add(NodeKind::PrincipledBsdf {
		base_color: pbr.base_color_factor(),
		metallic: pbr.metallic_factor(),
		roughness: pbr.roughness_factor(),
	});
	b.link(principled, OutputSocket::Shader, output, InputSocket::Surface);

	let uv = b.add(NodeKind::UvMap {
		channel: DEFAULT_UV_NAME.to_string(),
	});

	if let Some(tex) = pbr.base_color_texture().and_then(|t| textures.get(t.texture().source())) {
		let node = b.add(NodeKind::TexImage(tex));
		b.link(uv, OutputSocket::Uv, node, InputSocket::Vector);
		b.link(node, OutputSocket::Color, principled, InputSocket::BaseColor);
	}
	if let Some(tex) = pbr
		.metallic_roughness_texture()
		.and_then(|t| textures.get(t.texture().source()))
	{
		let node = b.add(NodeKind::TexImage(tex));
		b.link(uv, OutputSocket::Uv, node, InputSocket::Vector);
		let separate = b.add(NodeKind::SeparateRgb);
		b.link(node, OutputSocket::Color, separate, InputSocket::Image);
		b.link(separate, OutputSocket::B, principled, InputSocket::Metallic);
		b.link(separate, OutputSocket::G, principled, InputSocket::Roughness);
	}
	if let Some(tex) = material.normal_texture().and_then(|t| textures.get(t.texture().source())) {
		let node = b.add(NodeKind::TexImage(tex));
		b.link(uv, OutputSocket::Uv, node, InputSocket::Vector);
		let normal_map = b.add(NodeKind::NormalMap);
		b.link(node, OutputSocket::Color, normal_map, InputSocket::Color);
		b.link(normal_map, OutputSocket::Normal, principled, InputSocket::Normal);
	}

	b.build()
}

fn import_primitive(
	gltf: &Gltf,
	primitive: &gltf::Primitive,
	transform: Affine3A,
	material: MaterialGraph,
) -> Result<MeshPrimitive, PipelineError> {
	if primitive.mode() != Mode::Triangles {
		return Err(PipelineError::PrimitiveMustBeTriangleList);
	}

	let reader = primitive.reader(|b| gltf.buffer(b));
	let positions: Vec<Vec3> = reader
		.read_positions()
		.ok_or(PipelineError::NoVertexPositions)?
		.map(|p| transform.transform_point3(Vec3::from(p)))
		.collect();

	let flat_indices: Vec<u32> = if let Some(indices) = reader.read_indices() {
		indices.into_u32().collect()
	} else {
		(0..positions.len() as u32).collect()
	};
	let indices: Vec<[u32; 3]> = flat_indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

	let vertex_normals: Option<Vec<Vec3>> = reader.read_normals().map(|normals| {
		normals
			.map(|n| transform.transform_vector3(Vec3::from(n)).normalize_or_zero())
			.collect()
	});
	let vertex_uv: Option<Vec<Vec2>> = reader.read_tex_coords(0).map(|uv| uv.into_f32().map(Vec2::from).collect());
	let vertex_colors: Option<Vec<[f32; 4]>> = reader.read_colors(0).map(|colors| colors.into_rgba_f32().collect());

	// attributes are expanded from per-vertex to per-corner here, which
	// lets consolidation concatenate primitives without index fixups
	let mut normals = Vec::with_capacity(indices.len() * 3);
	let mut uv = vertex_uv.as_ref().map(|_| Vec::with_capacity(indices.len() * 3));
	let mut corner_colors = vertex_colors.as_ref().map(|_| Vec::with_capacity(indices.len() * 3));
	for face in &indices {
		let flat_normal = (positions[face[1] as usize] - positions[face[0] as usize])
			.cross(positions[face[2] as usize] - positions[face[0] as usize])
			.normalize_or_zero();
		for &index in face {
			normals.push(match &vertex_normals {
				Some(vertex_normals) => vertex_normals[index as usize],
				None => flat_normal,
			});
			if let (Some(uv), Some(vertex_uv)) = (uv.as_mut(), vertex_uv.as_ref()) {
				uv.push(vertex_uv[index as usize]);
			}
			if let (Some(colors), Some(vertex_colors)) = (corner_colors.as_mut(), vertex_colors.as_ref()) {
				colors.push(vertex_colors[index as usize]);
			}
		}
	}

	Ok(MeshPrimitive {
		positions,
		indices,
		normals,
		uv,
		corner_colors,
		material,
	})
}

pub fn import_asset(path: &Path) -> Result<Asset, PipelineError> {
	let gltf = Gltf::open(path)?;
	let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();

	let mut textures = TextureCache {
		gltf: &gltf,
		cache: HashMap::new(),
	};
	let materials: Vec<MaterialGraph> = gltf.materials().map(|m| import_material(&m, &mut textures)).collect();
	let default_material = || {
		let mut b = GraphBuilder::new("default");
		let output = b.add(NodeKind::OutputMaterial);
		let principled = b.add(NodeKind::PrincipledBsdf {
			base_color: [1., 1., 1., 1.],
			metallic: 0.,
			roughness: 1.,
		});
		b.link(principled, OutputSocket::Shader, output, InputSocket::Surface);
		b.build()
	};

	let node_transforms = match gltf.default_scene() {
		Some(scene) => gltf.absolute_node_transformations(&scene),
		None => vec![Affine3A::IDENTITY; gltf.nodes().len()],
	};

	let mut primitives = Vec::new();
	for node in gltf.nodes() {
		let Some(mesh) = node.mesh() else { continue };
		let transform = node_transforms[node.index()];
		for primitive in mesh.primitives() {
			let material = match primitive.material().index() {
				Some(index) => materials[index].clone(),
				None => default_material(),
			};
			primitives.push(import_primitive(&gltf, &primitive, transform, material)?);
		}
	}

	Ok(Asset { name, primitives })
}
