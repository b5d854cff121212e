//! Assembles a consolidated, baked asset back into a binary container:
//! one mesh, one material, three embedded textures.

use crate::chunk::{CHUNK_BIN, CHUNK_JSON, Chunk, GLB_VERSION, Glb};
use crate::document::{
	Accessor, AssetInfo, Attributes, Buffer, BufferView, COMPONENT_F32, COMPONENT_U32, Document, Image, Material,
	Mesh, Node, PbrMetallicRoughness, Primitive, Scene, Texture, TextureRef,
};
use crate::error::GlbError;

/// Corner-expanded mesh data: one entry per face corner, faces are
/// consecutive corner triples. All attribute vectors share one length.
#[derive(Clone, Debug, Default)]
pub struct ExportMesh {
	pub name: String,
	pub positions: Vec<[f32; 3]>,
	pub normals: Vec<[f32; 3]>,
	pub uvs: Vec<[f32; 2]>,
	pub colors: Vec<[f32; 4]>,
}

/// Pre-encoded image blobs; the codec treats them as opaque bytes.
#[derive(Clone, Debug, Default)]
pub struct ExportTextures {
	pub base_color: Vec<u8>,
	pub normal: Vec<u8>,
	pub metallic_roughness: Vec<u8>,
	pub mime_type: String,
}

struct BinBuilder {
	bytes: Vec<u8>,
	views: Vec<BufferView>,
}

impl BinBuilder {
	fn new() -> Self {
		Self {
			bytes: Vec::new(),
			views: Vec::new(),
		}
	}

	fn push_view(&mut self, data: &[u8]) -> usize {
		// accessor component types require 4 byte alignment
		while self.bytes.len() % 4 != 0 {
			self.bytes.push(0);
		}
		let view = BufferView {
			buffer: 0,
			byte_offset: self.bytes.len(),
			byte_length: data.len(),
		};
		self.bytes.extend_from_slice(data);
		self.views.push(view);
		self.views.len() - 1
	}
}

fn f32s_to_bytes(values: &[f32]) -> Vec<u8> {
	values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn min_max_3(values: &[[f32; 3]]) -> (Vec<f32>, Vec<f32>) {
	let mut min = [f32::INFINITY; 3];
	let mut max = [f32::NEG_INFINITY; 3];
	for v in values {
		for i in 0..3 {
			min[i] = min[i].min(v[i]);
			max[i] = max[i].max(v[i]);
		}
	}
	(min.to_vec(), max.to_vec())
}

pub fn write_glb(mesh: &ExportMesh, textures: &ExportTextures, material_name: &str) -> Result<Vec<u8>, GlbError> {
	let corners = mesh.positions.len();
	let mut bin = BinBuilder::new();
	let mut accessors = Vec::new();

	let mut push_accessor = |bin: &mut BinBuilder, data: Vec<u8>, component: u32, ty: &str, count: usize,
	                         min: Vec<f32>, max: Vec<f32>| {
		let buffer_view = bin.push_view(&data);
		accessors.push(Accessor {
			buffer_view,
			byte_offset: 0,
			component_type: component,
			count,
			ty: ty.to_string(),
			min,
			max,
		});
		accessors.len() - 1
	};

	let (pos_min, pos_max) = min_max_3(&mesh.positions);
	let position = push_accessor(
		&mut bin,
		f32s_to_bytes(&mesh.positions.concat()),
		COMPONENT_F32,
		"VEC3",
		corners,
		pos_min,
		pos_max,
	);
	let normal = push_accessor(
		&mut bin,
		f32s_to_bytes(&mesh.normals.concat()),
		COMPONENT_F32,
		"VEC3",
		corners,
		Vec::new(),
		Vec::new(),
	);
	let texcoord = push_accessor(
		&mut bin,
		f32s_to_bytes(&mesh.uvs.concat()),
		COMPONENT_F32,
		"VEC2",
		corners,
		Vec::new(),
		Vec::new(),
	);
	let color = push_accessor(
		&mut bin,
		f32s_to_bytes(&mesh.colors.concat()),
		COMPONENT_F32,
		"VEC4",
		corners,
		Vec::new(),
		Vec::new(),
	);
	let indices = push_accessor(
		&mut bin,
		(0..corners as u32).flat_map(|i| i.to_le_bytes()).collect(),
		COMPONENT_U32,
		"SCALAR",
		corners,
		Vec::new(),
		Vec::new(),
	);

	let mut images = Vec::new();
	for blob in [&textures.base_color, &textures.normal, &textures.metallic_roughness] {
		let buffer_view = bin.push_view(blob);
		images.push(Image {
			buffer_view: Some(buffer_view),
			uri: None,
			mime_type: Some(textures.mime_type.clone()),
			name: None,
		});
	}

	let document = Document {
		asset: AssetInfo {
			version: "2.0".to_string(),
			generator: Some(concat!("glb-codec ", env!("CARGO_PKG_VERSION")).to_string()),
		},
		scene: Some(0),
		scenes: vec![Scene { nodes: vec![0] }],
		nodes: vec![Node {
			mesh: Some(0),
			name: Some(mesh.name.clone()),
		}],
		meshes: vec![Mesh {
			primitives: vec![Primitive {
				attributes: Attributes {
					position,
					normal: Some(normal),
					texcoord_0: Some(texcoord),
					color_0: Some(color),
				},
				indices: Some(indices),
				material: Some(0),
			}],
			name: Some(mesh.name.clone()),
		}],
		accessors,
		buffer_views: bin.views,
		buffers: vec![Buffer {
			byte_length: bin.bytes.len(),
			uri: None,
		}],
		images,
		textures: (0..3).map(|source| Texture { source }).collect(),
		materials: vec![Material {
			name: Some(material_name.to_string()),
			pbr_metallic_roughness: Some(PbrMetallicRoughness {
				base_color_texture: Some(TextureRef { index: 0 }),
				metallic_roughness_texture: Some(TextureRef { index: 2 }),
			}),
			normal_texture: Some(TextureRef { index: 1 }),
		}],
	};

	let mut json = document.to_json()?;
	// JSON chunks are space-padded to 4 bytes, BIN chunks nul-padded
	while json.len() % 4 != 0 {
		json.push(b' ');
	}
	let mut bin_bytes = bin.bytes;
	while bin_bytes.len() % 4 != 0 {
		bin_bytes.push(0);
	}

	Ok(Glb {
		version: GLB_VERSION,
		chunks: vec![
			Chunk {
				ty: CHUNK_JSON,
				payload: json,
			},
			Chunk {
				ty: CHUNK_BIN,
				payload: bin_bytes,
			},
		],
	}
	.to_bytes())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chunk::Glb;

	fn quad_mesh() -> ExportMesh {
		ExportMesh {
			name: "quad".to_string(),
			positions: vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]],
			normals: vec![[0., 0., 1.]; 3],
			uvs: vec![[0., 0.], [1., 0.], [0., 1.]],
			colors: vec![[1.; 4]; 3],
		}
	}

	fn fake_textures() -> ExportTextures {
		ExportTextures {
			base_color: vec![1, 2, 3],
			normal: vec![4, 5],
			metallic_roughness: vec![6],
			mime_type: "image/png".to_string(),
		}
	}

	#[test]
	fn written_container_parses_back() -> anyhow::Result<()> {
		let bytes = write_glb(&quad_mesh(), &fake_textures(), "BakedMaterial")?;
		let glb = Glb::parse(&bytes)?;
		let document = Document::from_json(glb.json_chunk()?)?;

		assert_eq!(glb.to_bytes(), bytes);
		assert_eq!(document.meshes.len(), 1);
		assert_eq!(document.materials.len(), 1);
		assert_eq!(document.images.len(), 3);
		assert_eq!(document.materials[0].name.as_deref(), Some("BakedMaterial"));

		// every image buffer view resolves inside the BIN chunk
		let bin = glb.bin_chunk().unwrap();
		for image in &document.images {
			let view = &document.buffer_views[image.buffer_view.unwrap()];
			assert!(view.byte_offset + view.byte_length <= bin.len());
		}
		Ok(())
	}

	#[test]
	fn views_are_aligned() -> anyhow::Result<()> {
		let bytes = write_glb(&quad_mesh(), &fake_textures(), "m")?;
		let glb = Glb::parse(&bytes)?;
		let document = Document::from_json(glb.json_chunk()?)?;
		for view in &document.buffer_views {
			assert_eq!(view.byte_offset % 4, 0);
		}
		Ok(())
	}
}
