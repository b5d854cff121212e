//! Minimal serde model of the structured-description chunk. Only the parts
//! the extractor and the consolidated-asset writer touch are modelled;
//! everything else rides along in `extras`-free form and is dropped.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
	pub asset: AssetInfo,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scene: Option<usize>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub scenes: Vec<Scene>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub nodes: Vec<Node>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub meshes: Vec<Mesh>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub accessors: Vec<Accessor>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub buffer_views: Vec<BufferView>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub buffers: Vec<Buffer>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub images: Vec<Image>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub textures: Vec<Texture>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub materials: Vec<Material>,
}

impl Document {
	pub fn from_json(json: &[u8]) -> Result<Self, serde_json::Error> {
		serde_json::from_slice(json)
	}

	pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
		serde_json::to_vec(self)
	}
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssetInfo {
	pub version: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub generator: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scene {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub nodes: Vec<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Node {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mesh: Option<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Mesh {
	pub primitives: Vec<Primitive>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Primitive {
	pub attributes: Attributes,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub indices: Option<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub material: Option<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Attributes {
	#[serde(rename = "POSITION")]
	pub position: usize,
	#[serde(rename = "NORMAL", default, skip_serializing_if = "Option::is_none")]
	pub normal: Option<usize>,
	#[serde(rename = "TEXCOORD_0", default, skip_serializing_if = "Option::is_none")]
	pub texcoord_0: Option<usize>,
	#[serde(rename = "COLOR_0", default, skip_serializing_if = "Option::is_none")]
	pub color_0: Option<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
	pub buffer_view: usize,
	#[serde(default, skip_serializing_if = "is_zero")]
	pub byte_offset: usize,
	pub component_type: u32,
	pub count: usize,
	#[serde(rename = "type")]
	pub ty: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub min: Vec<f32>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub max: Vec<f32>,
}

pub const COMPONENT_F32: u32 = 5126;
pub const COMPONENT_U32: u32 = 5125;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
	pub buffer: usize,
	#[serde(default, skip_serializing_if = "is_zero")]
	pub byte_offset: usize,
	pub byte_length: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
	pub byte_length: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uri: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub buffer_view: Option<usize>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uri: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Texture {
	pub source: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub normal_texture: Option<TextureRef>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_color_texture: Option<TextureRef>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metallic_roughness_texture: Option<TextureRef>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TextureRef {
	pub index: usize,
}

fn is_zero(v: &usize) -> bool {
	*v == 0
}
