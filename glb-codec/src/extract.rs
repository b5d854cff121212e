//! Pulls the baked texture set back out of a finished container.

use crate::chunk::Glb;
use crate::document::{Document, Material};
use crate::error::GlbError;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use std::fs;
use std::path::{Path, PathBuf};

/// One parsed container plus the directory it was read from, which anchors
/// relative image uris.
pub struct GlbFile {
	pub glb: Glb,
	pub document: Document,
	pub base: PathBuf,
}

impl GlbFile {
	pub fn open(path: &Path) -> Result<Self, GlbError> {
		let bytes = fs::read(path)?;
		let glb = Glb::parse(&bytes)?;
		let document = Document::from_json(glb.json_chunk()?)?;
		let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("./"));
		Ok(Self { glb, document, base })
	}

	/// Resolves one declared image entry to its raw bytes. Storage forms,
	/// in priority order: buffer view into the BIN chunk, inline data uri,
	/// file uri relative to the container.
	pub fn image_bytes(&self, image: usize) -> Result<Vec<u8>, GlbError> {
		let def = &self.document.images[image];
		if let Some(view) = def.buffer_view {
			let view = &self.document.buffer_views[view];
			let bin = self.glb.bin_chunk().ok_or(GlbError::MissingBinChunk { image })?;
			return bin
				.get(view.byte_offset..view.byte_offset + view.byte_length)
				.map(<[u8]>::to_vec)
				.ok_or(GlbError::ImageOutOfBounds { image });
		}
		if let Some(uri) = &def.uri {
			return if let Some(data) = uri.strip_prefix("data:") {
				let b64 = data.split_once(',').map(|(_, b64)| b64).ok_or(GlbError::BadDataUri { image })?;
				BASE64_STANDARD.decode(b64).map_err(|_| GlbError::BadDataUri { image })
			} else {
				Ok(fs::read(self.base.join(uri))?)
			};
		}
		Err(GlbError::ImageWithoutSource { image })
	}

	/// The file extension for one image's declared mime type, derived from
	/// the subtype so unusual formats keep a meaningful name. None when the
	/// image declares no mime type; sniff the payload instead.
	pub fn image_extension(&self, image: usize) -> Option<&str> {
		let mime = self.document.images[image].mime_type.as_deref()?;
		match mime {
			"image/jpeg" => Some("jpg"),
			_ => mime.rsplit('/').next(),
		}
	}
}

pub fn sniff_extension(bytes: &[u8]) -> &'static str {
	if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
		"png"
	} else if bytes.starts_with(&[0xff, 0xd8]) {
		"jpg"
	} else {
		"bin"
	}
}

/// The three texture roles of the baked PBR set, in the order they are
/// declared on a material.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextureRole {
	Albedo,
	Normal,
	MetallicRoughness,
}

impl TextureRole {
	pub fn suffix(&self) -> &'static str {
		match self {
			TextureRole::Albedo => "albedo",
			TextureRole::Normal => "normal",
			TextureRole::MetallicRoughness => "mr",
		}
	}

	fn image_index(&self, file: &GlbFile, material: &Material) -> Option<usize> {
		let texture = match self {
			TextureRole::Albedo => material.pbr_metallic_roughness.as_ref()?.base_color_texture.as_ref()?,
			TextureRole::Normal => material.normal_texture.as_ref()?,
			TextureRole::MetallicRoughness => {
				material.pbr_metallic_roughness.as_ref()?.metallic_roughness_texture.as_ref()?
			}
		};
		Some(file.document.textures.get(texture.index)?.source)
	}
}

/// Extracts the baked texture set of the container's first material into
/// `out_dir`, named `<basename>_<role>.<ext>`. Roles the material does not
/// reference are skipped with a warning, matching how a container baked
/// without e.g. a normal pass is still useful.
pub fn extract_textures(input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, GlbError> {
	let file = GlbFile::open(input)?;
	let basename = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();

	let Some(material) = file.document.materials.first() else {
		log::warn!("{input:?} declares no materials, nothing to extract");
		return Ok(Vec::new());
	};

	fs::create_dir_all(out_dir)?;
	let mut written = Vec::new();
	for role in [TextureRole::Albedo, TextureRole::Normal, TextureRole::MetallicRoughness] {
		let Some(image) = role.image_index(&file, material) else {
			log::warn!("{input:?} material has no {} texture", role.suffix());
			continue;
		};
		let bytes = file.image_bytes(image)?;
		let ext = file.image_extension(image).unwrap_or_else(|| sniff_extension(&bytes));
		let out_path = out_dir.join(format!("{basename}_{}.{ext}", role.suffix()));
		fs::write(&out_path, &bytes)?;
		written.push(out_path);
	}
	Ok(written)
}
