//! Chunk-level view of the binary glTF container.
//!
//! Layout: `magic(4B) | version(u32) | totalLength(u32)` followed by a
//! sequence of `chunkLength(u32) | chunkType(4B) | payload`. All integers
//! are little-endian. Payloads are kept as raw bytes so that parsing
//! followed by [`Glb::to_bytes`] reproduces the input byte for byte,
//! including any alignment padding the writer put inside the payloads.

use crate::error::GlbError;

pub const GLB_MAGIC: [u8; 4] = *b"glTF";
pub const GLB_VERSION: u32 = 2;
pub const HEADER_SIZE: usize = 12;
pub const CHUNK_HEADER_SIZE: usize = 8;

pub const CHUNK_JSON: [u8; 4] = *b"JSON";
pub const CHUNK_BIN: [u8; 4] = *b"BIN\0";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
	pub ty: [u8; 4],
	pub payload: Vec<u8>,
}

impl Chunk {
	pub fn is_json(&self) -> bool {
		self.ty == CHUNK_JSON
	}

	/// The BIN tag is nul-padded, tolerate a bare `BIN` as well.
	pub fn is_bin(&self) -> bool {
		self.ty == CHUNK_BIN || &self.ty[..3] == b"BIN"
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glb {
	pub version: u32,
	pub chunks: Vec<Chunk>,
}

impl Glb {
	pub fn parse(bytes: &[u8]) -> Result<Self, GlbError> {
		if bytes.len() < HEADER_SIZE {
			return Err(GlbError::TruncatedHeader);
		}
		let magic: [u8; 4] = bytes[0..4].try_into().unwrap();
		if magic != GLB_MAGIC {
			return Err(GlbError::BadMagic(magic));
		}
		let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
		let total_length = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
		let total_length = total_length.min(bytes.len());

		let mut chunks = Vec::new();
		let mut offset = HEADER_SIZE;
		while offset + CHUNK_HEADER_SIZE <= total_length {
			let length = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
			let ty: [u8; 4] = bytes[offset + 4..offset + 8].try_into().unwrap();
			let start = offset + CHUNK_HEADER_SIZE;
			let available = total_length - start;
			if length > available {
				return Err(GlbError::TruncatedChunk {
					offset,
					declared: length,
					available,
				});
			}
			chunks.push(Chunk {
				ty,
				payload: bytes[start..start + length].to_vec(),
			});
			offset = start + length;
		}
		Ok(Self { version, chunks })
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let total = HEADER_SIZE
			+ self
				.chunks
				.iter()
				.map(|c| CHUNK_HEADER_SIZE + c.payload.len())
				.sum::<usize>();
		let mut out = Vec::with_capacity(total);
		out.extend_from_slice(&GLB_MAGIC);
		out.extend_from_slice(&self.version.to_le_bytes());
		out.extend_from_slice(&(total as u32).to_le_bytes());
		for chunk in &self.chunks {
			out.extend_from_slice(&(chunk.payload.len() as u32).to_le_bytes());
			out.extend_from_slice(&chunk.ty);
			out.extend_from_slice(&chunk.payload);
		}
		out
	}

	pub fn json_chunk(&self) -> Result<&[u8], GlbError> {
		self.chunks
			.iter()
			.find(|c| c.is_json())
			.map(|c| c.payload.as_slice())
			.ok_or(GlbError::MissingJsonChunk)
	}

	/// Absent if all referenced resources are external or inline-encoded.
	pub fn bin_chunk(&self) -> Option<&[u8]> {
		self.chunks.iter().find(|c| c.is_bin()).map(|c| c.payload.as_slice())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	pub fn build_glb(chunks: &[([u8; 4], &[u8])]) -> Vec<u8> {
		Glb {
			version: GLB_VERSION,
			chunks: chunks
				.iter()
				.map(|(ty, payload)| Chunk {
					ty: *ty,
					payload: payload.to_vec(),
				})
				.collect(),
		}
		.to_bytes()
	}

	#[test]
	fn roundtrip_preserves_chunk_boundaries() -> Result<(), GlbError> {
		let bytes = build_glb(&[(CHUNK_JSON, br#"{"asset":{"version":"2.0"}}  "#), (CHUNK_BIN, &[1, 2, 3, 4])]);
		let glb = Glb::parse(&bytes)?;
		assert_eq!(glb.chunks.len(), 2);
		assert_eq!(glb.to_bytes(), bytes);
		Ok(())
	}

	#[test]
	fn rejects_bad_magic() {
		let mut bytes = build_glb(&[(CHUNK_JSON, b"{}")]);
		bytes[0] = b'x';
		assert!(matches!(Glb::parse(&bytes), Err(GlbError::BadMagic(_))));
	}

	#[test]
	fn rejects_truncated_chunk() {
		let mut bytes = build_glb(&[(CHUNK_JSON, b"{}")]);
		// inflate the declared chunk length past the end of the buffer
		bytes[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&1000u32.to_le_bytes());
		assert!(matches!(Glb::parse(&bytes), Err(GlbError::TruncatedChunk { .. })));
	}

	#[test]
	fn bin_chunk_is_optional() -> Result<(), GlbError> {
		let glb = Glb::parse(&build_glb(&[(CHUNK_JSON, b"{}")]))?;
		assert!(glb.bin_chunk().is_none());
		assert_eq!(glb.json_chunk()?, b"{}");
		Ok(())
	}
}
