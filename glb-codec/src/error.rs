use std::fmt::{Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum GlbError {
	BadMagic([u8; 4]),
	TruncatedHeader,
	TruncatedChunk { offset: usize, declared: usize, available: usize },
	MissingJsonChunk,
	Json(serde_json::Error),
	ImageOutOfBounds { image: usize },
	MissingBinChunk { image: usize },
	ImageWithoutSource { image: usize },
	BadDataUri { image: usize },
	Io(io::Error),
}

impl Display for GlbError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			GlbError::BadMagic(magic) => write!(f, "Container magic {magic:?} is not b\"glTF\""),
			GlbError::TruncatedHeader => f.write_str("Container is shorter than the 12 byte header"),
			GlbError::TruncatedChunk {
				offset,
				declared,
				available,
			} => {
				write!(
					f,
					"Chunk at offset {offset} declares {declared} payload bytes but only {available} remain"
				)
			}
			GlbError::MissingJsonChunk => f.write_str("Container has no JSON chunk"),
			GlbError::Json(err) => write!(f, "Structured chunk is not valid glTF JSON: {err}"),
			GlbError::ImageOutOfBounds { image } => {
				write!(f, "Image[{image}] buffer view is out of bounds of the BIN chunk")
			}
			GlbError::MissingBinChunk { image } => {
				write!(f, "Image[{image}] references a buffer view but the container has no BIN chunk")
			}
			GlbError::ImageWithoutSource { image } => {
				write!(f, "Image[{image}] declares neither a buffer view nor a uri")
			}
			GlbError::BadDataUri { image } => write!(f, "Image[{image}] has a malformed data uri"),
			GlbError::Io(err) => Display::fmt(err, f),
		}
	}
}

impl std::error::Error for GlbError {}

impl From<serde_json::Error> for GlbError {
	fn from(value: serde_json::Error) -> Self {
		Self::Json(value)
	}
}

impl From<io::Error> for GlbError {
	fn from(value: io::Error) -> Self {
		Self::Io(value)
	}
}
