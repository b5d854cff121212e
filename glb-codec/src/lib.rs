pub mod chunk;
pub mod document;
pub mod error;
pub mod extract;
pub mod writer;
