pub mod atlas;
pub mod bake;
pub mod engine;
pub mod error;
pub mod frame;
pub mod graph;
pub mod pipeline;
pub mod scene;
