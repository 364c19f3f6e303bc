//! HTTP surface and output rendering for the retrieval engine.

pub mod render;
pub mod server;
