//! Core types and traits for the graph retrieval engine.
//!
//! Result JSON shapes are part of the public contract: CLI output, HTTP responses,
//! and persisted cache entries all serialize these types directly.

mod model;
mod params;
mod result;
mod traits;

pub use model::*;
pub use params::*;
pub use result::*;
pub use traits::*;
