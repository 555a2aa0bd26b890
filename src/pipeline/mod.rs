//! Sketch-to-image pipeline configuration and the synchronous front end.

mod sketch;

pub use sketch::{Config, Pipeline};
