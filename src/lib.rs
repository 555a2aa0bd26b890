//! # `sketch2image`
//!
//! Turns a sketch into an image with a pre-trained image-to-image model.
//!
//! The model takes a 178x218 RGB image as an NHWC `f32` tensor normalized to
//! `[0, 1]` and returns a tensor of the same shape. [`codec`] converts between
//! images and tensors, [`runner`] runs one job at a time on a background
//! worker, and [`model`] wraps the model file itself.
//!
//! ## Example
//!
//! ```no_run
//! use sketch2image::{Config, Pipeline};
//!
//! # fn main() -> sketch2image::Result<()> {
//! let pipeline = Pipeline::new(Config::default())?;
//!
//! pipeline.process("sketch.png", "generated.png")?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod runner;

pub use error::{Error, Result};
pub use pipeline::{Config, Pipeline};
pub use runner::{JobId, JobRunner, JobSettings, JobState, Presenter};
