//! Image loading, resizing, and saving utilities.

mod load;
mod save;

pub use load::{fit_to_model, load_image};
pub use save::save_image;

use ndarray::Array4;

/// Image tensor in NHWC format (batch, height, width, channels).
/// Values are normalized to [0, 1] on the way in; model output is not bounded.
pub type ImageTensor = Array4<f32>;

/// Input width expected by the sketch-to-image model.
pub const MODEL_WIDTH: u32 = 178;

/// Input height expected by the sketch-to-image model.
pub const MODEL_HEIGHT: u32 = 218;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Number of `f32` values in a tensor for a `width` x `height` image.
#[must_use]
pub const fn tensor_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * RGB_CHANNELS
}
