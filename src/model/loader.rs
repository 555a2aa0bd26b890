//! ONNX Runtime backed model and model file location.

use std::path::{Path, PathBuf};

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::ImageTensor;

use super::{ModelProvider, SketchModel};

/// File name of the bundled sketch-to-image model.
pub const MODEL_FILENAME: &str = "sketch_to_image.onnx";

/// Default model location inside the platform cache directory.
///
/// - Windows: `%LOCALAPPDATA%\sketch2image\models\sketch_to_image.onnx`
/// - Linux: `~/.cache/sketch2image/models/sketch_to_image.onnx`
/// - macOS: `~/Library/Caches/sketch2image/models/sketch_to_image.onnx`
#[must_use]
pub fn default_model_path() -> PathBuf {
    let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("sketch2image").join("models").join(MODEL_FILENAME)
}

/// The configured model path, or [`default_model_path`].
#[must_use]
pub fn resolve_model_path(configured: Option<&Path>) -> PathBuf {
    configured.map_or_else(default_model_path, Path::to_path_buf)
}

/// Loads a fresh ONNX Runtime session from a model file on every acquire.
#[derive(Debug, Clone)]
pub struct OnnxModelProvider {
    path: PathBuf,
    name: String,
}

impl OnnxModelProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| MODEL_FILENAME.to_string(), |n| n.to_string_lossy().into_owned());
        Self { path, name }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelProvider for OnnxModelProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn acquire(&self) -> Result<Box<dyn SketchModel>> {
        if !self.path.is_file() {
            return Err(Error::ResourceAcquisition {
                name: self.name.clone(),
                reason: format!("model file {} does not exist", self.path.display()),
            });
        }

        tracing::debug!("Loading model session from {}", self.path.display());

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                name: self.name.clone(),
                source,
            })?
            .commit_from_file(&self.path)
            .map_err(|source| Error::ModelLoad {
                name: self.name.clone(),
                source,
            })?;

        Ok(Box::new(OnnxSketchModel {
            session,
            name: self.name.clone(),
        }))
    }
}

/// An open ONNX Runtime session. Dropping it frees the session.
pub struct OnnxSketchModel {
    session: Session,
    name: String,
}

impl SketchModel for OnnxSketchModel {
    fn process(&mut self, input: &ImageTensor) -> Result<ImageTensor> {
        let input_value =
            Tensor::from_array(input.clone()).map_err(|source| Error::Inference { source })?;

        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ModelFailure {
                reason: format!("{} produced no outputs", self.name),
            })?;

        extract_array4(&output)
    }
}

impl Drop for OnnxSketchModel {
    fn drop(&mut self) {
        tracing::debug!("Releasing model session {}", self.name);
    }
}

/// Extract a 4D array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array4(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: "reshape failed".to_string(),
        }
    })
}
