//! The opaque sketch-to-image model and its acquire/release contract.
//!
//! A [`ModelProvider`] hands out exclusive [`SketchModel`] handles. Holding a
//! handle means holding the model's native resources; dropping it releases
//! them. The runner acquires one handle per job and drops it before the job's
//! outcome is reported.

mod loader;

pub use loader::{default_model_path, resolve_model_path, OnnxModelProvider, OnnxSketchModel};

use std::sync::Arc;

use crate::error::Result;
use crate::image::ImageTensor;

/// An acquired model instance. Dropping it releases the model.
pub trait SketchModel: Send {
    /// Run one inference on an encoded sketch.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot process the tensor.
    fn process(&mut self, input: &ImageTensor) -> Result<ImageTensor>;
}

/// Source of [`SketchModel`] handles.
pub trait ModelProvider: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Acquire an exclusive model handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the model artifact is missing or cannot be loaded.
    fn acquire(&self) -> Result<Box<dyn SketchModel>>;
}

/// Wraps a plain `Tensor -> Tensor` function as a [`ModelProvider`].
///
/// Acquiring never fails and the handle holds nothing but the function.
pub struct FnModel<F> {
    name: String,
    f: Arc<F>,
}

impl<F> FnModel<F>
where
    F: Fn(&ImageTensor) -> Result<ImageTensor> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }
}

struct FnModelHandle<F> {
    f: Arc<F>,
}

impl<F> SketchModel for FnModelHandle<F>
where
    F: Fn(&ImageTensor) -> Result<ImageTensor> + Send + Sync + 'static,
{
    fn process(&mut self, input: &ImageTensor) -> Result<ImageTensor> {
        (self.f)(input)
    }
}

impl<F> ModelProvider for FnModel<F>
where
    F: Fn(&ImageTensor) -> Result<ImageTensor> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn acquire(&self) -> Result<Box<dyn SketchModel>> {
        Ok(Box::new(FnModelHandle {
            f: Arc::clone(&self.f),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn test_fn_model_calls_function() {
        let provider = FnModel::new("negate", |t: &ImageTensor| Ok(t.mapv(|v| 1.0 - v)));
        let mut model = provider.acquire().unwrap();

        let out = model.process(&Array4::zeros((1, 2, 2, 3))).unwrap();

        assert_eq!(provider.name(), "negate");
        assert!(out.iter().all(|&v| v == 1.0));
    }
}
