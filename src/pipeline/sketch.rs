//! Synchronous sketch-to-image pipeline built on the job runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage, RgbaImage};

use crate::error::{Error, Result};
use crate::image::{load_image, save_image, MODEL_HEIGHT, MODEL_WIDTH};
use crate::model::{resolve_model_path, ModelProvider, OnnxModelProvider};
use crate::runner::{JobRunner, JobSettings, Presenter};

/// Configuration for the sketch-to-image pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model file. None for the default cache location.
    pub model_path: Option<PathBuf>,

    /// Model input and output width.
    pub width: u32,

    /// Model input and output height.
    pub height: u32,

    /// Filter used to resample sketches to the model's input size.
    pub resize_filter: FilterType,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,

    /// Log tensor summaries (debug) and values (trace) around the model call.
    pub log_tensors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            width: MODEL_WIDTH,
            height: MODEL_HEIGHT,
            resize_filter: FilterType::Triangle,
            output_quality: 95,
            log_tensors: false,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        self.job_settings().validate()?;

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }

    /// The part of the configuration the job runner needs.
    #[must_use]
    pub const fn job_settings(&self) -> JobSettings {
        JobSettings {
            width: self.width,
            height: self.height,
            filter: self.resize_filter,
            log_tensors: self.log_tensors,
        }
    }
}

/// Runs one sketch at a time through the model and waits for the result.
pub struct Pipeline {
    config: Config,
    model: Arc<dyn ModelProvider>,
    runner: JobRunner,
    presenter: Presenter,
}

impl Pipeline {
    /// Create a pipeline backed by the configured ONNX model file.
    ///
    /// The model itself is only opened when a sketch is processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the worker cannot start.
    pub fn new(config: Config) -> Result<Self> {
        let path = resolve_model_path(config.model_path.as_deref());
        tracing::info!("Using model {}", path.display());
        Self::with_model(config, Arc::new(OnnxModelProvider::new(path)))
    }

    /// Create a pipeline backed by any model provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the worker cannot start.
    pub fn with_model(config: Config, model: Arc<dyn ModelProvider>) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");
        let (runner, presenter) = JobRunner::new(config.job_settings())?;

        Ok(Self {
            config,
            model,
            runner,
            presenter,
        })
    }

    /// Generate an image from a sketch already in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the job is rejected or fails.
    pub fn generate(&self, sketch: DynamicImage) -> Result<RgbaImage> {
        let (tx, rx) = crossbeam::channel::bounded(1);
        let err_tx = tx.clone();

        self.runner.submit(
            sketch,
            Arc::clone(&self.model),
            move |img| {
                let _ = tx.send(Ok(img));
            },
            move |err| {
                let _ = err_tx.send(Err(err));
            },
        )?;

        loop {
            self.presenter.wait()?;
            if let Ok(outcome) = rx.try_recv() {
                return outcome;
            }
        }
    }

    /// Generate an image from the sketch at `input_path` and save it to `output_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, inference, or saving fails.
    pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(&self, input_path: P, output_path: Q) -> Result<()> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        tracing::info!("Processing sketch: {}", input_path.display());
        let sketch = load_image(input_path)?;

        let output = self.generate(sketch)?;

        tracing::info!("Saving output to: {}", output_path.display());
        save_image(&output, output_path, self.config.output_quality)?;

        tracing::info!("Processing complete");
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
