use std::fmt;
use std::sync::Arc;

use image::{DynamicImage, RgbaImage};

use crate::error::{Error, Result};
use crate::model::ModelProvider;

/// Identifier assigned to a job when the runner accepts it.
pub type JobId = u64;

/// Runner state. `Completed` and `Failed` are passed through on the way back
/// to `Idle` once a job finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running(JobId),
    Completed(JobId),
    Failed(JobId),
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running(id) => write!(f, "running job {id}"),
            Self::Completed(id) => write!(f, "completed job {id}"),
            Self::Failed(id) => write!(f, "failed job {id}"),
        }
    }
}

pub(crate) type CompleteFn = Box<dyn FnOnce(RgbaImage) + Send>;
pub(crate) type ErrorFn = Box<dyn FnOnce(Error) + Send>;

/// One accepted sketch on its way through the worker.
pub(crate) struct InferenceJob {
    pub id: JobId,
    pub image: DynamicImage,
    pub model: Arc<dyn ModelProvider>,
    pub callbacks: Callbacks,
}

/// The presentation context's success and failure handlers for one job.
pub(crate) struct Callbacks {
    pub on_complete: CompleteFn,
    pub on_error: ErrorFn,
}

impl Callbacks {
    /// Bind the outcome to the matching callback, to be run by the presenter.
    pub fn into_delivery(self, job: JobId, outcome: Result<RgbaImage>) -> Delivery {
        let Self {
            on_complete,
            on_error,
        } = self;

        let run: Box<dyn FnOnce() + Send> = match outcome {
            Ok(img) => Box::new(move || on_complete(img)),
            Err(err) => Box::new(move || on_error(err)),
        };

        Delivery { job, run }
    }
}

/// A finished job's callback, waiting for the presentation context.
pub(crate) struct Delivery {
    pub job: JobId,
    run: Box<dyn FnOnce() + Send>,
}

impl Delivery {
    pub fn run(self) {
        tracing::debug!("Delivering result of job {}", self.job);
        (self.run)();
    }
}
