//! Single-slot background execution of sketch-to-image jobs.
//!
//! A [`JobRunner`] owns one worker thread. [`JobRunner::submit`] never blocks:
//! it either hands the job to the worker and returns its id, or fails on the
//! spot with [`Error::Busy`] while another job is running. Jobs are never
//! queued behind each other and cannot be cancelled; a model call that hangs
//! keeps the slot occupied.
//!
//! Results travel back through the [`Presenter`], which runs the job's
//! callbacks on whichever thread drives it. The runner is back to
//! [`JobState::Idle`] before a result is handed to the presenter, so a
//! callback may submit the next job straight away.

mod job;
mod presenter;
mod worker;

pub use job::{JobId, JobState};
pub use presenter::Presenter;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam::channel::Sender;
use image::{imageops::FilterType, DynamicImage, RgbaImage};

use crate::error::{Error, Result};
use crate::image::{MODEL_HEIGHT, MODEL_WIDTH};
use crate::model::ModelProvider;

use job::{Callbacks, InferenceJob};
use worker::{lock_state, Worker};

/// What the worker needs to know about the model's input.
#[derive(Debug, Clone, Copy)]
pub struct JobSettings {
    /// Model input and output width.
    pub width: u32,

    /// Model input and output height.
    pub height: u32,

    /// Filter used to resample sketches to `width` x `height`.
    pub filter: FilterType,

    /// Log tensor summaries (debug) and values (trace) around the model call.
    pub log_tensors: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            width: MODEL_WIDTH,
            height: MODEL_HEIGHT,
            filter: FilterType::Triangle,
            log_tensors: false,
        }
    }
}

impl JobSettings {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidParameter {
                name: "dimensions".to_string(),
                reason: format!("{}x{} has a zero side", self.width, self.height),
            });
        }

        Ok(())
    }
}

pub struct JobRunner {
    state: Arc<Mutex<JobState>>,
    next_id: AtomicU64,
    inbox: Option<Sender<InferenceJob>>,
    worker: Option<JoinHandle<()>>,
}

impl JobRunner {
    /// Start the worker thread and return the runner with its presenter.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the worker thread
    /// cannot be spawned.
    pub fn new(settings: JobSettings) -> Result<(Self, Presenter)> {
        settings.validate()?;

        let (inbox_tx, inbox_rx) = crossbeam::channel::unbounded();
        let (outbox_tx, outbox_rx) = crossbeam::channel::unbounded();
        let state = Arc::new(Mutex::new(JobState::Idle));

        let worker = Worker {
            inbox: inbox_rx,
            outbox: outbox_tx,
            state: Arc::clone(&state),
            settings,
        };
        let handle = std::thread::Builder::new()
            .name("sketch2image-worker".to_string())
            .spawn(move || worker.run())?;

        let runner = Self {
            state,
            next_id: AtomicU64::new(1),
            inbox: Some(inbox_tx),
            worker: Some(handle),
        };

        Ok((runner, Presenter::new(outbox_rx)))
    }

    /// Hand a sketch to the worker.
    ///
    /// The image is resized to the model's input size if needed, encoded, run
    /// through a model handle acquired from `model` for this job only, and
    /// decoded. Exactly one of `on_complete` and `on_error` is later run by the
    /// [`Presenter`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if a job is already running, or
    /// [`Error::WorkerUnavailable`] if the worker has stopped. No callback is
    /// run in either case.
    pub fn submit<C, E>(
        &self,
        image: DynamicImage,
        model: Arc<dyn ModelProvider>,
        on_complete: C,
        on_error: E,
    ) -> Result<JobId>
    where
        C: FnOnce(RgbaImage) + Send + 'static,
        E: FnOnce(Error) + Send + 'static,
    {
        let mut state = lock_state(&self.state);
        if let JobState::Running(running) = *state {
            tracing::warn!("Rejecting submission, job {running} is still running");
            return Err(Error::Busy { running });
        }

        let inbox = self.inbox.as_ref().ok_or(Error::WorkerUnavailable)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let job = InferenceJob {
            id,
            image,
            model,
            callbacks: Callbacks {
                on_complete: Box::new(on_complete),
                on_error: Box::new(on_error),
            },
        };

        inbox.send(job).map_err(|_| Error::WorkerUnavailable)?;
        *state = JobState::Running(id);
        tracing::debug!("Runner state: {}", *state);

        Ok(id)
    }

    /// Current state of the job slot.
    #[must_use]
    pub fn state(&self) -> JobState {
        *lock_state(&self.state)
    }

    /// Whether a job currently occupies the slot.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.state(), JobState::Running(_))
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        // Closing the inbox lets the worker finish its current job and exit.
        self.inbox.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Inference worker panicked");
            }
        }
    }
}
