use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam::channel::{Receiver, Sender};
use image::{DynamicImage, RgbaImage};

use crate::codec;
use crate::error::{Error, Result};
use crate::image::fit_to_model;
use crate::model::ModelProvider;

use super::job::{Delivery, InferenceJob, JobState};
use super::JobSettings;

pub(crate) fn lock_state(state: &Mutex<JobState>) -> MutexGuard<'_, JobState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the slot back to `Idle` if the worker unwinds mid-job, so later
/// submissions see a closed inbox instead of a job that never ends.
struct IdleOnUnwind<'a> {
    state: &'a Mutex<JobState>,
}

impl Drop for IdleOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = lock_state(self.state);
            tracing::error!("Inference worker died while {}", *state);
            *state = JobState::Idle;
        }
    }
}

/// The single background slot. Runs jobs one at a time until the inbox closes.
pub(crate) struct Worker {
    pub inbox: Receiver<InferenceJob>,
    pub outbox: Sender<Delivery>,
    pub state: Arc<Mutex<JobState>>,
    pub settings: JobSettings,
}

impl Worker {
    pub fn run(self) {
        tracing::debug!("Inference worker started");
        let _guard = IdleOnUnwind { state: &self.state };

        for job in &self.inbox {
            let InferenceJob {
                id,
                image,
                model,
                callbacks,
            } = job;
            tracing::info!("Running job {id} on model {}", model.name());

            let outcome = execute(image, model.as_ref(), &self.settings);

            {
                let mut state = lock_state(&self.state);
                *state = match &outcome {
                    Ok(_) => JobState::Completed(id),
                    Err(_) => JobState::Failed(id),
                };
                tracing::debug!("Runner state: {}", *state);
                *state = JobState::Idle;
            }

            match &outcome {
                Ok(_) => tracing::info!("Job {id} complete"),
                Err(err) => tracing::warn!("Job {id} failed: {err}"),
            }

            if self.outbox.send(callbacks.into_delivery(id, outcome)).is_err() {
                tracing::warn!("Presenter is gone, dropping result of job {id}");
            }
        }

        tracing::debug!("Inference worker stopped");
    }
}

/// resize -> encode -> acquire + model call + release -> decode.
fn execute(
    image: DynamicImage,
    provider: &dyn ModelProvider,
    settings: &JobSettings,
) -> Result<RgbaImage> {
    let fitted = fit_to_model(image, settings.width, settings.height, settings.filter)?;
    let input = codec::encode(&fitted, settings.width, settings.height)?;
    if settings.log_tensors {
        codec::log_tensor("input", &input);
    }

    let output = {
        let mut model = panic::catch_unwind(AssertUnwindSafe(|| provider.acquire())).map_err(
            |payload| Error::ResourceAcquisition {
                name: provider.name().to_string(),
                reason: format!("acquire panicked: {}", panic_message(payload.as_ref())),
            },
        )??;
        panic::catch_unwind(AssertUnwindSafe(|| model.process(&input))).map_err(|payload| {
            let message = panic_message(payload.as_ref());
            Error::ModelFailure {
                reason: format!("{} panicked: {message}", provider.name()),
            }
        })??
    };

    if settings.log_tensors {
        codec::log_tensor("output", &output);
    }

    codec::decode(&output, settings.width, settings.height)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
