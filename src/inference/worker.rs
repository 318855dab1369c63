//! Dedicated inference thread.
//!
//! The model is built and owned by one OS thread for the life of the process.
//! Request handlers talk to it through an [`InferenceHandle`]: each job carries
//! a decoded image and a one-shot reply channel. Forward passes therefore run
//! one at a time and never block the async runtime.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;

use burn::tensor::backend::Backend;
use image::DynamicImage;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::predictor::{Prediction, Predictor};
#[cfg(feature = "cuda")]
use crate::backend::AcceleratorBackend;
use crate::backend::{ComputeBackend, CpuBackend};
use crate::labels::ClassLabels;
use crate::utils::error::{ClassifierError, Result};

struct Job {
    image: DynamicImage,
    reply: oneshot::Sender<Result<Prediction>>,
}

/// Starts the inference thread
pub struct InferenceWorker;

impl InferenceWorker {
    /// Spawn the worker and wait until its predictor is ready
    ///
    /// `load` runs on the worker thread. If it fails (or panics) the error is
    /// returned here and no handle is produced.
    pub fn spawn<B, F>(load: F) -> Result<InferenceHandle>
    where
        B: Backend,
        F: FnOnce() -> Result<Predictor<B>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<ClassLabels>>(1);

        thread::Builder::new()
            .name("inference".to_string())
            .spawn(move || {
                let predictor = match load() {
                    Ok(predictor) => {
                        let _ = ready_tx.send(Ok(predictor.labels().clone()));
                        predictor
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Some(job) = rx.blocking_recv() {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| predictor.predict_image(&job.image)))
                        .unwrap_or_else(|payload| {
                            let message = panic_message(payload.as_ref());
                            error!("Inference panicked: {}", message);
                            Err(ClassifierError::Inference(message))
                        });
                    let _ = job.reply.send(result);
                }

                debug!("Inference worker stopped");
            })?;

        let labels = ready_rx
            .recv()
            .map_err(|_| ClassifierError::Model("inference worker exited during startup".to_string()))??;

        info!("Inference worker ready ({} classes)", labels.len());
        Ok(InferenceHandle {
            tx,
            labels: Arc::new(labels),
        })
    }

    /// Load the model artifact on `backend` and start the worker
    pub fn spawn_on(
        backend: ComputeBackend,
        weights_path: PathBuf,
        config_path: Option<PathBuf>,
        labels: ClassLabels,
    ) -> Result<InferenceHandle> {
        match backend {
            ComputeBackend::Cpu => Self::spawn(move || {
                Predictor::<CpuBackend>::load(&weights_path, config_path.as_deref(), labels, Default::default())
            }),
            #[cfg(feature = "cuda")]
            ComputeBackend::Accelerator => Self::spawn(move || {
                Predictor::<AcceleratorBackend>::load(&weights_path, config_path.as_deref(), labels, Default::default())
            }),
        }
    }
}

/// Cheap, cloneable handle for submitting images to the inference thread
#[derive(Clone)]
pub struct InferenceHandle {
    tx: mpsc::UnboundedSender<Job>,
    labels: Arc<ClassLabels>,
}

impl InferenceHandle {
    /// Classify one decoded image
    pub async fn predict(&self, image: DynamicImage) -> Result<Prediction> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Job { image, reply })
            .map_err(|_| ClassifierError::Inference("inference worker is not running".to_string()))?;

        response
            .await
            .map_err(|_| ClassifierError::Inference("inference worker dropped the request".to_string()))?
    }

    /// The label set of the loaded model
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during forward pass".to_string()
    }
}
