use std::{path::Path, sync::Arc};

use image::DynamicImage;
use ndarray::Array4;

use crate::{
    error::{InferenceError, LoadError},
    models::{PredictionResult, CLASS_LABELS},
};

pub mod onnx;
pub mod preprocess;

pub use onnx::OnnxNetwork;

/// A trained classification network: normalized image tensor in, one raw score per class out.
pub trait Network: Send + Sync {
    fn num_classes(&self) -> usize;

    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

pub struct Predictor {
    network: Box<dyn Network>,
    labels: Vec<String>,
}

impl Predictor {
    /// Load the ONNX checkpoint at `path` and bind it to the brain tumor labels.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let network = OnnxNetwork::load(path)?;
        Self::new(Box::new(network), CLASS_LABELS)
    }

    /// # Errors
    ///
    /// Returns [`LoadError::NoLabels`] for an empty label set and
    /// [`LoadError::ClassCount`] if the network's output width differs from the label count.
    pub fn new<I, S>(network: Box<dyn Network>, labels: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(LoadError::NoLabels);
        }

        if network.num_classes() != labels.len() {
            return Err(LoadError::ClassCount {
                expected: labels.len(),
                found: network.num_classes(),
            });
        }

        Ok(Self { network, labels })
    }

    pub fn predict(&self, image: &DynamicImage) -> Result<PredictionResult, InferenceError> {
        let input = preprocess::to_tensor(image);
        let scores = self.network.forward(&input)?;

        if scores.len() != self.labels.len() {
            return Err(InferenceError::OutputShape {
                expected: self.labels.len(),
                found: scores.len(),
            });
        }

        if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
            return Err(InferenceError::NonFinite { index });
        }

        let probabilities = softmax(&scores);
        Ok(PredictionResult::from_distribution(&self.labels, &probabilities))
    }
}

/// Whether a model is available to serve predictions. Decided once at startup.
#[derive(Clone)]
pub enum PredictorState {
    Ready(Arc<Predictor>),
    Unavailable(String),
}

impl PredictorState {
    /// Try to load the checkpoint, downgrading any failure to [`PredictorState::Unavailable`].
    pub fn load(path: &Path) -> Self {
        match Predictor::load(path) {
            Ok(predictor) => {
                tracing::info!(path = %path.display(), "model loaded successfully");
                Self::Ready(Arc::new(predictor))
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not load model, serving stub predictions"
                );
                Self::Unavailable(e.to_string())
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

pub(crate) fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}
