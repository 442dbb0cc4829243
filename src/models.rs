use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Class labels in the order the classifier head was trained against.
pub const CLASS_LABELS: [&str; 4] = ["Glioma", "Meningioma", "No Tumor", "Pituitary"];

/// Distribution served while no model is loaded.
const STUB_PROBABILITIES: [f32; 4] = [0.10, 0.70, 0.05, 0.15];

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    pub confidence: f32,
    /// One entry per class label, in label order.
    pub probabilities: IndexMap<String, f32>,
}

impl PredictionResult {
    /// Build a result from a probability vector aligned with `labels`.
    ///
    /// The predicted label is the first one holding the maximum probability.
    pub fn from_distribution(labels: &[String], probabilities: &[f32]) -> Self {
        let (best, confidence) = argmax(probabilities);

        Self {
            label: labels[best].clone(),
            confidence,
            probabilities: labels
                .iter()
                .cloned()
                .zip(probabilities.iter().copied())
                .collect(),
        }
    }

    /// Fixed result returned in degraded mode.
    pub fn stub() -> Self {
        let labels: Vec<String> = CLASS_LABELS.iter().map(ToString::to_string).collect();
        Self::from_distribution(&labels, &STUB_PROBABILITIES)
    }
}

pub(crate) fn argmax(values: &[f32]) -> (usize, f32) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (index, value)| {
            if value > best.1 {
                (index, value)
            } else {
                best
            }
        })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub class: String,
    pub confidence: f64,
    pub all_probabilities: IndexMap<String, f32>,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            class: result.label,
            confidence: round4(f64::from(result.confidence)),
            all_probabilities: result.probabilities,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ready,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
