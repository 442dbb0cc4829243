//! HTTP service classifying brain MRI scans into four tumor classes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod predictor;

pub use handlers::{routes, AppState};
pub use predictor::{Network, Predictor, PredictorState};
