use std::path::Path;

use ndarray::Array4;
use tract_onnx::prelude::*;

use super::{preprocess::IMAGE_SIZE, Network};
use crate::error::{InferenceError, LoadError};

type Plan = TypedRunnableModel<TypedModel>;

/// Classifier network exported to ONNX, executed with tract.
pub struct OnnxNetwork {
    plan: Plan,
    num_classes: usize,
}

impl OnnxNetwork {
    /// Load, pin the input shape, optimize and plan the network at `path`.
    ///
    /// The class count is read off the optimized graph's output shape.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let size = IMAGE_SIZE as usize;
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
            .and_then(|model| model.into_optimized())
            .map_err(|e| LoadError::Model(format!("{e:#}")))?;

        let num_classes = output_classes(&model)?;
        let plan = model
            .into_runnable()
            .map_err(|e| LoadError::Model(format!("{e:#}")))?;

        tracing::debug!(path = %path.display(), num_classes, "planned ONNX network");

        Ok(Self { plan, num_classes })
    }
}

fn output_classes(model: &TypedModel) -> Result<usize, LoadError> {
    let fact = model
        .output_fact(0)
        .map_err(|e| LoadError::Model(format!("{e:#}")))?;

    fact.shape
        .as_concrete()
        .and_then(|dims| dims.last().copied())
        .ok_or_else(|| LoadError::Model(format!("output shape {:?} is not concrete", fact.shape)))
}

impl Network for OnnxNetwork {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let forward_err = |e: TractError| InferenceError::Forward(format!("{e:#}"));

        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_shape(input.shape(), &data).map_err(forward_err)?;

        let outputs = self.plan.run(tvec!(tensor.into())).map_err(forward_err)?;
        let scores = outputs[0].to_array_view::<f32>().map_err(forward_err)?;

        Ok(scores.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::Predictor;
    use std::{io::Write, path::PathBuf};

    /// Global average pool followed by a dense head: class `c < 3` scores the
    /// mean of input channel `c`, the fourth class scores a constant 0.5.
    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn missing_checkpoint_is_not_found() {
        let err = OnnxNetwork::load(Path::new("does/not/exist.onnx"))
            .err()
            .unwrap();

        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn reads_class_count_from_output_shape() {
        let network = OnnxNetwork::load(&fixture("linear4.onnx")).unwrap();
        assert_eq!(network.num_classes(), 4);

        let network = OnnxNetwork::load(&fixture("linear3.onnx")).unwrap();
        assert_eq!(network.num_classes(), 3);
    }

    #[test]
    fn forward_runs_the_planned_graph() {
        let network = OnnxNetwork::load(&fixture("linear4.onnx")).unwrap();
        let size = IMAGE_SIZE as usize;
        let input = Array4::from_shape_fn((1, 3, size, size), |(_, c, _, _)| c as f32 - 1.0);

        let scores = network.forward(&input).unwrap();

        assert_eq!(scores.len(), 4);
        for (score, expected) in scores.iter().zip([-1.0, 0.0, 1.0, 0.5]) {
            assert!((score - expected).abs() < 1e-5, "{scores:?}");
        }
    }

    #[test]
    fn checkpoint_with_wrong_head_is_rejected() {
        let err = Predictor::load(&fixture("linear3.onnx")).err().unwrap();

        assert!(matches!(err, LoadError::ClassCount { expected: 4, found: 3 }));
    }

    #[test]
    fn checkpoint_predicts_over_every_label() {
        let predictor = Predictor::load(&fixture("linear4.onnx")).unwrap();
        let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            40,
            30,
            image::Rgb([255, 0, 0]),
        ));

        let result = predictor.predict(&image).unwrap();

        assert_eq!(result.label, "Glioma");
        assert!((result.probabilities.values().sum::<f32>() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn garbage_checkpoint_is_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".onnx")
            .tempfile()
            .unwrap();
        file.write_all(b"definitely not a protobuf graph").unwrap();

        let err = OnnxNetwork::load(file.path()).err().unwrap();
        assert!(matches!(err, LoadError::Model(_)));
    }
}
