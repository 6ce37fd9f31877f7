//! Image classifier for incident category suggestions.
//!
//! Wraps an ONNX image-classification model behind a small synchronous API.
//! The model is loaded once at startup via [`Classifier::load`]; inference is
//! CPU-bound, so callers on an async runtime should run [`Classifier::classify`]
//! on a blocking thread.

use std::path::Path;

use greenwatch_common::{AppError, AppResult, ClassifierConfig};
use serde::Serialize;
use tract_onnx::prelude::*;

/// Result of classifying one image.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Predicted category label.
    pub label: String,
    /// Softmax probability of the predicted label, in `0.0..=1.0`.
    pub confidence: f32,
}

/// An ONNX image classifier with a fixed label set.
pub struct Classifier {
    model: TypedRunnableModel<TypedModel>,
    labels: Vec<String>,
    input_size: u32,
}

impl Classifier {
    /// Load and optimize the ONNX model named in the configuration.
    ///
    /// Returns [`AppError::ModelUnavailable`] when no model path is
    /// configured, and [`AppError::Config`] when the file cannot be read or
    /// is not a valid model.
    pub fn load(config: &ClassifierConfig) -> AppResult<Self> {
        let path = config.model_path.as_deref().ok_or_else(|| {
            AppError::ModelUnavailable("no model path configured".to_string())
        })?;

        if config.labels.is_empty() {
            return Err(AppError::Config(
                "classifier.labels must not be empty".to_string(),
            ));
        }

        let size = i64::from(config.input_size);
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| AppError::Config(format!("failed to read model {path:?}: {e}")))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(|e| AppError::Config(format!("bad model input shape: {e}")))?
            .into_optimized()
            .map_err(|e| AppError::Config(format!("failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| AppError::Config(format!("failed to plan model: {e}")))?;

        tracing::info!(
            model = %path.display(),
            labels = config.labels.len(),
            input_size = config.input_size,
            "classifier loaded"
        );

        Ok(Self {
            model,
            labels: config.labels.clone(),
            input_size: config.input_size,
        })
    }

    /// The label set this classifier predicts over.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Classify an encoded image (JPEG, PNG, GIF or WebP bytes).
    pub fn classify(&self, image_bytes: &[u8]) -> AppResult<Prediction> {
        let input = preprocess(image_bytes, self.input_size)?;

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| AppError::Inference(e.to_string()))?;
        let scores = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| AppError::Inference(e.to_string()))?;
        let scores: Vec<f32> = scores.iter().copied().collect();

        let probabilities = softmax(&scores);
        let (index, confidence) = argmax(&probabilities)
            .ok_or_else(|| AppError::Inference("model produced no scores".to_string()))?;
        let label = self
            .labels
            .get(index)
            .ok_or_else(|| {
                AppError::Inference(format!(
                    "model predicted class {index} but only {} labels are configured",
                    self.labels.len()
                ))
            })?
            .clone();

        Ok(Prediction { label, confidence })
    }
}

/// Decode an image and convert it to a normalized NCHW float tensor.
fn preprocess(image_bytes: &[u8], input_size: u32) -> AppResult<Tensor> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| AppError::Inference(format!("failed to decode image: {e}")))?;
    let resized = image::imageops::resize(
        &img.to_rgb8(),
        input_size,
        input_size,
        image::imageops::FilterType::Triangle,
    );

    let size = input_size as usize;
    let tensor = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
        f32::from(resized[(x as u32, y as u32)][c]) / 255.0
    });

    Ok(tensor.into())
}

/// Numerically stable softmax.
fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Index and value of the largest score.
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
}
