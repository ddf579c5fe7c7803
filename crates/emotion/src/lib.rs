//! Emotion classification from face crops (FER+ label set).
//!
//! Decodes the 8-way score vector of a FER+-style emotion model:
//! - Neutral, Happiness, Surprise, Sadness, Anger, Disgust, Fear, Contempt
//!
//! The label order is load-bearing - decoders must never reorder it, since
//! model output indices are defined against it. Input is a 64x64 grayscale
//! tensor in `[-1, 1]`; output is a softmax probability distribution plus
//! the argmax label.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use visage_common::Frame;
use visage_core::{grayscale_plane, resize, InferenceAdapter, InferenceError};

/// Number of emotion classes the model scores
pub const EMOTION_COUNT: usize = 8;

/// Emotion classes in FER+ index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emotion {
    Neutral,
    Happiness,
    Surprise,
    Sadness,
    Anger,
    Disgust,
    Fear,
    Contempt,
}

impl Emotion {
    /// All emotions in model index order
    pub const ALL: [Emotion; EMOTION_COUNT] = [
        Emotion::Neutral,
        Emotion::Happiness,
        Emotion::Surprise,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Contempt,
    ];

    /// Get emotion from class index
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Get emotion label as string (FER+ labels)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happiness => "happiness",
            Emotion::Surprise => "surprise",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Contempt => "contempt",
        }
    }
}

/// Errors raised during emotion classification
#[derive(Debug, Error)]
pub enum EmotionError {
    #[error("Expected {EMOTION_COUNT} emotion scores, got {0}")]
    ScoreLength(usize),

    #[error("Classifier input shape {0:?} is not single-channel NHWC")]
    BadInputShape([usize; 4]),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),
}

/// Result of classifying one face frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Top emotion (argmax of the probability distribution)
    pub emotion: Emotion,
    /// Model index of the top emotion, in `[0, 8)`
    pub index: usize,
    /// Probability of the top emotion
    pub confidence: f32,
    /// Full distribution in label order, summing to 1.0 within epsilon
    pub probabilities: Vec<f32>,
}

/// Numerically-stable softmax: subtract the max before exponentiating.
///
/// Monotonic, so the argmax of the output always equals the argmax of the
/// raw scores.
#[must_use]
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max_score = scores.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max_score).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// Decode a raw 8-way score vector into a [`ClassificationResult`].
///
/// Ties resolve to the lowest index (first occurrence). The only failure is
/// a score vector whose length is not 8 - a programming error in the model
/// wiring, not a runtime condition to recover from.
pub fn decode_scores(scores: &[f32]) -> Result<ClassificationResult, EmotionError> {
    if scores.len() != EMOTION_COUNT {
        return Err(EmotionError::ScoreLength(scores.len()));
    }

    let probabilities = softmax(scores);

    let mut index = 0;
    let mut confidence = probabilities[0];
    for (i, &p) in probabilities.iter().enumerate().skip(1) {
        if p > confidence {
            index = i;
            confidence = p;
        }
    }

    // index < EMOTION_COUNT since probabilities has exactly EMOTION_COUNT entries
    let emotion = Emotion::ALL[index];

    Ok(ClassificationResult {
        emotion,
        index,
        confidence,
        probabilities,
    })
}

/// Emotion classifier: resample + grayscale-normalize a frame, run the
/// model, decode the score vector.
pub struct EmotionClassifier {
    adapter: Box<dyn InferenceAdapter>,
    input_width: u32,
    input_height: u32,
}

impl EmotionClassifier {
    /// Wrap an inference adapter whose input is a single-channel NHWC
    /// tensor (e.g. `(1, 64, 64, 1)` for FER+)
    pub fn new(adapter: Box<dyn InferenceAdapter>) -> Result<Self, EmotionError> {
        let shape = adapter.input_shape();
        let [batch, height, width, channels] = shape;
        if batch != 1 || channels != 1 || height == 0 || width == 0 {
            return Err(EmotionError::BadInputShape(shape));
        }

        Ok(Self {
            adapter,
            input_width: width as u32,
            input_height: height as u32,
        })
    }

    /// Classify the dominant emotion in a frame
    pub fn classify(&mut self, frame: &Frame) -> Result<ClassificationResult, EmotionError> {
        let resized = resize(frame, self.input_width, self.input_height);
        let input = grayscale_plane(&resized);

        let outputs = self.adapter.run(&input)?;
        let scores = outputs.first()?;

        let result = decode_scores(scores.data())?;
        debug!(
            "Classified emotion {:?} ({:.3})",
            result.emotion.as_str(),
            result.confidence
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::{FixedOutputAdapter, OutputTensor};

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_emotion_from_index() {
        assert_eq!(Emotion::from_index(0), Some(Emotion::Neutral));
        assert_eq!(Emotion::from_index(1), Some(Emotion::Happiness));
        assert_eq!(Emotion::from_index(7), Some(Emotion::Contempt));
        assert_eq!(Emotion::from_index(8), None);
    }

    #[test]
    fn test_label_order_is_stable() {
        let labels: Vec<&str> = Emotion::ALL.iter().map(Emotion::as_str).collect();
        assert_eq!(
            labels,
            vec![
                "neutral",
                "happiness",
                "surprise",
                "sadness",
                "anger",
                "disgust",
                "fear",
                "contempt"
            ]
        );
    }

    #[test]
    fn test_softmax_sums_to_one_and_preserves_argmax() {
        let scores = [3.5, -2.0, 0.1, 7.2, 7.1, -10.0, 0.0, 2.2];
        let probs = softmax(&scores);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < EPSILON);

        let raw_argmax = 3;
        let prob_argmax = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap()
            .0;
        assert_eq!(prob_argmax, raw_argmax);
    }

    #[test]
    fn test_softmax_stable_for_large_scores() {
        let scores = [1000.0, 999.0, 998.0];
        let probs = softmax(&scores);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_decode_ties_resolve_to_lowest_index() {
        let scores = [2.0, 5.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let result = decode_scores(&scores).unwrap();
        assert_eq!(result.index, 1);
        assert_eq!(result.emotion, Emotion::Happiness);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let result = decode_scores(&[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(EmotionError::ScoreLength(3))));
    }

    #[test]
    fn test_decode_distribution_sums_to_one() {
        let scores = [0.4, -1.2, 3.3, 0.0, 2.1, -0.5, 1.7, 0.9];
        let result = decode_scores(&scores).unwrap();
        assert_eq!(result.probabilities.len(), EMOTION_COUNT);
        assert!((result.probabilities.iter().sum::<f32>() - 1.0).abs() < EPSILON);
        assert!((result.probabilities[result.index] - result.confidence).abs() < EPSILON);
    }

    #[test]
    fn test_classifier_rejects_rgb_input_shape() {
        let adapter = FixedOutputAdapter::new([1, 64, 64, 3], Vec::new());
        assert!(matches!(
            EmotionClassifier::new(Box::new(adapter)),
            Err(EmotionError::BadInputShape(_))
        ));
    }

    #[test]
    fn test_classifier_end_to_end_with_canned_scores() {
        // Surprise (index 2) has the top raw score
        let scores = OutputTensor::new(
            vec![1, 1, 1, 8],
            vec![0.1, 0.3, 4.2, 0.0, 1.1, -2.0, 0.5, 0.2],
        )
        .unwrap();
        let adapter =
            FixedOutputAdapter::new([1, 4, 4, 1], vec![("scores".to_string(), scores)]);
        let mut classifier = EmotionClassifier::new(Box::new(adapter)).unwrap();

        // 9x7 frame gets resampled down to the adapter's 4x4 input
        let frame = Frame::solid(9, 7, [200, 180, 160]).unwrap();
        let result = classifier.classify(&frame).unwrap();

        assert_eq!(result.emotion, Emotion::Surprise);
        assert_eq!(result.index, 2);
        assert!((result.probabilities.iter().sum::<f32>() - 1.0).abs() < EPSILON);
    }
}
