//! Frame analyzers: the preprocessing + inference + decode step of one
//! pipeline cycle, behind a common trait so the state machine stays
//! agnostic of which model runs.

use visage_common::Frame;
use visage_emotion::{ClassificationResult, EmotionClassifier};
use visage_face::mapping::{to_crop_rect, to_ui_rect, CropRect, UiRect};
use visage_face::{Detection, FaceDetector};

use crate::PipelineError;

/// Decoded result of one pipeline cycle
#[derive(Debug, Clone)]
pub enum Analysis {
    /// Emotion classification of the whole frame
    Emotion(ClassificationResult),
    /// Face detection report, possibly empty
    Face(FaceReport),
}

/// Everything the detection cycle produced for downstream consumers.
///
/// `detection: None` is the valid no-face outcome; the mapped rectangles
/// exist only when a face was found.
#[derive(Debug, Clone)]
pub struct FaceReport {
    /// Best detection above threshold, if any
    pub detection: Option<Detection>,
    /// Detection mapped into display coordinates (center-origin, Y up),
    /// when a display size is configured
    pub ui_rect: Option<UiRect>,
    /// Detection mapped into a source-image crop rectangle (bottom-left
    /// origin), for the image-encoding consumer
    pub crop_rect: Option<CropRect>,
}

/// One cycle of preprocessing, inference, and decoding
pub trait Analyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<Analysis, PipelineError>;
}

/// Analyzer producing [`Analysis::Emotion`] via an [`EmotionClassifier`]
pub struct EmotionAnalyzer {
    classifier: EmotionClassifier,
}

impl EmotionAnalyzer {
    #[must_use]
    pub fn new(classifier: EmotionClassifier) -> Self {
        Self { classifier }
    }
}

impl Analyzer for EmotionAnalyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<Analysis, PipelineError> {
        Ok(Analysis::Emotion(self.classifier.classify(frame)?))
    }
}

/// Analyzer producing [`Analysis::Face`] via a [`FaceDetector`].
///
/// Retains the one most recent frame so a consumer can crop the reported
/// rectangle out of the exact pixels the detection ran on; the retained
/// frame is overwritten at the start of every cycle.
pub struct FaceAnalyzer {
    detector: FaceDetector,
    display_size: Option<(f32, f32)>,
    last_frame: Option<Frame>,
}

impl FaceAnalyzer {
    #[must_use]
    pub fn new(detector: FaceDetector, display_size: Option<(f32, f32)>) -> Self {
        Self {
            detector,
            display_size,
            last_frame: None,
        }
    }

    /// The frame the most recent report was computed from
    #[must_use]
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }
}

impl Analyzer for FaceAnalyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<Analysis, PipelineError> {
        self.last_frame = Some(frame.clone());

        let detection = self.detector.detect(frame)?;

        let (ui_rect, crop_rect) = match &detection {
            Some(det) => (
                self.display_size
                    .map(|(w, h)| to_ui_rect(&det.bbox, w, h)),
                Some(to_crop_rect(&det.bbox, frame.width(), frame.height())),
            ),
            None => (None, None),
        };

        Ok(Analysis::Face(FaceReport {
            detection,
            ui_rect,
            crop_rect,
        }))
    }
}
