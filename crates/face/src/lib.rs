//! Single-face detection from anchor-based detector outputs.
//!
//! The detector model (UltraFace-style) emits two parallel tensors per
//! inference: scores `(1, 1, N, 2)` with a `[background, face]` pair per
//! anchor, and boxes `(1, 1, N, 4)` with normalized corner coordinates
//! already decoded by the model. This crate selects the best-scoring anchor
//! above a configurable threshold - argmax with threshold, not NMS. At most
//! one detection is ever reported, by design (single-face use case).
//!
//! Coordinate remapping into UI space and into source-image crop rectangles
//! lives in [`mapping`].

pub mod mapping;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use visage_common::Frame;
use visage_core::{resize, rgb_plane, InferenceAdapter, InferenceError, OutputTensor};

/// Errors raised during face detection
#[derive(Debug, Error)]
pub enum FaceError {
    #[error("Unexpected scores tensor shape {0:?}, want (1, 1, N, classes)")]
    ScoresShape(Vec<usize>),

    #[error("Unexpected boxes tensor shape {0:?}, want (1, 1, N, 4)")]
    BoxesShape(Vec<usize>),

    #[error("Anchor count mismatch: {scores} score rows vs {boxes} box rows")]
    AnchorCountMismatch { scores: usize, boxes: usize },

    #[error("Score index {index} out of range for {classes} classes")]
    ScoreIndexOutOfRange { index: usize, classes: usize },

    #[error("Detector input shape {0:?} is not three-channel NHWC")]
    BadInputShape([usize; 4]),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),
}

/// Corner-form bounding box, normalized to `[0, 1]` relative to the model
/// input frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Box width
    #[must_use]
    #[inline]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Box height
    #[must_use]
    #[inline]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Box center `(cx, cy)`
    #[must_use]
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// One detected face: confidence score plus its normalized box.
///
/// Absence of a detection is expressed as `Option::None` by the decoder,
/// never as a zeroed-out `Detection`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Face probability in `[0, 1]`
    pub score: f32,
    /// Normalized face box
    pub bbox: BoundingBox,
}

/// Face detector configuration.
///
/// The score threshold is a deployment decision - observed values range
/// from a strict 0.7 down to a loose 0.05 - so there is deliberately no
/// `Default` impl: callers must state the threshold they want.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaceDetectorConfig {
    /// Minimum face probability for a detection to be reported
    pub score_threshold: f32,
    /// Which class of each anchor's score pair is the face probability
    pub score_index: usize,
}

impl FaceDetectorConfig {
    /// Config with the conventional `[background, face]` class layout
    #[must_use]
    pub fn new(score_threshold: f32) -> Self {
        Self {
            score_threshold,
            score_index: 1,
        }
    }
}

/// Decode anchor tensors into zero-or-one best detection.
///
/// Single pass over all N anchors: track the maximum face probability and
/// its index, then report that anchor's box if the maximum clears
/// `min_score`. `Ok(None)` is the valid "nothing above threshold" outcome,
/// distinct from the `Err` shape faults.
pub fn decode_detections(
    scores: &OutputTensor,
    boxes: &OutputTensor,
    score_index: usize,
    min_score: f32,
) -> Result<Option<Detection>, FaceError> {
    let scores_dims = scores
        .dims4()
        .map_err(|_| FaceError::ScoresShape(scores.shape().to_vec()))?;
    let boxes_dims = boxes
        .dims4()
        .map_err(|_| FaceError::BoxesShape(boxes.shape().to_vec()))?;

    let [sb, so, num_anchors, classes] = scores_dims;
    if sb != 1 || so != 1 || classes < 2 {
        return Err(FaceError::ScoresShape(scores.shape().to_vec()));
    }

    let [bb, bo, box_rows, coords] = boxes_dims;
    if bb != 1 || bo != 1 || coords != 4 {
        return Err(FaceError::BoxesShape(boxes.shape().to_vec()));
    }

    if box_rows != num_anchors {
        return Err(FaceError::AnchorCountMismatch {
            scores: num_anchors,
            boxes: box_rows,
        });
    }

    if score_index >= classes {
        return Err(FaceError::ScoreIndexOutOfRange {
            index: score_index,
            classes,
        });
    }

    let score_data = scores.data();
    let mut best_score = f32::NEG_INFINITY;
    let mut best_index: Option<usize> = None;

    for i in 0..num_anchors {
        let score = score_data[i * classes + score_index];
        if score > best_score {
            best_score = score;
            best_index = Some(i);
        }
    }

    let Some(best) = best_index else {
        return Ok(None);
    };
    if best_score <= min_score {
        debug!(
            "No face above threshold (best {:.3} at anchor {}, threshold {:.3})",
            best_score, best, min_score
        );
        return Ok(None);
    }

    let row = &boxes.data()[best * 4..best * 4 + 4];
    let bbox = BoundingBox {
        x1: row[0].clamp(0.0, 1.0),
        y1: row[1].clamp(0.0, 1.0),
        x2: row[2].clamp(0.0, 1.0),
        y2: row[3].clamp(0.0, 1.0),
    };

    debug!(
        "Best face at anchor {} with score {:.3}, box ({:.3}, {:.3}, {:.3}, {:.3})",
        best, best_score, bbox.x1, bbox.y1, bbox.x2, bbox.y2
    );

    Ok(Some(Detection {
        score: best_score,
        bbox,
    }))
}

/// Face detector: resample + RGB-normalize a frame, run the model, pick the
/// best anchor.
pub struct FaceDetector {
    adapter: Box<dyn InferenceAdapter>,
    config: FaceDetectorConfig,
    input_width: u32,
    input_height: u32,
}

impl FaceDetector {
    /// Wrap an inference adapter whose input is a three-channel NHWC tensor
    /// (e.g. `(1, 240, 320, 3)` for UltraFace RFB-320)
    pub fn new(
        adapter: Box<dyn InferenceAdapter>,
        config: FaceDetectorConfig,
    ) -> Result<Self, FaceError> {
        let shape = adapter.input_shape();
        let [batch, height, width, channels] = shape;
        if batch != 1 || channels != 3 || height == 0 || width == 0 {
            return Err(FaceError::BadInputShape(shape));
        }

        Ok(Self {
            adapter,
            config,
            input_width: width as u32,
            input_height: height as u32,
        })
    }

    /// Detector configuration
    #[must_use]
    pub fn config(&self) -> &FaceDetectorConfig {
        &self.config
    }

    /// Detect the most confident face in a frame, if any clears the
    /// configured threshold
    pub fn detect(&mut self, frame: &Frame) -> Result<Option<Detection>, FaceError> {
        let resized = resize(frame, self.input_width, self.input_height);
        let input = rgb_plane(&resized);

        let outputs = self.adapter.run(&input)?;
        let scores = outputs.named_or("scores", 0)?;
        let boxes = outputs.named_or("boxes", 1)?;

        decode_detections(
            scores,
            boxes,
            self.config.score_index,
            self.config.score_threshold,
        )
    }
}
