//! Run the detection pipeline against a synthetic frame source and a canned
//! inference adapter, printing each published report.
//!
//! No camera or model file is required:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example synthetic
//! ```

use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;
use visage_common::{Frame, FrameError, FrameSource};
use visage_core::{FixedOutputAdapter, OutputTensor};
use visage_face::{FaceDetector, FaceDetectorConfig};
use visage_pipeline::{Analysis, FaceAnalyzer, Pipeline, ResultSink};

/// Source producing a moving gradient so successive frames differ
struct GradientSource {
    frame_index: u8,
}

impl FrameSource for GradientSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        self.frame_index = self.frame_index.wrapping_add(16);
        let mut data = Vec::with_capacity(64 * 48 * 3);
        for y in 0..48u32 {
            for x in 0..64u32 {
                data.push((x * 4) as u8);
                data.push((y * 5) as u8);
                data.push(self.frame_index);
            }
        }
        Ok(Some(Frame::rgb(64, 48, data)?))
    }
}

struct LogSink;

impl ResultSink for LogSink {
    fn publish(&mut self, analysis: &Analysis) {
        if let Analysis::Face(report) = analysis {
            match &report.detection {
                Some(det) => info!(
                    "Face: score {:.2}, box ({:.2}, {:.2}, {:.2}, {:.2}), crop {:?}",
                    det.score,
                    det.bbox.x1,
                    det.bbox.y1,
                    det.bbox.x2,
                    det.bbox.y2,
                    report.crop_rect
                ),
                None => info!("No face above threshold"),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Canned detector output: one anchor at score 0.86 in the frame center
    let adapter = FixedOutputAdapter::new(
        [1, 240, 320, 3],
        vec![
            (
                "scores".to_string(),
                OutputTensor::new(vec![1, 1, 1, 2], vec![0.14, 0.86])?,
            ),
            (
                "boxes".to_string(),
                OutputTensor::new(vec![1, 1, 1, 4], vec![0.35, 0.30, 0.65, 0.70])?,
            ),
        ],
    );

    let detector = FaceDetector::new(Box::new(adapter), FaceDetectorConfig::new(0.5))?;
    let analyzer = FaceAnalyzer::new(detector, Some((640.0, 360.0)));

    let mut pipeline = Pipeline::new(
        Box::new(GradientSource { frame_index: 0 }),
        Box::new(analyzer),
        Box::new(LogSink),
    );

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        let _ = tx.send(true);
    });

    pipeline.run(Duration::from_millis(500), rx).await;

    info!(
        "Pipeline stopped (state {:?}, {} dropped ticks)",
        pipeline.state(),
        pipeline.dropped_ticks()
    );

    Ok(())
}
