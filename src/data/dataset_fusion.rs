use serde::{Deserialize, Serialize};
use crate::data::{FusedOutputFile, ImageFusion};

/// Detection counts over a fusion run.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionSummary {
    pub images: usize,
    pub failed: usize,
    pub avg_first: f32,
    pub avg_second: f32,
    pub avg_fused: f32,
}

impl FusionSummary {
    /// Averages are per input image; failed images contribute no fused detections.
    pub fn from_images(images: &[ImageFusion]) -> Self {
        let n = images.len();
        if n == 0 {
            return Self::default();
        }
        let first: usize = images.iter().map(|i| i.first_count).sum();
        let second: usize = images.iter().map(|i| i.second_count).sum();
        let fused: usize = images.iter().filter_map(|i| i.fused()).map(|f| f.len()).sum();
        Self {
            images: n,
            failed: images.iter().filter(|i| !i.is_ok()).count(),
            avg_first: first as f32 / n as f32,
            avg_second: second as f32 / n as f32,
            avg_fused: fused as f32 / n as f32,
        }
    }
}

impl std::fmt::Display for FusionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Images: {} ({} failed) | Avg boxes first: {:.3} | Avg boxes second: {:.3} | Avg boxes fused: {:.3}",
               self.images, self.failed, self.avg_first, self.avg_second, self.avg_fused)
    }
}

/// Every image's outcome, in input order, plus the run summary.
#[derive(Debug, Clone, Default)]
pub struct DatasetFusion {
    pub images: Vec<ImageFusion>,
    pub summary: FusionSummary,
}

impl DatasetFusion {
    pub fn new(images: Vec<ImageFusion>) -> Self {
        let summary = FusionSummary::from_images(&images);
        Self { images, summary }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ImageFusion> {
        self.images.iter().filter(|i| !i.is_ok())
    }

    /// Successful images in the output column layout; failed images are left out.
    pub fn to_output_file(&self) -> FusedOutputFile {
        let mut out = FusedOutputFile::default();
        for image in &self.images {
            if let Some(fused) = image.fused() {
                out.push(fused, image.eval_id);
            }
        }
        out
    }
}
