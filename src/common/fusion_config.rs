use std::path::Path;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use crate::common::FusionMethod;

pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
/// Expected input resolution; one tile per class during clustering.
pub const DEFAULT_TILE_SIZE: (f32, f32) = (640., 512.);
/// Above this many detections plain suppression runs per class bucket.
pub const DEFAULT_NMS_BUCKET_THRESHOLD: usize = 40_000;

/// Settings fixed for a whole fusion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    #[serde(rename = "strategy")]
    pub method: FusionMethod,
    pub iou_threshold: f32,
    pub tile_size: (f32, f32),
    pub nms_bucket_threshold: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            method: FusionMethod::default(),
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            tile_size: DEFAULT_TILE_SIZE,
            nms_bucket_threshold: DEFAULT_NMS_BUCKET_THRESHOLD,
        }
    }
}

impl FusionConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_method(mut self, method: FusionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_method_name(mut self, name: &str) -> anyhow::Result<Self> {
        self.method = match FusionMethod::from_str(name) {
            Some(method) => method,
            None => anyhow::bail!(
                "Unknown fusion strategy '{}'. Expected one of: {}",
                name,
                FusionMethod::all_fusion_methods().join(", ")
            ),
        };
        Ok(self)
    }

    pub fn with_iou(mut self, x: f32) -> Self {
        self.iou_threshold = x;
        self
    }

    pub fn with_tile_size(mut self, width: f32, height: f32) -> Self {
        self.tile_size = (width, height);
        self
    }

    pub fn with_nms_bucket_threshold(mut self, n: usize) -> Self {
        self.nms_bucket_threshold = n;
        self
    }

    /// Reads a JSON config; missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fusion config {}", path.display()))?;
        let config: FusionConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fusion config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.iou_threshold > 0. && self.iou_threshold < 1.) {
            anyhow::bail!("IoU threshold must lie strictly between 0 and 1, got {}", self.iou_threshold);
        }
        let (w, h) = self.tile_size;
        if !(w > 0. && h > 0. && w.is_finite() && h.is_finite()) {
            anyhow::bail!("Tile size must be positive, got {}x{}", w, h);
        }
        Ok(())
    }
}

impl std::fmt::Display for FusionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fusion Strategy: {}\n\
        IoU Threshold: {}\n\
        Class Tile Size: {}x{}\n\
        NMS Bucket Threshold: {}",
               self.method, self.iou_threshold,
               self.tile_size.0, self.tile_size.1, self.nms_bucket_threshold)
    }
}
