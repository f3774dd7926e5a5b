use serde::{Deserialize, Serialize};
use crate::common::BvrBox;

/// A detection produced by fusing one cluster.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedDetection {
    pub class_id: usize,
    pub bbox: BvrBox,
    pub confidence: f32,
}

impl FusedDetection {
    pub fn new(class_id: usize, bbox: BvrBox, confidence: f32) -> Self {
        Self {
            class_id,
            bbox,
            confidence,
        }
    }
}

/// Predicted-instance record handed to the evaluation side.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedRecord {
    pub boxes: Vec<[f32; 4]>,
    pub scores: Vec<f32>,
    pub classes: Vec<usize>,
}

/// All fused detections for one image, in cluster order.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedBatch {
    pub image_id: String,
    pub detections: Vec<FusedDetection>,
}

impl FusedBatch {
    pub fn new(image_id: &str, detections: Vec<FusedDetection>) -> Self {
        Self {
            image_id: image_id.to_string(),
            detections,
        }
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn to_record(&self) -> FusedRecord {
        FusedRecord {
            boxes: self.detections.iter().map(|d| d.bbox.to_array()).collect(),
            scores: self.detections.iter().map(|d| d.confidence).collect(),
            classes: self.detections.iter().map(|d| d.class_id).collect(),
        }
    }
}
