use serde::{Deserialize, Serialize};
use crate::common::BvrDetection;

/// Detections one modality reported for one image, in detector order.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityBatch {
    pub image_id: String,
    pub detections: Vec<BvrDetection>,
}

impl ModalityBatch {
    pub fn new(image_id: &str, detections: Vec<BvrDetection>) -> Self {
        Self {
            image_id: image_id.to_string(),
            detections,
        }
    }

    pub fn empty(image_id: &str) -> Self {
        Self::new(image_id, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
