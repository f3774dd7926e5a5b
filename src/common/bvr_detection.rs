use serde::{Deserialize, Serialize};
use crate::common::BvrBox;

/// One detection reported by a single modality for one image.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BvrDetection {
    pub class_id: usize,
    pub bbox: BvrBox,
    pub confidence: f32,
    pub class_probabilities: Option<Vec<f32>>,
    pub class_logits: Option<Vec<f32>>,
}

impl BvrDetection {
    pub fn new(class_id: usize, bbox: BvrBox, confidence: f32) -> Self {
        Self {
            class_id,
            bbox,
            confidence,
            class_probabilities: None,
            class_logits: None,
        }
    }

    /// Sets the bounding box's coordinates using `(x1, y1, x2, y2)`.
    ///
    /// # Arguments
    ///
    /// * `x1` - The x-coordinate of the top-left corner.
    /// * `y1` - The y-coordinate of the top-left corner.
    /// * `x2` - The x-coordinate of the bottom-right corner.
    /// * `y2` - The y-coordinate of the bottom-right corner.
    ///
    /// # Returns
    ///
    /// A `BvrDetection` instance with updated coordinates and dimensions.
    pub fn with_x1y1_x2y2(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = BvrBox::default().with_x1y1_x2y2(x1, y1, x2, y2);
        self
    }

    /// Sets the confidence score of the detection.
    pub fn with_confidence(mut self, conf: f32) -> Self {
        self.confidence = conf;
        self
    }

    /// Sets the class ID of the detection.
    pub fn with_class_id(mut self, class_id: usize) -> Self {
        self.class_id = class_id;
        self
    }

    /// Attaches the per-class probability vector.
    pub fn with_probabilities(mut self, probs: &[f32]) -> Self {
        self.class_probabilities = Some(probs.to_vec());
        self
    }

    /// Attaches the per-class logit vector.
    pub fn with_logits(mut self, logits: &[f32]) -> Self {
        self.class_logits = Some(logits.to_vec());
        self
    }

    /// The logit at this detection's own predicted class, if logits are present.
    pub fn own_logit(&self) -> Option<f32> {
        self.class_logits.as_ref()?.get(self.class_id).copied()
    }
}
