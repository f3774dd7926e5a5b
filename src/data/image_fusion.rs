use crate::common::{FusedBatch, FusionResult};
use crate::data::ModalityBatch;

/// The two modalities' batches for the same scene.
#[derive(Debug, Clone, Default)]
pub struct ImagePair {
    pub first: ModalityBatch,
    pub second: ModalityBatch,
}

impl ImagePair {
    pub fn new(first: ModalityBatch, second: ModalityBatch) -> Self {
        Self { first, second }
    }

    pub fn image_id(&self) -> &str {
        if self.first.image_id.is_empty() {
            &self.second.image_id
        } else {
            &self.first.image_id
        }
    }
}

/// Outcome of fusing one image; failures stay attached to their image.
#[derive(Debug, Clone)]
pub struct ImageFusion {
    pub image_id: String,
    /// Numeric id the evaluation side keys on, when the prediction files carry one.
    pub eval_id: Option<u64>,
    pub first_count: usize,
    pub second_count: usize,
    pub result: FusionResult<FusedBatch>,
}

impl ImageFusion {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn fused(&self) -> Option<&FusedBatch> {
        self.result.as_ref().ok()
    }
}
