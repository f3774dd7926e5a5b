use std::time::Instant;
use crate::common::{FusedBatch, FusedDetection, FusionConfig, FusionError, FusionMethod, FusionResult};
use crate::data::{MergedBatch, ModalityBatch};
use crate::fusion_runners::clustering::{cluster_batch, Cluster};
use crate::fusion_runners::nms::batched_nms;
use crate::fusion_runners::strategies::{fuse_cluster, own_class_logit_score};
use crate::utils;

/// Stages one image passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionStage {
    Init,
    EmptyPassthrough,
    Merge,
    Cluster,
    Fuse,
    Done,
}

impl FusionStage {
    pub fn str(&self) -> &'static str {
        match self {
            FusionStage::Init => "Init",
            FusionStage::EmptyPassthrough => "Empty passthrough",
            FusionStage::Merge => "Merge",
            FusionStage::Cluster => "Cluster",
            FusionStage::Fuse => "Fuse",
            FusionStage::Done => "Done",
        }
    }
}

/// Late fusion of two modalities' detections, one image at a time.
///
/// Holds nothing but its configuration, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct LateFusion {
    config: FusionConfig,
}

impl LateFusion {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn method(&self) -> FusionMethod {
        self.config.method
    }

    /// Merges both batches, validating the fields the strategy needs.
    pub fn prepare(&self, first: &ModalityBatch, second: &ModalityBatch) -> FusionResult<MergedBatch> {
        MergedBatch::prepare(first, second, self.config.method)
    }

    pub fn cluster(&self, batch: &MergedBatch) -> Vec<Cluster> {
        cluster_batch(batch, self.config.iou_threshold, self.config.tile_size)
    }

    /// Applies the strategy to every cluster, in cluster order.
    pub fn fuse(&self, batch: &MergedBatch, clusters: &[Cluster]) -> FusionResult<Vec<FusedDetection>> {
        clusters
            .iter()
            .map(|cluster| fuse_cluster(self.config.method, batch, cluster))
            .collect()
    }

    /// Fuses one image.
    ///
    /// If either modality saw nothing the other one's detections are returned as they are
    /// (logit strategies still map scores to the own-class logit). Any validation failure
    /// aborts this image only, and so does an invalid configuration.
    pub fn run(&self, first: &ModalityBatch, second: &ModalityBatch) -> FusionResult<FusedBatch> {
        self.config
            .validate()
            .map_err(|err| FusionError::InvalidConfig(err.to_string()))?;

        let start = Instant::now();
        let mut _elapsed = start.elapsed();
        let image_id = if first.image_id.is_empty() { &second.image_id } else { &first.image_id };
        let method = self.config.method;

        log::debug!("{} | {} | {} + {} detections", image_id, FusionStage::Init.str(), first.len(), second.len());

        if first.is_empty() || second.is_empty() {
            let detections = self.passthrough(first, second)?;
            _elapsed = utils::trace(image_id, FusionStage::EmptyPassthrough.str(), start, _elapsed);
            log::debug!("{} | {} | {} detections", image_id, FusionStage::Done.str(), detections.len());
            return Ok(FusedBatch::new(image_id, detections));
        }

        let batch = self.prepare(first, second)?;
        _elapsed = utils::trace(image_id, FusionStage::Merge.str(), start, _elapsed);

        let detections = match method {
            FusionMethod::Pooling => Self::rows(&batch),
            FusionMethod::Nms => {
                let rows: Vec<FusedDetection> = Self::rows(&batch);
                let keep = batched_nms(&rows, self.config.iou_threshold, self.config.nms_bucket_threshold);
                _elapsed = utils::trace(image_id, FusionStage::Cluster.str(), start, _elapsed);
                keep.into_iter().map(|i| rows[i]).collect()
            }
            _ => {
                let clusters = self.cluster(&batch);
                _elapsed = utils::trace(image_id, FusionStage::Cluster.str(), start, _elapsed);
                self.fuse(&batch, &clusters)?
            }
        };
        _elapsed = utils::trace(image_id, FusionStage::Fuse.str(), start, _elapsed);

        log::debug!("{} | {} | {} detections from {} merged", image_id, FusionStage::Done.str(),
                    detections.len(), batch.len());
        Ok(FusedBatch::new(image_id, detections))
    }

    fn passthrough(&self, first: &ModalityBatch, second: &ModalityBatch) -> FusionResult<Vec<FusedDetection>> {
        let method = self.config.method;
        if method.is_logit_based() {
            let batch = MergedBatch::prepare(first, second, method)?;
            (0..batch.len())
                .map(|i| {
                    let score = own_class_logit_score(&batch, i, method.is_softmax())?;
                    Ok(FusedDetection::new(batch.classes[i], batch.bbox(i), score))
                })
                .collect()
        } else {
            // validation only; no class vectors are read
            let batch = MergedBatch::prepare(first, second, FusionMethod::Pooling)?;
            Ok(Self::rows(&batch))
        }
    }

    fn rows(batch: &MergedBatch) -> Vec<FusedDetection> {
        (0..batch.len())
            .map(|i| FusedDetection::new(batch.classes[i], batch.bbox(i), batch.scores[i]))
            .collect()
    }
}
