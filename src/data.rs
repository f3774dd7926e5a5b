mod dataset_fusion;
mod image_fusion;
mod merged_batch;
mod modality_batch;
mod prediction_file;
mod send_channels;

pub use dataset_fusion::{DatasetFusion, FusionSummary};
pub use image_fusion::{ImageFusion, ImagePair};
pub use merged_batch::MergedBatch;
pub use modality_batch::ModalityBatch;
pub use prediction_file::{FusedOutputFile, PredictionFile};
pub use send_channels::{fusion_channels, FusionChannels, FusionState};
