pub mod clustering;
pub mod fusion_process;
pub mod fusion_worker;
pub mod nms;
pub mod strategies;

pub use clustering::{cluster_batch, cluster_detections, Cluster};
pub use fusion_process::{FusionStage, LateFusion};
pub use fusion_worker::fusion_worker;
