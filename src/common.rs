mod bvr_box;
mod bvr_detection;
mod fused_detection;
mod fusion_config;
mod fusion_error;
mod fusion_method;

pub use bvr_box::*;
pub use bvr_detection::*;
pub use fused_detection::*;
pub use fusion_config::*;
pub use fusion_error::*;
pub use fusion_method::*;
