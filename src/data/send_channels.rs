use crate::data::{ImageFusion, ImagePair};

/// Worker side of the fusion channels.
#[derive(Debug)]
pub struct FusionState {
    pub pair_rx: crossbeam_channel::Receiver<Box<ImagePair>>,
    pub fused_tx: crossbeam_channel::Sender<Box<ImageFusion>>,
}

/// Caller side of the fusion channels.
#[derive(Debug)]
pub struct FusionChannels {
    pub pair_tx: crossbeam_channel::Sender<Box<ImagePair>>,
    pub fused_rx: crossbeam_channel::Receiver<Box<ImageFusion>>,
}

pub fn fusion_channels() -> (FusionState, FusionChannels) {
    let (pair_tx, pair_rx) = crossbeam_channel::unbounded();
    let (fused_tx, fused_rx) = crossbeam_channel::unbounded();
    (FusionState { pair_rx, fused_tx }, FusionChannels { pair_tx, fused_rx })
}
