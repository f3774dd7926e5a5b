use crate::common::FusionConfig;
use crate::data::{FusionState, ImageFusion};
use crate::fusion_runners::fusion_process::LateFusion;

/// Fuses image pairs as they arrive until the sending side hangs up.
pub fn fusion_worker(state: FusionState, config: FusionConfig) -> anyhow::Result<()> {
    config.validate()?;
    let fusion = LateFusion::new(config);
    log::info!("Fusion worker started ({})", fusion.method());

    let mut count = 0usize;
    // one message per image
    while let Ok(pair) = state.pair_rx.recv() {
        let result = fusion.run(&pair.first, &pair.second);
        if let Err(err) = &result {
            log::warn!("bvr_fusion: Failed to fuse {}: {}", pair.image_id(), err);
        }
        let outcome = ImageFusion {
            image_id: pair.image_id().to_string(),
            eval_id: None,
            first_count: pair.first.len(),
            second_count: pair.second.len(),
            result,
        };
        state
            .fused_tx
            .send(Box::new(outcome))
            .map_err(|_| anyhow::anyhow!("Fused output channel closed after {} images", count))?;
        count += 1;
    }

    log::info!("Fusion worker stopped after {} images", count);
    Ok(())
}
