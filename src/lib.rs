mod utils;
pub mod common;
pub mod data;
pub mod fusion_runners;

use std::path::Path;
use std::time::Instant;
use rayon::prelude::*;
use crate::common::{FusedBatch, FusionConfig, FusionResult};
use crate::data::{DatasetFusion, FusionSummary, ImageFusion, ModalityBatch, PredictionFile};
use crate::fusion_runners::LateFusion;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// Fuses the two modalities' detections of a single image.
pub fn fuse_image(config: &FusionConfig, first: &ModalityBatch, second: &ModalityBatch) -> FusionResult<FusedBatch> {
    LateFusion::new(config.clone()).run(first, second)
}

/// Fuses every image of two prediction sets, pairing images by position.
///
/// Images are independent and run in parallel. A malformed image is recorded as a
/// failure in its [`ImageFusion`] and the remaining images are still fused.
pub fn fuse_dataset(config: &FusionConfig, first: &PredictionFile, second: &PredictionFile) -> Result<DatasetFusion> {
    config.validate()?;
    first.validate()?;
    second.validate()?;
    if first.len() != second.len() {
        anyhow::bail!("Prediction sets cover a different number of images: {} vs {}", first.len(), second.len());
    }

    let now = Instant::now();
    let fusion = LateFusion::new(config.clone());
    log::info!("Fusing {} images with {}", first.len(), fusion.method());

    let images: Vec<ImageFusion> = (0..first.len())
        .into_par_iter()
        .map(|i| {
            let image_id = first.image[i].clone();
            let eval_id = second.image_id.get(i).or(first.image_id.get(i)).copied();
            let first_count = first.boxes[i].len();
            let second_count = second.boxes[i].len();
            let result = first
                .batch(i)
                .and_then(|a| second.batch(i).map(|b| (a, b)))
                .and_then(|(a, b)| fusion.run(&a, &b));
            if let Err(err) = &result {
                log::warn!("Skipping fused output for {}: {}", image_id, err);
            }
            ImageFusion { image_id, eval_id, first_count, second_count, result }
        })
        .collect();

    let fused = DatasetFusion::new(images);
    log::info!("{}", fused.summary);
    log::info!("Fusion time: {:?}", now.elapsed());
    Ok(fused)
}

/// Loads two prediction files, fuses them and writes the successful images to `out_path`.
pub fn fuse_files<P: AsRef<Path>>(config: &FusionConfig, first_path: P, second_path: P, out_path: P) -> Result<FusionSummary> {
    let first = PredictionFile::load(first_path)?;
    let second = PredictionFile::load(second_path)?;
    let fused = fuse_dataset(config, &first, &second)?;
    fused.to_output_file().save(out_path)?;
    Ok(fused.summary)
}
