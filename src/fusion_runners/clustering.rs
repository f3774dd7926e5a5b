use crate::common::BvrBox;
use crate::data::MergedBatch;

/// One anchor plus every remaining detection that overlapped it when it was picked.
///
/// Indices refer to rows of the merged batch; `matches` keeps score order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub anchor: usize,
    pub matches: Vec<usize>,
}

impl Cluster {
    pub fn is_singleton(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len() + 1
    }

    /// Matches followed by the anchor.
    pub fn members(&self) -> Vec<usize> {
        let mut members = self.matches.clone();
        members.push(self.anchor);
        members
    }
}

/// Greedy class-isolated overlap clustering.
///
/// Boxes are moved onto per-class tiles before overlaps are measured. The tiles only
/// keep classes apart for boxes inside one tile, so a match must also share the
/// anchor's class.
pub fn cluster_detections(boxes: &[BvrBox], scores: &[f32], classes: &[usize],
                          iou_threshold: f32, tile: (f32, f32)) -> Vec<Cluster> {
    let n = boxes.len().min(scores.len()).min(classes.len());

    let tiled: Vec<BvrBox> = boxes
        .iter()
        .zip(classes)
        .take(n)
        .map(|(b, &c)| b.on_class_tile(c, tile))
        .collect();
    let areas: Vec<f32> = tiled.iter().map(|b| b.area_inclusive()).collect();

    // sort_by is stable: equal scores keep their merged order
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut clusters = Vec::new();
    while !order.is_empty() {
        let anchor = order[0];
        let (matches, survivors): (Vec<usize>, Vec<usize>) = order[1..].iter().partition(|&&j| {
            if classes[j] != classes[anchor] {
                return false;
            }
            let inter = tiled[anchor].intersect_inclusive(&tiled[j]);
            let ovr = inter / (areas[anchor] + areas[j] - inter);
            ovr > iou_threshold
        });
        clusters.push(Cluster { anchor, matches });
        order = survivors;
    }

    clusters
}

/// Clusters every row of a merged batch.
pub fn cluster_batch(batch: &MergedBatch, iou_threshold: f32, tile: (f32, f32)) -> Vec<Cluster> {
    let scores = batch.scores.to_vec();
    cluster_detections(&batch.all_boxes(), &scores, &batch.classes, iou_threshold, tile)
}
