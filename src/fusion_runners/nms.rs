use std::collections::BTreeMap;
use crate::common::FusedDetection;

pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
    fn class_id(&self) -> usize;
}

impl Nms for FusedDetection {
    fn iou(&self, other: &Self) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }

    fn class_id(&self) -> usize {
        self.class_id
    }
}

/// Greedy class-aware suppression. Returns kept indices, highest confidence first.
///
/// A box is dropped when its IoU with an already kept box of the same class exceeds
/// `iou_threshold`.
pub fn nms<T: Nms>(boxes: &[T], iou_threshold: f32) -> Vec<usize> {
    let subset: Vec<usize> = (0..boxes.len()).collect();
    nms_subset(boxes, &subset, iou_threshold)
}

fn nms_subset<T: Nms>(boxes: &[T], subset: &[usize], iou_threshold: f32) -> Vec<usize> {
    let mut order = subset.to_vec();
    order.sort_by(|&a, &b| boxes[b].confidence().total_cmp(&boxes[a].confidence()));

    let mut keep: Vec<usize> = Vec::with_capacity(order.len());
    for index in order {
        let drop = keep.iter().any(|&prev| {
            boxes[prev].class_id() == boxes[index].class_id() && boxes[prev].iou(&boxes[index]) > iou_threshold
        });
        if !drop {
            keep.push(index);
        }
    }
    keep
}

/// Class-aware suppression that splits very large inputs into per-class buckets.
///
/// Below `bucket_threshold` this is plain [`nms`]. Above it each class is suppressed on
/// its own and the survivors are merged back in confidence order.
pub fn batched_nms<T: Nms>(boxes: &[T], iou_threshold: f32, bucket_threshold: usize) -> Vec<usize> {
    if boxes.len() <= bucket_threshold {
        return nms(boxes, iou_threshold);
    }

    let mut buckets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, b) in boxes.iter().enumerate() {
        buckets.entry(b.class_id()).or_default().push(i);
    }
    log::debug!("Bucketed suppression over {} boxes in {} classes", boxes.len(), buckets.len());

    let mut keep: Vec<usize> = buckets
        .values()
        .flat_map(|bucket| nms_subset(boxes, bucket, iou_threshold))
        .collect();
    keep.sort_by(|&a, &b| {
        boxes[b].confidence().total_cmp(&boxes[a].confidence()).then(a.cmp(&b))
    });
    keep
}
