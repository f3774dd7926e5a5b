use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use crate::common::{BvrBox, FusedDetection, FusionError, FusionMethod, FusionResult};
use crate::data::MergedBatch;
use crate::fusion_runners::clustering::Cluster;

/// Fuses one cluster into a single detection carrying the anchor's class.
pub fn fuse_cluster(method: FusionMethod, batch: &MergedBatch, cluster: &Cluster) -> FusionResult<FusedDetection> {
    let anchor = cluster.anchor;
    let class_id = batch.classes[anchor];
    let anchor_box = batch.bbox(anchor);

    if cluster.is_singleton() {
        let confidence = match method {
            m if m.is_logit_based() => own_class_logit_score(batch, anchor, m.is_softmax())?,
            _ => batch.scores[anchor],
        };
        return Ok(FusedDetection::new(class_id, anchor_box, confidence));
    }

    let members = cluster.members();
    let match_boxes: Vec<BvrBox> = cluster.matches.iter().map(|&i| batch.bbox(i)).collect();
    let member_boxes: Vec<BvrBox> = members.iter().map(|&i| batch.bbox(i)).collect();
    let member_scores: Vec<f32> = members.iter().map(|&i| batch.scores[i]).collect();

    let (confidence, bbox) = match method {
        FusionMethod::Nms | FusionMethod::Pooling => (batch.scores[anchor], anchor_box),
        FusionMethod::AvgScore => {
            let mean = member_scores.iter().sum::<f32>() / member_scores.len() as f32;
            (mean, BvrBox::mean(&member_boxes).unwrap_or(anchor_box))
        }
        FusionMethod::Bayesian => {
            let score = bayesian_cluster_score(batch, &members, class_id)?;
            (score, BvrBox::mean(&match_boxes).unwrap_or(anchor_box))
        }
        FusionMethod::BayesianAvgBox => {
            let score = bayesian_cluster_score(batch, &members, class_id)?;
            (score, BvrBox::mean(&member_boxes).unwrap_or(anchor_box))
        }
        FusionMethod::BayesianWeightedBox => {
            let score = bayesian_cluster_score(batch, &members, class_id)?;
            // all-zero weights fall back to the plain mean
            let bbox = BvrBox::weighted_mean(&member_boxes, &member_scores)
                .or_else(|| BvrBox::mean(&member_boxes))
                .unwrap_or(anchor_box);
            (score, bbox)
        }
        FusionMethod::AvgLogits
        | FusionMethod::AvgLogitsSoftmax
        | FusionMethod::SumLogits
        | FusionMethod::SumLogitsSoftmax => {
            let logits = batch.logits.as_ref().ok_or(FusionError::MissingField {
                field: "class_logits",
                index: anchor,
                method: method.str(),
            })?;
            let average = matches!(method, FusionMethod::AvgLogits | FusionMethod::AvgLogitsSoftmax);
            let combined = combine_logits(logits.select(Axis(0), &members).view(), average);
            let score = if method.is_softmax() {
                softmax(combined.view())[class_id]
            } else {
                combined[class_id]
            };
            (score as f32, BvrBox::mean(&match_boxes).unwrap_or(anchor_box))
        }
    };

    Ok(FusedDetection::new(class_id, bbox, confidence))
}

/// Score a lone detection gets under the logit strategies.
pub fn own_class_logit_score(batch: &MergedBatch, index: usize, apply_softmax: bool) -> FusionResult<f32> {
    let missing = FusionError::MissingField { field: "class_logits", index, method: "logit fusion" };
    let class_id = batch.classes[index];
    if apply_softmax {
        let row = batch.logit_row(index).ok_or(missing)?;
        let row = row.mapv(|v| v as f64);
        Ok(softmax(row.view())[class_id] as f32)
    } else {
        batch.own_logits.as_ref().map(|l| l[index]).ok_or(missing)
    }
}

fn bayesian_cluster_score(batch: &MergedBatch, members: &[usize], class_id: usize) -> FusionResult<f32> {
    let probs = batch.probabilities.as_ref().ok_or(FusionError::MissingField {
        field: "class_probabilities",
        index: members.last().copied().unwrap_or_default(),
        method: "baysian",
    })?;
    for &m in members {
        let p = probs[[m, class_id]];
        if p <= 0. {
            return Err(FusionError::InvalidScore { what: "positive-class probability", index: m, value: p as f64 });
        }
    }
    Ok(bayesian_fusion_multiclass(probs.select(Axis(0), members).view(), class_id) as f32)
}

/// Multiclass Bayesian fusion of independent per-detector class distributions.
///
/// Rows are detections, columns classes. The positive evidence is the product of every
/// row's mass at `class_id`. The complementary evidence sums, over `K` negative channels,
/// the product of every row's value in that channel: the `K-1` other classes fill channels
/// `0..K-1` positionally, the last channel holds the unassigned mass `1 - sum(row)`.
/// Products are taken in log space and the ratio is formed without leaving it, so long
/// clusters do not underflow. Every row's `class_id` mass must be positive.
pub fn bayesian_fusion_multiclass(probs: ArrayView2<f32>, class_id: usize) -> f64 {
    let k = probs.ncols();
    let mut log_positive = 0f64;
    let mut log_negative = vec![0f64; k];

    for row in probs.rows() {
        log_positive += (row[class_id] as f64).ln();

        let mut slot = 0;
        for (j, &p) in row.iter().enumerate() {
            if j == class_id {
                continue;
            }
            log_negative[slot] += (p as f64).ln();
            slot += 1;
        }

        let unassigned = (1. - row.iter().map(|&p| p as f64).sum::<f64>()).max(0.);
        log_negative[k - 1] += unassigned.ln();
    }

    // positive / (positive + sum(negative)) == 1 / (1 + sum(negative / positive))
    let ratio: f64 = log_negative.iter().map(|&ln| (ln - log_positive).exp()).sum();
    1. / (1. + ratio)
}

/// Elementwise mean (or sum) of the rows.
pub fn combine_logits(logits: ArrayView2<f32>, average: bool) -> Array1<f64> {
    let rows = logits.nrows().max(1) as f64;
    let sum = logits.mapv(|v| v as f64).sum_axis(Axis(0));
    if average {
        sum / rows
    } else {
        sum
    }
}

/// Softmax with the maximum subtracted first.
pub fn softmax(values: ArrayView1<f64>) -> Array1<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = values.mapv(|v| (v - max).exp());
    let total = exp.sum();
    exp / total
}
