use ndarray::{Array1, Array2, ArrayView1};
use crate::common::{BvrBox, BvrDetection, ClassVectors, FusionError, FusionMethod, FusionResult};
use crate::data::ModalityBatch;

/// Both modalities' detections for one image, concatenated field by field.
///
/// Rows `0..split` come from the first modality, `split..` from the second.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedBatch {
    pub boxes: Array2<f32>,
    pub scores: Array1<f32>,
    pub classes: Vec<usize>,
    pub probabilities: Option<Array2<f32>>,
    pub logits: Option<Array2<f32>>,
    /// Logit at each row's own class, present whenever `logits` is.
    pub own_logits: Option<Array1<f32>>,
    pub split: usize,
}

impl MergedBatch {
    /// Merges `first` then `second`, validating every field `method` reads.
    pub fn prepare(first: &ModalityBatch, second: &ModalityBatch, method: FusionMethod) -> FusionResult<Self> {
        let detections: Vec<&BvrDetection> = first.detections.iter().chain(second.detections.iter()).collect();
        let n = detections.len();

        for (index, det) in detections.iter().enumerate() {
            let score = det.confidence;
            if !score.is_finite() || !(0. ..=1.).contains(&score) {
                return Err(FusionError::InvalidScore { what: "score", index, value: score as f64 });
            }
            if let Some(bad) = det.bbox.to_array().iter().find(|v| !v.is_finite()) {
                return Err(FusionError::InvalidScore { what: "box coordinate", index, value: *bad as f64 });
            }
        }

        let mut boxes = Vec::with_capacity(n * 4);
        detections.iter().for_each(|d| boxes.extend_from_slice(&d.bbox.to_array()));
        let boxes = Array2::from_shape_vec((n, 4), boxes).map_err(|_| FusionError::ShapeMismatch {
            field: "boxes",
            expected: n * 4,
            found: 0,
        })?;
        let scores = detections.iter().map(|d| d.confidence).collect::<Array1<f32>>();
        let classes = detections.iter().map(|d| d.class_id).collect::<Vec<usize>>();

        let required = method.required_vectors();
        let probabilities = match required {
            ClassVectors::Probabilities => {
                Some(Self::stack_vectors(first, second, &detections, required, method, |d| d.class_probabilities.as_deref())?)
            }
            _ => None,
        };
        let logits = match required {
            ClassVectors::Logits => {
                Some(Self::stack_vectors(first, second, &detections, required, method, |d| d.class_logits.as_deref())?)
            }
            _ => None,
        };

        if let Some(probs) = &probabilities {
            for ((index, _), &p) in probs.indexed_iter() {
                if !p.is_finite() || !(0. ..=1.).contains(&p) {
                    return Err(FusionError::InvalidScore { what: "class probability", index, value: p as f64 });
                }
            }
        }
        if let Some(logits) = &logits {
            for ((index, _), &l) in logits.indexed_iter() {
                if !l.is_finite() {
                    return Err(FusionError::InvalidScore { what: "class logit", index, value: l as f64 });
                }
            }
        }

        let own_logits = logits.as_ref().map(|l| {
            classes.iter().enumerate().map(|(i, &c)| l[[i, c]]).collect::<Array1<f32>>()
        });

        log::debug!("Merged {} + {} detections (class vectors: {})", first.len(), second.len(), required.field_name());

        Ok(Self {
            boxes,
            scores,
            classes,
            probabilities,
            logits,
            own_logits,
            split: first.len(),
        })
    }

    /// Stacks one class vector per detection into an `N x K` matrix.
    fn stack_vectors<'a, F>(first: &ModalityBatch, second: &ModalityBatch, detections: &[&'a BvrDetection],
                            required: ClassVectors, method: FusionMethod, get: F) -> FusionResult<Array2<f32>>
    where
        F: Fn(&'a BvrDetection) -> Option<&'a [f32]>,
    {
        let field = required.field_name();
        let missing = |index: usize| FusionError::MissingField { field, index, method: method.str() };

        let mut vectors = Vec::with_capacity(detections.len());
        for (index, det) in detections.iter().enumerate() {
            vectors.push(get(*det).ok_or_else(|| missing(index))?);
        }

        // Each modality's width is taken from its first detection.
        let split = first.len();
        let width_a = vectors.first().filter(|_| split > 0).map(|v| v.len());
        let width_b = vectors.get(split).filter(|_| !second.is_empty()).map(|v| v.len());
        if let (Some(a), Some(b)) = (width_a, width_b) {
            if a != b {
                return Err(FusionError::ShapeMismatch { field, expected: a, found: b });
            }
        }
        let k = width_a.or(width_b).unwrap_or(0);

        let mut flat = Vec::with_capacity(detections.len() * k);
        for (index, (v, det)) in vectors.iter().zip(detections).enumerate() {
            if v.len() != k {
                return Err(FusionError::ShapeMismatch { field, expected: k, found: v.len() });
            }
            if det.class_id >= k {
                return Err(FusionError::ClassOutOfRange { class_id: det.class_id, index, num_classes: k });
            }
            flat.extend_from_slice(v);
        }

        Array2::from_shape_vec((detections.len(), k), flat)
            .map_err(|_| FusionError::ShapeMismatch { field, expected: k, found: 0 })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn num_classes(&self) -> Option<usize> {
        self.probabilities.as_ref().or(self.logits.as_ref()).map(|m| m.ncols())
    }

    pub fn bbox(&self, i: usize) -> BvrBox {
        let row = self.boxes.row(i);
        BvrBox::new(row[0], row[1], row[2], row[3])
    }

    pub fn all_boxes(&self) -> Vec<BvrBox> {
        (0..self.len()).map(|i| self.bbox(i)).collect()
    }

    pub fn logit_row(&self, i: usize) -> Option<ArrayView1<'_, f32>> {
        self.logits.as_ref().map(|l| l.row(i))
    }
}
