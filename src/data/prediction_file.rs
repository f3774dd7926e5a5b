use std::path::Path;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use crate::common::{BvrBox, BvrDetection, FusedBatch, FusionError, FusionResult};
use crate::data::ModalityBatch;

/// Per-modality predictions for a whole image set, one column entry per image.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFile {
    pub image: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_id: Vec<u64>,
    pub boxes: Vec<Vec<[f32; 4]>>,
    pub scores: Vec<Vec<f32>>,
    pub classes: Vec<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_logits: Option<Vec<Vec<Vec<f32>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probs: Option<Vec<Vec<Vec<f32>>>>,
}

impl PredictionFile {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read predictions {}", path.display()))?;
        let file: PredictionFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse predictions {}", path.display()))?;
        file.validate().with_context(|| format!("Malformed predictions {}", path.display()))?;
        log::info!("Loaded {} images from {}", file.len(), path.display());
        Ok(file)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let raw = serde_json::to_string(self)?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write predictions {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    /// Checks that every column covers every image. Per-image row counts are checked in [`Self::batch`].
    pub fn validate(&self) -> anyhow::Result<()> {
        let n = self.len();
        let mut columns = vec![("boxes", self.boxes.len()), ("scores", self.scores.len()), ("classes", self.classes.len())];
        if !self.image_id.is_empty() {
            columns.push(("image_id", self.image_id.len()));
        }
        if let Some(l) = &self.class_logits {
            columns.push(("class_logits", l.len()));
        }
        if let Some(p) = &self.probs {
            columns.push(("probs", p.len()));
        }
        for (name, len) in columns {
            if len != n {
                anyhow::bail!("Column '{}' covers {} images, expected {}", name, len, n);
            }
        }
        Ok(())
    }

    /// Builds the detections of image `i`.
    pub fn batch(&self, i: usize) -> FusionResult<ModalityBatch> {
        let image_id = self.image.get(i).map(String::as_str).unwrap_or_default();
        let boxes = self.boxes.get(i).map(Vec::as_slice).unwrap_or_default();
        let n = boxes.len();

        let scores = Self::column(self.scores.get(i), "scores", n)?;
        let classes = Self::column(self.classes.get(i), "classes", n)?;
        let logits = match &self.class_logits {
            Some(l) => Some(Self::column(l.get(i), "class_logits", n)?),
            None => None,
        };
        let probs = match &self.probs {
            Some(p) => Some(Self::column(p.get(i), "probs", n)?),
            None => None,
        };

        let detections = (0..n)
            .map(|j| {
                let [x1, y1, x2, y2] = boxes[j];
                let mut det = BvrDetection::new(classes[j], BvrBox::new(x1, y1, x2, y2), scores[j]);
                if let Some(l) = logits {
                    det = det.with_logits(&l[j]);
                }
                if let Some(p) = probs {
                    det = det.with_probabilities(&p[j]);
                }
                det
            })
            .collect();

        Ok(ModalityBatch::new(image_id, detections))
    }

    fn column<'a, T>(values: Option<&'a Vec<T>>, field: &'static str, expected: usize) -> FusionResult<&'a [T]> {
        let values = values.map(Vec::as_slice).unwrap_or_default();
        if values.len() != expected {
            return Err(FusionError::ShapeMismatch { field, expected, found: values.len() });
        }
        Ok(values)
    }
}

/// Fused predictions for a whole image set, in the same column layout.
///
/// `image_id` is only written when the inputs carried numeric ids.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedOutputFile {
    pub image: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_id: Vec<u64>,
    pub boxes: Vec<Vec<[f32; 4]>>,
    pub scores: Vec<Vec<f32>>,
    pub classes: Vec<Vec<usize>>,
}

impl FusedOutputFile {
    pub fn push(&mut self, fused: &FusedBatch, image_id: Option<u64>) {
        let record = fused.to_record();
        self.image.push(fused.image_id.clone());
        if let Some(id) = image_id {
            self.image_id.push(id);
        }
        self.boxes.push(record.boxes);
        self.scores.push(record.scores);
        self.classes.push(record.classes);
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fused output {}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let raw = serde_json::to_string(self)?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write fused output {}", path.display()))
    }
}
