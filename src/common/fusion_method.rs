use serde::{Deserialize, Serialize};

/// Late-fusion policy applied to each cluster of overlapping detections.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FusionMethod {
    /// Keep the anchor only.
    #[default]
    #[serde(rename = "nms")]
    Nms,
    /// Emit both modalities' detections untouched.
    #[serde(rename = "pooling")]
    Pooling,
    #[serde(rename = "avg_score")]
    AvgScore,
    #[serde(rename = "baysian")]
    Bayesian,
    #[serde(rename = "baysian_avg_bbox")]
    BayesianAvgBox,
    #[serde(rename = "baysian_wt_score_box")]
    BayesianWeightedBox,
    #[serde(rename = "avgLogits")]
    AvgLogits,
    #[serde(rename = "avgLogits_softmax")]
    AvgLogitsSoftmax,
    #[serde(rename = "sumLogits")]
    SumLogits,
    #[serde(rename = "sumLogits_softmax")]
    SumLogitsSoftmax,
}

/// Per-class vector a fusion method reads from every detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassVectors {
    None,
    Probabilities,
    Logits,
}

impl ClassVectors {
    pub fn field_name(&self) -> &'static str {
        match self {
            ClassVectors::None => "none",
            ClassVectors::Probabilities => "class_probabilities",
            ClassVectors::Logits => "class_logits",
        }
    }
}

// Names as written in fusion configs and prediction tooling.
static NAMES: [(FusionMethod, &str); 10] = [
    (FusionMethod::Nms, "nms"),
    (FusionMethod::Pooling, "pooling"),
    (FusionMethod::AvgScore, "avg_score"),
    (FusionMethod::Bayesian, "baysian"),
    (FusionMethod::BayesianAvgBox, "baysian_avg_bbox"),
    (FusionMethod::BayesianWeightedBox, "baysian_wt_score_box"),
    (FusionMethod::AvgLogits, "avgLogits"),
    (FusionMethod::AvgLogitsSoftmax, "avgLogits_softmax"),
    (FusionMethod::SumLogits, "sumLogits"),
    (FusionMethod::SumLogitsSoftmax, "sumLogits_softmax"),
];

impl FusionMethod {
    pub fn from_str(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .or_else(|| NAMES.iter().find(|(_, n)| n.to_lowercase() == name.to_lowercase()))
            .map(|(m, _)| *m)
    }

    pub fn str(&self) -> &'static str {
        NAMES
            .iter()
            .find(|(m, _)| m == self)
            .map(|(_, n)| *n)
            .unwrap_or("nms")
    }

    pub fn all_fusion_methods() -> Vec<String> {
        NAMES.iter().map(|(_, n)| n.to_string()).collect()
    }

    pub fn is_valid_fusion_method(name: &str) -> bool {
        FusionMethod::from_str(name).is_some()
    }

    pub fn required_vectors(&self) -> ClassVectors {
        match self {
            FusionMethod::Nms | FusionMethod::Pooling | FusionMethod::AvgScore => ClassVectors::None,
            FusionMethod::Bayesian | FusionMethod::BayesianAvgBox | FusionMethod::BayesianWeightedBox => {
                ClassVectors::Probabilities
            }
            FusionMethod::AvgLogits
            | FusionMethod::AvgLogitsSoftmax
            | FusionMethod::SumLogits
            | FusionMethod::SumLogitsSoftmax => ClassVectors::Logits,
        }
    }

    pub fn is_logit_based(&self) -> bool {
        self.required_vectors() == ClassVectors::Logits
    }

    pub fn is_softmax(&self) -> bool {
        matches!(self, FusionMethod::AvgLogitsSoftmax | FusionMethod::SumLogitsSoftmax)
    }
}

impl std::fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.str())
    }
}
