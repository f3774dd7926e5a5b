use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use bvr_fusion::common::{FusionConfig, FusionError, FusionMethod};
use bvr_fusion::data::{MergedBatch, ModalityBatch};
use bvr_fusion::fusion_runners::strategies::bayesian_fusion_multiclass;
use bvr_fusion::fusion_runners::{cluster_batch, LateFusion};

use fixtures::{batch, det, init_logger, street_scene};

fn config(method: FusionMethod) -> FusionConfig {
    FusionConfig::new().with_method(method)
}

fn all_methods() -> Vec<FusionMethod> {
    FusionMethod::all_fusion_methods()
        .iter()
        .filter_map(|name| FusionMethod::from_str(name))
        .collect()
}

#[test]
fn avg_score_two_overlapping_detections() {
    init_logger();
    let rgb = batch("img", vec![det(0, [0., 0., 10., 10.], 0.9)]);
    let thermal = batch("img", vec![det(0, [1., 1., 11., 11.], 0.6)]);

    let fused = bvr_fusion::fuse_image(&config(FusionMethod::AvgScore), &rgb, &thermal).unwrap();
    assert_eq!(fused.len(), 1);
    let d = fused.detections[0];
    assert_eq!(d.class_id, 0);
    assert!((d.confidence - 0.75).abs() < 1e-6);
    assert_eq!(d.bbox.to_array(), [0.5, 0.5, 10.5, 10.5]);
}

#[test]
fn bayesian_two_confident_detectors() {
    init_logger();
    let rgb = batch("img", vec![det(0, [0., 0., 10., 10.], 0.9).with_probabilities(&[0.9, 0.05, 0.05])]);
    let thermal = batch("img", vec![det(0, [1., 1., 11., 11.], 0.9).with_probabilities(&[0.9, 0.05, 0.05])]);

    let fused = bvr_fusion::fuse_image(&config(FusionMethod::Bayesian), &rgb, &thermal).unwrap();
    assert_eq!(fused.len(), 1);
    assert!((fused.detections[0].confidence - 0.9939).abs() < 1e-3);
    // equal scores: the anchor is the first modality's detection, the box is the match's
    assert_eq!(fused.detections[0].bbox.to_array(), [1., 1., 11., 11.]);
}

#[test]
fn fused_count_equals_cluster_count_for_every_strategy() {
    init_logger();
    let (rgb, thermal) = street_scene();
    for method in all_methods() {
        let fused = bvr_fusion::fuse_image(&config(method), &rgb, &thermal).unwrap();
        let merged = MergedBatch::prepare(&rgb, &thermal, method).unwrap();
        assert!(fused.len() <= merged.len(), "{method}");

        match method {
            FusionMethod::Pooling => assert_eq!(fused.len(), 6),
            _ => {
                let clusters = cluster_batch(&merged, 0.5, (640., 512.));
                assert_eq!(fused.len(), clusters.len(), "{method}");
                let classes: Vec<usize> = fused.detections.iter().map(|d| d.class_id).collect();
                assert_eq!(classes, vec![0, 1, 0, 2], "{method}");
            }
        }
        for d in &fused.detections {
            assert!(merged.classes.contains(&d.class_id));
        }
    }
}

#[test]
fn probability_scores_stay_in_unit_interval() {
    let (rgb, thermal) = street_scene();
    for method in [FusionMethod::AvgScore, FusionMethod::Bayesian, FusionMethod::BayesianAvgBox, FusionMethod::BayesianWeightedBox] {
        let fused = bvr_fusion::fuse_image(&config(method), &rgb, &thermal).unwrap();
        assert!(fused.detections.iter().all(|d| (0. ..=1.).contains(&d.confidence)), "{method}");
    }
}

#[test]
fn bayesian_is_invariant_to_member_order() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut rows: Vec<[f32; 4]> = vec![
        [0.70, 0.10, 0.15, 0.05],
        [0.55, 0.30, 0.05, 0.10],
        [0.80, 0.02, 0.08, 0.05],
        [0.65, 0.20, 0.10, 0.05],
    ];
    let reference = {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let probs = ndarray::Array2::from_shape_vec((rows.len(), 4), flat).unwrap();
        bayesian_fusion_multiclass(probs.view(), 0)
    };
    for _ in 0..10 {
        rows.shuffle(&mut rng);
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let probs = ndarray::Array2::from_shape_vec((rows.len(), 4), flat).unwrap();
        let fused = bayesian_fusion_multiclass(probs.view(), 0);
        assert!((fused - reference).abs() < 1e-12);
    }
}

#[test]
fn fused_output_is_invariant_to_modality_order_within_a_cluster() {
    let rgb = batch("img", vec![det(1, [0., 0., 50., 50.], 0.7).with_probabilities(&[0.2, 0.7, 0.1])]);
    let thermal = batch("img", vec![det(1, [2., 2., 52., 52.], 0.6).with_probabilities(&[0.1, 0.6, 0.3])]);
    let forward = bvr_fusion::fuse_image(&config(FusionMethod::Bayesian), &rgb, &thermal).unwrap();
    let backward = bvr_fusion::fuse_image(&config(FusionMethod::Bayesian), &thermal, &rgb).unwrap();
    assert!((forward.detections[0].confidence - backward.detections[0].confidence).abs() < 1e-6);
}

#[test]
fn single_detection_input() {
    let single = batch("img", vec![det(2, [5., 6., 50., 60.], 0.42).with_logits(&[0.3, -1.0, 2.2])]);
    let other = batch("img", vec![det(0, [400., 300., 450., 350.], 0.8).with_logits(&[1.0, 0.0, 0.0])]);

    for method in [FusionMethod::Nms, FusionMethod::AvgScore, FusionMethod::Pooling] {
        let fused = bvr_fusion::fuse_image(&config(method), &single, &other).unwrap();
        let lone = fused.detections.iter().find(|d| d.class_id == 2).unwrap();
        assert_eq!(lone.confidence, 0.42);
        assert_eq!(lone.bbox, single.detections[0].bbox);
    }

    let fused = bvr_fusion::fuse_image(&config(FusionMethod::AvgLogits), &single, &other).unwrap();
    let lone = fused.detections.iter().find(|d| d.class_id == 2).unwrap();
    assert_eq!(lone.confidence, 2.2);
}

#[test]
fn both_modalities_empty() {
    for method in all_methods() {
        let fused = bvr_fusion::fuse_image(&config(method), &ModalityBatch::empty("img"), &ModalityBatch::empty("img")).unwrap();
        assert!(fused.is_empty());
        assert_eq!(fused.image_id, "img");
    }
}

#[test]
fn one_modality_empty_passes_the_other_through() {
    let (rgb, _) = street_scene();
    let empty = ModalityBatch::empty("FLIR_08865");

    for method in [FusionMethod::Nms, FusionMethod::AvgScore, FusionMethod::Bayesian, FusionMethod::Pooling] {
        let fused = bvr_fusion::fuse_image(&config(method), &empty, &rgb).unwrap();
        assert_eq!(fused.len(), rgb.len());
        for (f, d) in fused.detections.iter().zip(&rgb.detections) {
            assert_eq!(f.bbox, d.bbox);
            assert_eq!(f.confidence, d.confidence);
            assert_eq!(f.class_id, d.class_id);
        }
    }

    let fused = bvr_fusion::fuse_image(&config(FusionMethod::SumLogits), &rgb, &empty).unwrap();
    let scores: Vec<f32> = fused.detections.iter().map(|d| d.confidence).collect();
    assert_eq!(scores, vec![3.1, 2.4, 1.3]);

    let fused = bvr_fusion::fuse_image(&config(FusionMethod::SumLogitsSoftmax), &rgb, &empty).unwrap();
    assert!(fused.detections.iter().all(|d| d.confidence > 0. && d.confidence < 1.));
}

#[test]
fn nms_keeps_anchor_scores_and_boxes() {
    let (rgb, thermal) = street_scene();
    let fused = bvr_fusion::fuse_image(&config(FusionMethod::Nms), &rgb, &thermal).unwrap();
    let scores: Vec<f32> = fused.detections.iter().map(|d| d.confidence).collect();
    assert_eq!(scores, vec![0.92, 0.81, 0.71, 0.55]);
    assert_eq!(fused.detections[0].bbox, rgb.detections[0].bbox);
}

#[test]
fn clustering_never_mixes_classes() {
    // identical boxes, different classes
    let rgb = batch("img", vec![det(0, [0., 0., 30., 30.], 0.9), det(1, [0., 0., 30., 30.], 0.8)]);
    let thermal = batch("img", vec![det(2, [0., 0., 30., 30.], 0.7)]);
    for method in [FusionMethod::AvgScore, FusionMethod::Nms] {
        let fused = bvr_fusion::fuse_image(&config(method), &rgb, &thermal).unwrap();
        assert_eq!(fused.len(), 3, "{method}");
    }
}

#[test]
fn malformed_inputs_fail_the_image() {
    let fusion = LateFusion::new(config(FusionMethod::Bayesian));

    let rgb = batch("img", vec![det(0, [0., 0., 10., 10.], 0.9).with_probabilities(&[0.9, 0.1])]);
    let thermal = batch("img", vec![det(0, [1., 1., 11., 11.], 0.8).with_probabilities(&[0.8, 0.1, 0.1])]);
    assert!(matches!(fusion.run(&rgb, &thermal), Err(FusionError::ShapeMismatch { .. })));

    let thermal = batch("img", vec![det(0, [1., 1., 11., 11.], 0.8)]);
    assert!(matches!(fusion.run(&rgb, &thermal), Err(FusionError::MissingField { index: 1, .. })));

    let thermal = batch("img", vec![det(0, [1., 1., 11., 11.], f32::INFINITY).with_probabilities(&[0.8, 0.2])]);
    assert!(matches!(fusion.run(&rgb, &thermal), Err(FusionError::InvalidScore { .. })));

    let thermal = batch("img", vec![det(0, [1., 1., 11., 11.], 0.8).with_probabilities(&[0.0, 1.0])]);
    assert!(matches!(fusion.run(&rgb, &thermal), Err(FusionError::InvalidScore { .. })));
}

#[test]
fn iou_threshold_is_configurable() {
    let rgb = batch("img", vec![det(0, [0., 0., 10., 10.], 0.9)]);
    let thermal = batch("img", vec![det(0, [1., 1., 11., 11.], 0.6)]);
    let strict = config(FusionMethod::AvgScore).with_iou(0.8);
    let fused = bvr_fusion::fuse_image(&strict, &rgb, &thermal).unwrap();
    assert_eq!(fused.len(), 2);
}

#[test]
fn invalid_config_fails_the_image() {
    let rgb = batch("img", vec![det(0, [0., 0., 10., 10.], 0.9)]);
    let thermal = batch("img", vec![det(1, [0., 0., 10., 10.], 0.6)]);

    let flat_tiles = config(FusionMethod::AvgScore).with_tile_size(0., 0.);
    let err = bvr_fusion::fuse_image(&flat_tiles, &rgb, &thermal).unwrap_err();
    assert!(matches!(err, FusionError::InvalidConfig(_)));

    let thermal = batch("img", vec![det(0, [0., 0., 10., 10.], 0.6)]);
    let nan_iou = config(FusionMethod::AvgScore).with_iou(f32::NAN);
    assert!(matches!(bvr_fusion::fuse_image(&nan_iou, &rgb, &thermal), Err(FusionError::InvalidConfig(_))));

    // empty inputs take the passthrough path but are still checked
    let empty = ModalityBatch::empty("img");
    assert!(bvr_fusion::fuse_image(&nan_iou, &empty, &empty).is_err());
}
