use std::thread;
use bvr_fusion::common::{FusionConfig, FusionMethod};
use bvr_fusion::data::{fusion_channels, ImagePair, ModalityBatch};
use bvr_fusion::fusion_runners::fusion_worker;

use fixtures::{batch, det, init_logger, street_scene};

#[test]
fn worker_fuses_pairs_until_sender_hangs_up() {
    init_logger();
    let (state, channels) = fusion_channels();
    let config = FusionConfig::new().with_method(FusionMethod::AvgScore);
    let handle = thread::spawn(move || fusion_worker(state, config));

    let (rgb, thermal) = street_scene();
    channels.pair_tx.send(Box::new(ImagePair::new(rgb, thermal))).unwrap();
    channels.pair_tx.send(Box::new(ImagePair::new(ModalityBatch::empty("blank"), ModalityBatch::empty("blank")))).unwrap();
    let broken = batch("broken", vec![det(0, [0., 0., 10., 10.], 1.5)]);
    channels.pair_tx.send(Box::new(ImagePair::new(broken.clone(), broken))).unwrap();
    drop(channels.pair_tx);

    let first = channels.fused_rx.recv().unwrap();
    assert_eq!(first.image_id, "FLIR_08865");
    assert_eq!(first.first_count, 3);
    assert_eq!(first.fused().unwrap().len(), 4);

    let second = channels.fused_rx.recv().unwrap();
    assert_eq!(second.image_id, "blank");
    assert!(second.fused().unwrap().is_empty());

    let third = channels.fused_rx.recv().unwrap();
    assert!(!third.is_ok());

    assert!(handle.join().unwrap().is_ok());
}

#[test]
fn worker_rejects_invalid_config() {
    let (state, _channels) = fusion_channels();
    let config = FusionConfig::new().with_iou(1.5);
    assert!(fusion_worker(state, config).is_err());
}

#[test]
fn worker_errors_when_output_is_dropped() {
    let (state, channels) = fusion_channels();
    drop(channels.fused_rx);
    channels.pair_tx.send(Box::new(ImagePair::new(ModalityBatch::empty("a"), ModalityBatch::empty("a")))).unwrap();
    drop(channels.pair_tx);
    assert!(fusion_worker(state, FusionConfig::new()).is_err());
}
