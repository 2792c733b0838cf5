//! # Detector Decoder Benchmarks
//!
//! Throughput of the streaming decoder and the classifier on realistic
//! detector traffic: mostly vehicle records with a heartbeat every few
//! frames.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lg_01_detector_protocol::{
    encode_vehicle_record, DetectorFrame, FrameDecoder, FrameEncoder, VehicleDetection,
};
use lg_02_vehicle_classifier::{LaneMap, PlateRules, VehicleClassifier};

const HEARTBEAT: [u8; 5] = [0x00, 10, 0, 0, 1];

fn traffic(frames: usize) -> Vec<u8> {
    let encoder = FrameEncoder::new();
    let mut bytes = Vec::new();
    for i in 0..frames {
        let data = if i % 8 == 0 {
            HEARTBEAT.to_vec()
        } else {
            // 0x7D in the queue length forces escaping
            encode_vehicle_record((i % 4 + 1) as u8, &format!("LG{i:05}"), 1, 0x7D, 40)
        };
        bytes.extend(encoder.encode(&data).expect("frame fits"));
    }
    bytes
}

fn bench_decoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("lg-01-decoder");

    for frames in [16, 256, 4096] {
        let bytes = traffic(frames);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("feed_slice", frames), &bytes, |b, bytes| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                black_box(decoder.feed_slice(black_box(bytes)))
            })
        });

        // Socket-sized chunks
        group.bench_with_input(BenchmarkId::new("chunked_64", frames), &bytes, |b, bytes| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                let mut decoded = 0;
                for chunk in bytes.chunks(64) {
                    decoded += decoder.feed_slice(chunk).len();
                }
                black_box(decoded)
            })
        });
    }

    group.finish();
}

fn bench_parse_and_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("lg-02-classifier");
    let classifier = VehicleClassifier::with_rules(LaneMap::sequential(2), PlateRules::default());
    let data = encode_vehicle_record(3, "LG12345", 2, 0, 35);

    group.bench_function("parse_vehicle_record", |b| {
        b.iter(|| black_box(DetectorFrame::parse(black_box(&data), Utc::now())))
    });

    let detection = match DetectorFrame::parse(&data, Utc::now()) {
        Ok(DetectorFrame::VehicleDetection(detection)) => detection,
        other => panic!("unexpected frame {other:?}"),
    };
    group.bench_function("classify", |b| {
        b.iter(|| black_box(classifier.classify(black_box(&detection))))
    });

    let placeholder = VehicleDetection {
        plate: "UNKNOWN".into(),
        ..detection.clone()
    };
    group.bench_function("classify_drop", |b| {
        b.iter(|| black_box(classifier.classify(black_box(&placeholder))))
    });

    group.finish();
}

criterion_group!(benches, bench_decoder, bench_parse_and_classify);
criterion_main!(benches);
