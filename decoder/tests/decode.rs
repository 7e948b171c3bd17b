//! End-to-end decoding scenarios over raw block streams.

use radex_common::BARCELONA;
use radex_decoder::block::{partition, BlockReader};
use radex_decoder::{decode_stream, DecodeEvent, DecodeOptions, DecodePipeline};
use radex_formats::{prepare_csv, COLUMNS};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One minimal CAT048 block: data source identifier only.
fn cat048_block(sac: u8, sic: u8) -> Vec<u8> {
    vec![0x30, 0x00, 0x06, 0x80, sac, sic]
}

#[test]
fn test_empty_input() {
    let out = decode_stream(&[], &DecodeOptions::default()).unwrap();

    assert!(out.records.is_empty());
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_minimal_cat048_block() {
    let data = [
        0x30, 0x00, 0x10, 0xFD, 0x57, 0x02, 0xE0, 0x15, 0x2C, 0x81, 0x74, 0x01, 0x8F, 0xAA, 0x4C,
        0x9B,
    ];
    let out = decode_stream(&data, &DecodeOptions::default()).unwrap();

    assert_eq!(1, out.records.len());
    let rec = &out.records[0];
    assert_eq!(48, rec.cat);
    assert_eq!(Some(0xE0), rec.sac);
    assert_eq!(Some(0x15), rec.sic);
    // the payload runs out mid-record, which is reported
    assert!(out.diagnostics.iter().any(|d| d.error.kind() == "TRUNCATED"));
}

#[test]
fn test_two_records_in_one_block() {
    let data = [0x30, 0x00, 0x09, 0x80, 0xA0, 0x01, 0x80, 0xA0, 0x02];
    let out = decode_stream(&data, &DecodeOptions::default()).unwrap();

    assert_eq!(2, out.records.len());
    assert_eq!(Some(0x01), out.records[0].sic);
    assert_eq!(Some(0x02), out.records[1].sic);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_unsupported_category_skips_block_only() {
    let mut data = vec![0x3E, 0x00, 0x04, 0xFF];
    data.extend(cat048_block(0xA0, 0x01));

    let out = decode_stream(&data, &DecodeOptions::default()).unwrap();

    assert_eq!(1, out.records.len());
    assert_eq!(1, out.diagnostics.len());
    assert_eq!("UNSUPPORTED_CATEGORY", out.diagnostics[0].error.kind());
    assert_eq!(0, out.diagnostics[0].offset);
}

#[test]
fn test_strict_mode_aborts() {
    let mut data = vec![0x3E, 0x00, 0x04, 0xFF];
    data.extend(cat048_block(0xA0, 0x01));

    let options = DecodeOptions {
        strict: true,
        ..Default::default()
    };
    assert!(decode_stream(&data, &options).is_err());
}

#[test]
fn test_short_block_terminates_stream() {
    let mut data = cat048_block(0xA0, 0x01);
    data.extend([0x30, 0x00, 0x40, 0x00]); // declares 64 bytes, has 4

    let out = decode_stream(&data, &DecodeOptions::default()).unwrap();

    assert_eq!(1, out.records.len());
    assert_eq!(1, out.diagnostics.len());
    assert_eq!("SHORT_BLOCK", out.diagnostics[0].error.kind());
}

#[test]
fn test_cat021_end_to_end() {
    let data = [
        0x15, 0x00, 0x13, // CAT 21, LEN 19
        0x89, 0x10, // FSPEC: FRN 1, 5, 11
        0x00, 0xC8, // I021/010
        0x20, 0x00, 0x00, 0xC0, 0x00, 0x00, // I021/130: 45°N 90°W
        0x04, 0x20, 0xC4, 0x14, 0x61, 0xC8, // I021/170 "ABCDEFGH"
    ];
    let out = decode_stream(&data, &DecodeOptions::default()).unwrap();

    assert_eq!(1, out.records.len());
    let rec = &out.records[0];
    assert_eq!(21, rec.cat);
    assert_eq!(Some(200), rec.sic);
    assert!((rec.lat.unwrap() - 45.0).abs() < 1e-5);
    assert!((rec.lon.unwrap() + 90.0).abs() < 1e-5);
    assert_eq!(Some("ABCDEFGH".to_owned()), rec.ti);
}

#[test]
fn test_cat048_geographic_derivation() {
    // FRN 1 + FRN 4: rho 10 NM, theta 90°
    let data = [
        0x30, 0x00, 0x0A, 0x90, 0xA0, 0x01, 0x0A, 0x00, 0x40, 0x00,
    ];
    let options = DecodeOptions {
        radar_site: Some(BARCELONA),
        ..Default::default()
    };
    let out = decode_stream(&data, &options).unwrap();

    assert_eq!(1, out.records.len());
    let rec = &out.records[0];
    assert_eq!(Some(10.0), rec.rho);
    assert_eq!(Some(90.0), rec.theta);
    assert!(rec.lon.unwrap() > BARCELONA.lon);
    assert!((rec.lat.unwrap() - BARCELONA.lat).abs() < 0.05);
}

#[test]
fn test_payload_accounting() {
    let mut data = Vec::new();
    for sic in 0..5 {
        data.extend(cat048_block(0xA0, sic));
    }

    let declared: usize = BlockReader::new(&data)
        .map(|b| b.unwrap().payload.len())
        .sum();
    assert_eq!(data.len() - 5 * 3, declared);
}

#[test]
fn test_partitioned_decode_matches_sequential() {
    let mut data = Vec::new();
    for sic in 0..8 {
        data.extend(cat048_block(0xA0, sic));
    }

    let options = DecodeOptions::default();
    let sequential = decode_stream(&data, &options).unwrap();

    let mut partitioned = Vec::new();
    for part in partition(&data, 3).unwrap() {
        partitioned.extend(decode_stream(part, &options).unwrap().records);
    }

    assert_eq!(sequential.records, partitioned);
}

#[test]
fn test_cancellation_between_blocks() {
    let mut data = Vec::new();
    for sic in 0..4 {
        data.extend(cat048_block(0xA0, sic));
    }

    let flag = Arc::new(AtomicBool::new(true));
    let mut pipeline =
        DecodePipeline::new(&data, &DecodeOptions::default()).with_cancel(Arc::clone(&flag));

    // already cancelled: nothing comes out
    assert!(pipeline.next().is_none());

    flag.store(false, Ordering::Relaxed);
    assert!(pipeline.next().is_some());
}

#[test]
fn test_csv_export_of_decoded_records() {
    let data = cat048_block(0xA0, 0x01);
    let out = decode_stream(&data, &DecodeOptions::default()).unwrap();

    let csv = prepare_csv(&out.records, true).unwrap();
    let mut lines = csv.lines();

    let header = lines.next().unwrap();
    assert_eq!(COLUMNS.len(), header.split(',').count());
    let row = lines.next().unwrap();
    assert!(row.starts_with("48,160,1,"));
}

#[test]
fn test_event_stream_order() {
    let mut data = vec![0x3E, 0x00, 0x04, 0xFF];
    data.extend(cat048_block(0xA0, 0x01));

    let events: Vec<_> = DecodePipeline::new(&data, &DecodeOptions::default()).collect();
    assert_eq!(2, events.len());
    assert!(matches!(events[0], DecodeEvent::Diagnostic(_)));
    assert!(matches!(events[1], DecodeEvent::Record(_)));
}
