mod common;

use common::{decoder, Legacy1004, Msm7, TOW, WEEK};
use rtcm3::{
    Constellation, DecodeError, DecodeEvent, DecoderBuilder, GpsTime, LliFlags, ObservationBatch,
    SignalCode, SPEED_OF_LIGHT, SV,
};

const FREQ_L1: f64 = 1.57542e9;
const FREQ_L2: f64 = 1.22760e9;
const RANGE_MS: f64 = SPEED_OF_LIGHT * 0.001;

fn code(s: &str) -> SignalCode {
    SignalCode::new(s).unwrap()
}

fn epoch() -> GpsTime {
    GpsTime::from_week_tow(WEEK, TOW)
}

fn completed(event: DecodeEvent) -> Vec<ObservationBatch> {
    match event {
        DecodeEvent::Observation { completed } => completed,
        other => panic!("not an observation event: {other:?}"),
    }
}

#[test]
fn test_legacy_gps_l1_l2() {
    let mut decoder = decoder();
    let msg = decoder.decode(&Legacy1004::new(12).to_frame()).unwrap();
    assert_eq!(msg.message_type, 1004);
    assert_eq!(msg.station_id, Some(2003));

    let batches = completed(msg.event);
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert!(batch.time().diff(&epoch()).abs() < 1e-6);

    let record = batch.get(&SV::new(Constellation::GPS, 12)).unwrap();
    assert_eq!(record.station_id, 2003);

    let pr1 = 1_000_000.0 * 0.02 + 70.0 * RANGE_MS;
    let l1 = record.signal(code("1C")).unwrap();
    assert!((l1.pseudorange - pr1).abs() < 1e-6);
    let lambda1 = SPEED_OF_LIGHT / FREQ_L1;
    assert!((l1.carrier_phase - (pr1 + 0.5) / lambda1).abs() < 1e-4);
    assert_eq!(l1.snr, 45_000);
    assert!(l1.lli.is_empty());

    let l2 = record.signal(code("2X")).unwrap();
    assert!((l2.pseudorange - (pr1 + 3.0)).abs() < 1e-6);
    let lambda2 = SPEED_OF_LIGHT / FREQ_L2;
    assert!((l2.carrier_phase - (pr1 + 3.5) / lambda2).abs() < 1e-4);
}

#[test]
fn test_legacy_lock_loss_sets_slip() {
    let mut decoder = decoder();
    let mut msg = Legacy1004::new(12);
    msg.lock = 40;
    decoder.decode(&msg.to_frame()).unwrap();

    msg.tow_ms += 1000;
    msg.lock = 2;
    let batches = completed(decoder.decode(&msg.to_frame()).unwrap().event);
    let record = batches[0].get(&SV::new(Constellation::GPS, 12)).unwrap();
    assert!(record.signals[0].lli.contains(LliFlags::SLIP));
    assert!(record.signals[1].lli.contains(LliFlags::SLIP));
}

#[test]
fn test_msm7_gps_observables() {
    let mut decoder = decoder();
    let mut msg = Msm7::new(1077, &[1, 3], &[2, 16]);
    msg.rough_rate = -500;
    msg.cell.rate = 1_000;
    let event = decoder.decode(&msg.to_frame()).unwrap().event;
    let batches = completed(event);
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.len(), 2);

    let record = batch.get(&SV::new(Constellation::GPS, 3)).unwrap();
    let l1 = record.signal(code("1C")).unwrap();
    let range = 70.0 * RANGE_MS;
    assert!((l1.pseudorange - range).abs() < 1e-6);
    assert!((l1.carrier_phase - range * FREQ_L1 / SPEED_OF_LIGHT).abs() < 1e-3);
    let doppler = -(-500.0 + 0.1) * FREQ_L1 / SPEED_OF_LIGHT;
    assert!((f64::from(l1.doppler) - doppler).abs() < 1e-2);
    assert_eq!(l1.snr, 45_000);
    assert!(l1.lli.is_empty());
    assert!(record.signal(code("2L")).is_some());

    assert_eq!(
        decoder.context().msm_signals(Constellation::GPS),
        &[code("1C"), code("2L")]
    );
}

#[test]
fn test_multi_message_epoch_is_one_batch() {
    let mut decoder = decoder();
    let mut gps = Msm7::new(1077, &[1, 3], &[2, 16]);
    gps.more_follow = true;
    let galileo = Msm7::new(1097, &[1, 2], &[2]);

    let first = completed(decoder.decode(&gps.to_frame()).unwrap().event);
    assert!(first.is_empty());
    assert_eq!(decoder.context().observations().len(), 2);

    let batches = completed(decoder.decode(&galileo.to_frame()).unwrap().event);
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.len(), 4);
    for sv in [
        SV::new(Constellation::GPS, 1),
        SV::new(Constellation::GPS, 3),
        SV::new(Constellation::Galileo, 1),
        SV::new(Constellation::Galileo, 2),
    ] {
        assert!(batch.get(&sv).is_some(), "{sv} missing");
    }
    assert_eq!(decoder.context().last_batch(), Some(batch));
    assert!(decoder.context().observations().is_empty());
}

#[test]
fn test_epoch_change_finalizes_previous_batch() {
    let mut decoder = decoder();
    let mut first = Msm7::new(1077, &[1], &[2]);
    first.more_follow = true;
    let mut second = first.clone();
    second.epoch_ms += 1000;

    assert!(completed(decoder.decode(&first.to_frame()).unwrap().event).is_empty());
    let batches = completed(decoder.decode(&second.to_frame()).unwrap().event);
    assert_eq!(batches.len(), 1);
    assert!(batches[0].time().diff(&epoch()).abs() < 1e-6);
    assert_eq!(decoder.context().observations().len(), 1);
    assert!(
        (decoder.context().observations().time().diff(&epoch()) - 1.0).abs() < 1e-6
    );
}

#[test]
fn test_msm7_glonass_channel_from_extended_info() {
    let mut decoder = decoder();
    let mut msg = Msm7::new(1087, &[5], &[2]);
    // Moscow time of day of GPS week 2300, 100010 s, 18 leap seconds
    msg.epoch_ms = 24_392_000;
    msg.extended_info = 10;

    let batches = completed(decoder.decode(&msg.to_frame()).unwrap().event);
    let batch = &batches[0];
    assert!(batch.time().diff(&epoch()).abs() < 1e-6);

    let sv = SV::new(Constellation::Glonass, 5);
    assert_eq!(decoder.context().glonass_channel(sv), Some(3));
    let l1 = batch.get(&sv).unwrap().signal(code("1C")).unwrap();
    let freq = 1.602e9 + 3.0 * 0.5625e6;
    assert!((l1.carrier_phase - 70.0 * RANGE_MS * freq / SPEED_OF_LIGHT).abs() < 1e-3);
}

#[test]
fn test_msm1_header_only() {
    let mut decoder = decoder();
    // MSM1 header only: station, time, flags, masks and a single cell
    let mut w = common::BitWriter::new();
    w.unsigned(12, 1071)
        .unsigned(12, 2003)
        .unsigned(30, (TOW * 1000.0) as u64)
        .flag(false)
        .unsigned(18, 0)
        .unsigned(64, 1 << 63)
        .unsigned(32, 1 << 30)
        .flag(true)
        .unsigned(10, 0)
        .unsigned(10, 0);
    let msg = decoder.decode(&w.into_frame()).unwrap();
    assert_eq!(msg.event, DecodeEvent::Ignored);
    assert!(decoder.context().observations().is_empty());
}

#[test]
fn test_station_change_inside_epoch() {
    let mut decoder = decoder();
    let mut first = Msm7::new(1077, &[1], &[2]);
    first.more_follow = true;
    let mut other = Msm7::new(1097, &[1], &[2]);
    other.station_id = 7;

    decoder.decode(&first.to_frame()).unwrap();
    assert_eq!(decoder.context().observations().len(), 1);
    assert_eq!(
        decoder.decode(&other.to_frame()),
        Err(DecodeError::StationMismatch {
            expect: 2003,
            got: 7
        })
    );
    // records of the previous station are dropped
    assert!(decoder.context().observations().is_empty());

    // the next message starts a batch of its own
    let msg = decoder.decode(&other.to_frame()).unwrap();
    assert_eq!(msg.station_id, Some(7));
    let batches = completed(msg.event);
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.len(), 1);
    assert!(batch.get(&SV::new(Constellation::GPS, 1)).is_none());
    let record = batch.get(&SV::new(Constellation::Galileo, 1)).unwrap();
    assert_eq!(record.station_id, 7);
    assert!(batch.iter().all(|r| r.station_id == 7));
}

#[test]
fn test_observation_capacity() {
    let mut decoder = DecoderBuilder::new()
        .reference_time(common::reference_time())
        .max_observations(2)
        .build();
    let msg = Msm7::new(1077, &[1, 2, 3, 4], &[2]);
    let batches = completed(decoder.decode(&msg.to_frame()).unwrap().event);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[0].capacity(), 2);
}

#[test]
fn test_msm1_from_filtered_station() {
    let mut decoder = DecoderBuilder::new()
        .reference_time(common::reference_time())
        .station_id(1)
        .build();
    let mut w = common::BitWriter::new();
    w.unsigned(12, 1071)
        .unsigned(12, 2003)
        .unsigned(30, (TOW * 1000.0) as u64)
        .flag(false)
        .unsigned(18, 0)
        .unsigned(64, 1 << 63)
        .unsigned(32, 1 << 30)
        .flag(true)
        .unsigned(10, 0)
        .unsigned(10, 0);
    assert_eq!(
        decoder.decode(&w.into_frame()),
        Err(DecodeError::StationMismatch {
            expect: 1,
            got: 2003
        })
    );
}
