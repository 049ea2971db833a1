mod common;

use common::{decoder, gps_clock_frame, gps_code_bias_frame, gps_orbit_frame, WEEK};
use rtcm3::{Constellation, DecodeEvent, GpsTime, SignalCode, SsrKind, SV};

fn gps(prn: u8) -> SV {
    SV::new(Constellation::GPS, prn)
}

fn at(tow: f64) -> GpsTime {
    GpsTime::from_week_tow(WEEK, tow)
}

#[test]
fn test_orbit_corrections() {
    let mut decoder = decoder();
    let msg = decoder
        .decode(&gps_orbit_frame(100_010, &[(5, 5, 1_000), (7, 9, -2_000)]))
        .unwrap();
    assert_eq!(
        msg.event,
        DecodeEvent::Ssr {
            kind: SsrKind::Orbit,
            satellites: 2
        }
    );
    assert!(msg.time.diff(&at(100_010.0)).abs() < 1e-9);

    let ssr = decoder.context().ssr(gps(5)).unwrap();
    assert!(ssr.update);
    assert!(ssr.clock.is_none());
    let orbit = ssr.orbit.unwrap();
    assert_eq!(orbit.iode, 5);
    assert_eq!(orbit.epoch.update_interval, 5.0);
    assert_eq!(orbit.epoch.iod, 3);
    assert_eq!(orbit.epoch.provider_id, 77);
    assert_eq!(orbit.epoch.solution_id, 1);
    assert!(!orbit.regional_datum);
    for (got, expect) in orbit.delta.iter().zip([0.1, 0.1, -0.1]) {
        assert!((got - expect).abs() < 1e-9);
    }
    assert!((orbit.rate[0] - 1e-5).abs() < 1e-12);

    let other = decoder.context().ssr(gps(7)).unwrap().orbit.unwrap();
    assert_eq!(other.iode, 9);
    assert!((other.delta[0] + 0.2).abs() < 1e-9);
}

#[test]
fn test_clock_update_keeps_orbit_epoch() {
    let mut decoder = decoder();
    decoder
        .decode(&gps_orbit_frame(100_010, &[(5, 5, 1_000)]))
        .unwrap();
    let orbit = decoder.context().ssr(gps(5)).unwrap().orbit.unwrap();

    let msg = decoder
        .decode(&gps_clock_frame(100_015, &[(5, 1_234)]))
        .unwrap();
    assert_eq!(
        msg.event,
        DecodeEvent::Ssr {
            kind: SsrKind::Clock,
            satellites: 1
        }
    );

    let ssr = decoder.context().ssr(gps(5)).unwrap();
    assert_eq!(ssr.orbit, Some(orbit));
    assert!(ssr
        .orbit
        .unwrap()
        .epoch
        .time
        .diff(&at(100_010.0))
        .abs()
        < 1e-9);
    let clock = ssr.clock.unwrap();
    assert!(clock.epoch.time.diff(&at(100_015.0)).abs() < 1e-9);
    assert!((clock.coefficients[0] - 0.1234).abs() < 1e-9);
}

#[test]
fn test_update_flags() {
    let mut decoder = decoder();
    decoder
        .decode(&gps_orbit_frame(100_010, &[(5, 5, 0), (7, 9, 0)]))
        .unwrap();
    decoder.context_mut().clear_ssr_updates();
    assert!(decoder.context().ssr_corrections().all(|(_, c)| !c.update));

    decoder
        .decode(&gps_clock_frame(100_015, &[(7, 10)]))
        .unwrap();
    assert!(!decoder.context().ssr(gps(5)).unwrap().update);
    assert!(decoder.context().ssr(gps(7)).unwrap().update);
}

#[test]
fn test_code_biases() {
    let mut decoder = decoder();
    let biases: &[(u8, i64)] = &[(0, 150), (11, -20)];
    decoder
        .decode(&gps_code_bias_frame(100_010, &[(5, biases)]))
        .unwrap();

    let code_biases = decoder
        .context()
        .ssr(gps(5))
        .unwrap()
        .code_biases
        .as_ref()
        .unwrap();
    assert_eq!(code_biases.biases.len(), 2);
    let c1 = code_biases.biases[&SignalCode::new("1C").unwrap()];
    let w2 = code_biases.biases[&SignalCode::new("2W").unwrap()];
    assert!((c1 - 1.5).abs() < 1e-9);
    assert!((w2 + 0.2).abs() < 1e-9);
}

#[test]
fn test_satellite_out_of_range_is_skipped() {
    let mut decoder = decoder();
    let msg = decoder
        .decode(&gps_clock_frame(100_010, &[(0, 10), (3, 20)]))
        .unwrap();
    assert_eq!(
        msg.event,
        DecodeEvent::Ssr {
            kind: SsrKind::Clock,
            satellites: 1
        }
    );
    assert_eq!(decoder.context().ssr_corrections().count(), 1);
}

#[cfg(feature = "serde")]
#[test]
fn test_code_biases_serialize_with_signal_keys() {
    let mut decoder = decoder();
    let biases: &[(u8, i64)] = &[(0, 150)];
    decoder
        .decode(&gps_code_bias_frame(100_010, &[(5, biases)]))
        .unwrap();
    let ssr = decoder.context().ssr(gps(5)).unwrap();
    let json = serde_json::to_value(ssr).unwrap();
    assert!(json["code_biases"]["biases"]["1C"].is_number());
}
