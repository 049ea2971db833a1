//! State space representation corrections: orbit, clock, code and phase
//! biases, user range accuracy and high-rate clock, per constellation.
//!
//! Every kind of correction keeps its own epoch, update interval and issue
//! of data: a message of one kind never touches the others.

use std::collections::BTreeMap;

use gnss_rs::prelude::Constellation;

use crate::{
    bits::BitReader,
    context::DecodeContext,
    error::DecodeError,
    messages::DecodeEvent,
    satellite::satellite,
    signal::{ssr_signal, SignalCode},
    time::{resolve_glonass_tod, resolve_tow, GpsTime},
};

/// Update interval (s) by the 4-bit SSR update interval index
const UPDATE_INTERVALS: [f64; 16] = [
    1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 240.0, 300.0, 600.0, 900.0, 1800.0, 3600.0,
    7200.0, 10800.0,
];

/// Kind of SSR message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SsrKind {
    Orbit,
    Clock,
    CodeBias,
    /// Combined orbit and clock
    OrbitClock,
    Ura,
    HighRateClock,
    PhaseBias,
}

/// Header fields shared by every correction of one message
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SsrEpoch {
    pub time: GpsTime,
    /// Update interval (s)
    pub update_interval: f64,
    /// IOD SSR
    pub iod: u8,
    pub provider_id: u16,
    pub solution_id: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrbitCorrection {
    pub epoch: SsrEpoch,
    /// Issue of data of the broadcast ephemeris the correction applies to
    pub iode: u16,
    /// BeiDou and SBAS: CRC of the broadcast ephemeris
    pub iodcrc: u32,
    /// Satellite reference datum: false ITRF, true regional
    pub regional_datum: bool,
    /// Radial, along-track, cross-track (m)
    pub delta: [f64; 3],
    /// Radial, along-track, cross-track rates (m/s)
    pub rate: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockCorrection {
    pub epoch: SsrEpoch,
    /// C0 (m), C1 (m/s), C2 (m/s²)
    pub coefficients: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HighRateClock {
    pub epoch: SsrEpoch,
    /// m
    pub correction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UraCorrection {
    pub epoch: SsrEpoch,
    /// Class (3 MSB) and value (3 LSB)
    pub index: u8,
}

impl UraCorrection {
    /// User range accuracy (m). `None` when undefined (index 0) or beyond
    /// the largest class (index 63).
    pub fn accuracy(&self) -> Option<f64> {
        if self.index == 0 || self.index >= 63 {
            return None;
        }
        let class = i32::from(self.index >> 3);
        let value = f64::from(self.index & 7);
        Some((3f64.powi(class) * (1.0 + value / 4.0) - 1.0) * 1e-3)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeBiases {
    pub epoch: SsrEpoch,
    /// Bias per signal (m)
    pub biases: BTreeMap<SignalCode, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseBias {
    /// Signal integer property
    pub integer: bool,
    /// Wide-lane integer indicator
    pub wide_lane: u8,
    pub discontinuity: u8,
    /// m
    pub bias: f64,
    /// m
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseBiases {
    pub epoch: SsrEpoch,
    /// Dispersive bias consistency indicator
    pub dispersive: bool,
    /// Melbourne-Wübbena consistency indicator
    pub melbourne_wubbena: bool,
    /// deg
    pub yaw: f64,
    /// deg/s
    pub yaw_rate: f64,
    pub biases: BTreeMap<SignalCode, PhaseBias>,
}

/// All SSR corrections known for one satellite
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SsrCorrection {
    pub orbit: Option<OrbitCorrection>,
    pub clock: Option<ClockCorrection>,
    pub high_rate_clock: Option<HighRateClock>,
    pub ura: Option<UraCorrection>,
    pub code_biases: Option<CodeBiases>,
    pub phase_biases: Option<PhaseBiases>,
    /// Set when anything changed since [DecodeContext::clear_ssr_updates]
    pub update: bool,
}

/// Constellation and kind of an SSR message type
pub fn ssr_message(message_type: u16) -> Option<(Constellation, SsrKind)> {
    const KINDS: [SsrKind; 6] = [
        SsrKind::Orbit,
        SsrKind::Clock,
        SsrKind::CodeBias,
        SsrKind::OrbitClock,
        SsrKind::Ura,
        SsrKind::HighRateClock,
    ];
    const PHASE_BIAS_ORDER: [Constellation; 6] = [
        Constellation::GPS,
        Constellation::Glonass,
        Constellation::Galileo,
        Constellation::QZSS,
        Constellation::SBAS,
        Constellation::BeiDou,
    ];
    let (constellation, first) = match message_type {
        1057..=1062 => (Constellation::GPS, 1057),
        1063..=1068 => (Constellation::Glonass, 1063),
        1240..=1245 => (Constellation::Galileo, 1240),
        1246..=1251 => (Constellation::QZSS, 1246),
        1252..=1257 => (Constellation::SBAS, 1252),
        1258..=1263 => (Constellation::BeiDou, 1258),
        1265..=1270 => {
            let idx = usize::from(message_type - 1265);
            return Some((PHASE_BIAS_ORDER[idx], SsrKind::PhaseBias));
        },
        _ => return None,
    };
    Some((constellation, KINDS[usize::from(message_type - first)]))
}

/// Field widths of the per-satellite part
struct SatLayout {
    prn: usize,
    iode: usize,
    iodcrc: usize,
    offset: u16,
}

fn sat_layout(constellation: Constellation) -> SatLayout {
    let (prn, iode, iodcrc, offset) = match constellation {
        Constellation::Glonass => (5, 8, 0, 0),
        Constellation::Galileo => (6, 10, 0, 0),
        Constellation::QZSS => (4, 8, 0, 192),
        Constellation::BeiDou => (6, 10, 24, 1),
        c if c.is_sbas() => (6, 9, 24, 120),
        _ => (6, 8, 0, 0),
    };
    SatLayout {
        prn,
        iode,
        iodcrc,
        offset,
    }
}

struct SsrHeader {
    epoch: SsrEpoch,
    regional_datum: bool,
    dispersive: bool,
    melbourne_wubbena: bool,
    count: usize,
}

fn read_header(
    reader: &mut BitReader,
    ctx: &DecodeContext,
    constellation: Constellation,
    kind: SsrKind,
) -> Result<SsrHeader, DecodeError> {
    let time = if constellation == Constellation::Glonass {
        let tod = reader.scaled_unsigned(17, 1.0)?;
        resolve_glonass_tod(ctx.time(), tod)
    } else {
        let mut tow = reader.scaled_unsigned(20, 1.0)?;
        if constellation == Constellation::BeiDou {
            // BDT to GPST
            tow += 14.0;
        }
        resolve_tow(ctx.time(), tow)
    };
    let interval = UPDATE_INTERVALS[usize::from(reader.u8(4)?)];
    reader.skip(1)?; // multiple message indicator
    let regional_datum = if matches!(kind, SsrKind::Orbit | SsrKind::OrbitClock) {
        reader.flag()?
    } else {
        false
    };
    let iod = reader.u8(4)?;
    let provider_id = reader.u16(16)?;
    let solution_id = reader.u8(4)?;
    let (dispersive, melbourne_wubbena) = if kind == SsrKind::PhaseBias {
        (reader.flag()?, reader.flag()?)
    } else {
        (false, false)
    };
    let count_bits = if constellation == Constellation::QZSS { 4 } else { 6 };
    let count = usize::from(reader.u8(count_bits)?);
    Ok(SsrHeader {
        epoch: SsrEpoch {
            time,
            update_interval: interval,
            iod,
            provider_id,
            solution_id,
        },
        regional_datum,
        dispersive,
        melbourne_wubbena,
        count,
    })
}

/// Correction of one satellite before it is applied to the context
enum Update {
    Orbit(OrbitCorrection),
    Clock(ClockCorrection),
    OrbitClock(OrbitCorrection, ClockCorrection),
    Ura(UraCorrection),
    HighRateClock(HighRateClock),
    CodeBiases(CodeBiases),
    PhaseBiases(PhaseBiases),
}

fn read_orbit(
    reader: &mut BitReader,
    layout: &SatLayout,
    header: &SsrHeader,
) -> Result<OrbitCorrection, DecodeError> {
    Ok(OrbitCorrection {
        epoch: header.epoch,
        iode: reader.u16(layout.iode)?,
        iodcrc: reader.u32(layout.iodcrc)?,
        regional_datum: header.regional_datum,
        delta: [
            reader.scaled(22, 1e-4)?,
            reader.scaled(20, 4e-4)?,
            reader.scaled(20, 4e-4)?,
        ],
        rate: [
            reader.scaled(21, 1e-6)?,
            reader.scaled(19, 4e-6)?,
            reader.scaled(19, 4e-6)?,
        ],
    })
}

fn read_clock(reader: &mut BitReader, header: &SsrHeader) -> Result<ClockCorrection, DecodeError> {
    Ok(ClockCorrection {
        epoch: header.epoch,
        coefficients: [
            reader.scaled(22, 1e-4)?,
            reader.scaled(21, 1e-6)?,
            reader.scaled(27, 2e-8)?,
        ],
    })
}

fn read_code_biases(
    reader: &mut BitReader,
    constellation: Constellation,
    header: &SsrHeader,
) -> Result<CodeBiases, DecodeError> {
    let count = reader.u8(5)?;
    let mut biases = BTreeMap::new();
    for _ in 0..count {
        let mode = reader.u8(5)?;
        let bias = reader.scaled(14, 0.01)?;
        match ssr_signal(constellation, mode) {
            Some(code) => {
                biases.insert(code, bias);
            },
            None => log::debug!("unknown {constellation:?} code bias signal {mode}"),
        }
    }
    Ok(CodeBiases {
        epoch: header.epoch,
        biases,
    })
}

fn read_phase_biases(
    reader: &mut BitReader,
    constellation: Constellation,
    header: &SsrHeader,
) -> Result<PhaseBiases, DecodeError> {
    let count = reader.u8(5)?;
    let yaw = reader.scaled_unsigned(9, 180.0 / 256.0)?;
    let yaw_rate = reader.scaled(8, 180.0 / 8192.0)?;
    let mut biases = BTreeMap::new();
    for _ in 0..count {
        let mode = reader.u8(5)?;
        let bias = PhaseBias {
            integer: reader.flag()?,
            wide_lane: reader.u8(2)?,
            discontinuity: reader.u8(4)?,
            bias: reader.scaled(20, 1e-4)?,
            std_dev: reader.scaled_unsigned(17, 1e-4)?,
        };
        match ssr_signal(constellation, mode) {
            Some(code) => {
                biases.insert(code, bias);
            },
            None => log::debug!("unknown {constellation:?} phase bias signal {mode}"),
        }
    }
    Ok(PhaseBiases {
        epoch: header.epoch,
        dispersive: header.dispersive,
        melbourne_wubbena: header.melbourne_wubbena,
        yaw,
        yaw_rate,
        biases,
    })
}

/// 1057–1068, 1240–1263 and 1265–1270
pub(crate) fn decode_ssr(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let (constellation, kind) =
        ssr_message(reader.message_type()).ok_or_else(|| reader.invalid("message type"))?;
    let layout = sat_layout(constellation);
    let header = read_header(reader, ctx, constellation, kind)?;

    let mut updates = Vec::with_capacity(header.count);
    for _ in 0..header.count {
        let id = reader.u16(layout.prn)?;
        let update = match kind {
            SsrKind::Orbit => Update::Orbit(read_orbit(reader, &layout, &header)?),
            SsrKind::Clock => Update::Clock(read_clock(reader, &header)?),
            SsrKind::OrbitClock => {
                let orbit = read_orbit(reader, &layout, &header)?;
                Update::OrbitClock(orbit, read_clock(reader, &header)?)
            },
            SsrKind::Ura => Update::Ura(UraCorrection {
                epoch: header.epoch,
                index: reader.u8(6)?,
            }),
            SsrKind::HighRateClock => Update::HighRateClock(HighRateClock {
                epoch: header.epoch,
                correction: reader.scaled(22, 1e-4)?,
            }),
            SsrKind::CodeBias => Update::CodeBiases(read_code_biases(reader, constellation, &header)?),
            SsrKind::PhaseBias => {
                Update::PhaseBiases(read_phase_biases(reader, constellation, &header)?)
            },
        };
        match satellite(constellation, id + layout.offset) {
            Some(sv) => updates.push((sv, update)),
            None => log::warn!(
                "rtcm3 {}: satellite number {} out of range",
                reader.message_type(),
                id
            ),
        }
    }

    ctx.set_time(header.epoch.time);
    let satellites = updates.len();
    for (sv, update) in updates {
        apply(ctx.ssr_entry(sv), update);
    }
    Ok(DecodeEvent::Ssr { kind, satellites })
}

fn apply(entry: &mut SsrCorrection, update: Update) {
    match update {
        Update::Orbit(orbit) => entry.orbit = Some(orbit),
        Update::Clock(clock) => entry.clock = Some(clock),
        Update::OrbitClock(orbit, clock) => {
            entry.orbit = Some(orbit);
            entry.clock = Some(clock);
        },
        Update::Ura(ura) => entry.ura = Some(ura),
        Update::HighRateClock(clock) => entry.high_rate_clock = Some(clock),
        Update::CodeBiases(biases) => entry.code_biases = Some(biases),
        Update::PhaseBiases(biases) => entry.phase_biases = Some(biases),
    }
    entry.update = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_families() {
        assert_eq!(
            ssr_message(1057),
            Some((Constellation::GPS, SsrKind::Orbit))
        );
        assert_eq!(
            ssr_message(1062),
            Some((Constellation::GPS, SsrKind::HighRateClock))
        );
        assert_eq!(
            ssr_message(1066),
            Some((Constellation::Glonass, SsrKind::OrbitClock))
        );
        assert_eq!(
            ssr_message(1242),
            Some((Constellation::Galileo, SsrKind::CodeBias))
        );
        assert_eq!(ssr_message(1250), Some((Constellation::QZSS, SsrKind::Ura)));
        assert_eq!(
            ssr_message(1259),
            Some((Constellation::BeiDou, SsrKind::Clock))
        );
        assert_eq!(
            ssr_message(1269),
            Some((Constellation::SBAS, SsrKind::PhaseBias))
        );
        assert_eq!(ssr_message(1264), None);
        assert_eq!(ssr_message(1069), None);
    }

    #[test]
    fn ura_classes() {
        let ura = |index| UraCorrection {
            epoch: SsrEpoch::default(),
            index,
        };
        assert_eq!(ura(0).accuracy(), None);
        assert_eq!(ura(63).accuracy(), None);
        // class 0 value 1: 1.25 - 1 mm
        assert!((ura(1).accuracy().unwrap() - 0.25e-3).abs() < 1e-12);
        // class 1 value 0: 3 - 1 mm
        assert!((ura(8).accuracy().unwrap() - 2e-3).abs() < 1e-12);
        // class 7 value 6: 3^7 * 2.5 - 1 = 5466.5 mm
        assert!((ura(62).accuracy().unwrap() - 5.4665).abs() < 1e-9);
    }

    #[test]
    fn sat_id_widths() {
        assert_eq!(sat_layout(Constellation::QZSS).prn, 4);
        assert_eq!(sat_layout(Constellation::Glonass).prn, 5);
        assert_eq!(sat_layout(Constellation::BeiDou).iodcrc, 24);
        assert_eq!(sat_layout(Constellation::SBAS).offset, 120);
    }
}
