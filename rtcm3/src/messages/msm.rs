//! Multiple Signal Messages, 1071–1137.
//!
//! Every constellation shares one layout: a header with satellite, signal
//! and cell masks, a block of per-satellite rough values and a block of
//! per-cell fine values. MSM1 to MSM3 are recognized but only their header
//! is read; MSM4 to MSM7 produce full observations.

use gnss_rs::prelude::{Constellation, SV};

use crate::{
    bits::BitReader,
    constants::{P2_10, P2_24, P2_29, P2_31, RANGE_MS, SPEED_OF_LIGHT},
    context::DecodeContext,
    error::DecodeError,
    messages::{
        observation::{snr_from_dbhz, LliFlags, SignalObservation},
        DecodeEvent,
    },
    satellite::satellite,
    signal::{assign_slots, carrier_frequency, msm_signal, SignalCode},
    time::{resolve_glonass_tod, resolve_tow, GpsTime},
};

/// Number of cells a message may carry
const MAX_CELLS: usize = 64;

/// Lock time indicator DF402 (MSM4, MSM5) to milliseconds
const LOCK_TIME_4BIT: [u32; 16] = [
    0, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536, 131072, 262144, 524288,
];

/// Lock time indicator DF407 (MSM6, MSM7) to milliseconds
pub(crate) fn extended_lock_time_ms(indicator: u16) -> u32 {
    let i = u32::from(indicator);
    match i {
        0..=63 => i,
        64..=703 => {
            let n = (i - 64) / 32 + 1;
            (1 << n) * (i - 32 * n)
        },
        704 => 67_108_864,
        _ => 0,
    }
}

/// Constellation of an MSM message type
pub fn msm_constellation(message_type: u16) -> Option<Constellation> {
    let c = match message_type {
        1071..=1077 => Constellation::GPS,
        1081..=1087 => Constellation::Glonass,
        1091..=1097 => Constellation::Galileo,
        1101..=1107 => Constellation::SBAS,
        1111..=1117 => Constellation::QZSS,
        1121..=1127 => Constellation::BeiDou,
        1131..=1137 => Constellation::IRNSS,
        _ => return None,
    };
    Some(c)
}

/// Satellite of MSM satellite mask position `id` (1-based)
fn msm_satellite(constellation: Constellation, id: u16) -> Option<SV> {
    match constellation {
        Constellation::SBAS => satellite(constellation, id + 119),
        Constellation::QZSS => satellite(constellation, id + 192),
        c => satellite(c, id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MsmLevel(u8);

impl MsmLevel {
    /// MSM5 and MSM7 carry extended satellite info and Doppler
    fn extended(self) -> bool {
        matches!(self.0, 5 | 7)
    }

    /// MSM6 and MSM7 carry high resolution cells
    fn high_resolution(self) -> bool {
        matches!(self.0, 6 | 7)
    }

    fn satellite_bits(self) -> usize {
        if self.extended() {
            36
        } else {
            18
        }
    }

    fn cell_bits(self) -> usize {
        let base = if self.high_resolution() { 65 } else { 48 };
        if self.extended() {
            base + 15
        } else {
            base
        }
    }
}

struct MsmHeader {
    station_id: u16,
    time: GpsTime,
    more_follow: bool,
    /// Satellite mask positions (1-based)
    satellites: Vec<u16>,
    /// Signal mask positions (1-based)
    signals: Vec<u8>,
    /// Cell mask, satellite major
    cells: Vec<bool>,
}

fn read_header(
    reader: &mut BitReader,
    ctx: &DecodeContext,
    constellation: Constellation,
) -> Result<MsmHeader, DecodeError> {
    let station_id = reader.u16(12)?;
    let time = match constellation {
        Constellation::Glonass => {
            reader.skip(3)?; // day of week
            let tod = reader.scaled_unsigned(27, 0.001)?;
            resolve_glonass_tod(ctx.time(), tod)
        },
        Constellation::BeiDou => {
            // BDT to GPST
            let tow = reader.scaled_unsigned(30, 0.001)? + 14.0;
            resolve_tow(ctx.time(), tow)
        },
        _ => resolve_tow(ctx.time(), reader.scaled_unsigned(30, 0.001)?),
    };
    let more_follow = reader.flag()?;
    // IOD station, clock steering and external clock indicators, smoothing
    // indicator and interval
    reader.skip(3 + 7 + 2 + 2 + 1 + 3)?;

    let satellite_mask = reader.unsigned(64)?;
    let signal_mask = reader.u32(32)?;
    let satellites: Vec<u16> = (1..=64u16)
        .filter(|id| satellite_mask & (1 << (64 - id)) != 0)
        .collect();
    let signals: Vec<u8> = (1..=32u8)
        .filter(|id| signal_mask & (1 << (32 - u32::from(*id))) != 0)
        .collect();

    let cell_count = satellites.len() * signals.len();
    if cell_count > MAX_CELLS {
        return Err(reader.invalid("cell mask"));
    }
    let mut cells = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        cells.push(reader.flag()?);
    }
    Ok(MsmHeader {
        station_id,
        time,
        more_follow,
        satellites,
        signals,
        cells,
    })
}

/// Rough values of one satellite
#[derive(Debug, Clone, Copy, Default)]
struct RoughSatellite {
    /// m, `None` when invalid
    range: Option<f64>,
    extended_info: u8,
    /// m/s
    rate: Option<f64>,
}

/// Fine values of one cell
#[derive(Debug, Clone, Copy, Default)]
struct FineCell {
    pseudorange: Option<f64>,
    phase_range: Option<f64>,
    lock_ms: u32,
    half_cycle: bool,
    cnr: f64,
    rate: Option<f64>,
}

fn read_satellites(
    reader: &mut BitReader,
    level: MsmLevel,
    count: usize,
) -> Result<Vec<RoughSatellite>, DecodeError> {
    let mut sats = vec![RoughSatellite::default(); count];
    for sat in sats.iter_mut() {
        let ms = reader.u8(8)?;
        if ms != 255 {
            sat.range = Some(f64::from(ms) * RANGE_MS);
        }
    }
    if level.extended() {
        for sat in sats.iter_mut() {
            sat.extended_info = reader.u8(4)?;
        }
    }
    for sat in sats.iter_mut() {
        let modulo = reader.scaled_unsigned(10, P2_10 * RANGE_MS)?;
        if let Some(range) = sat.range.as_mut() {
            *range += modulo;
        }
    }
    if level.extended() {
        for sat in sats.iter_mut() {
            let rate = reader.signed(14)?;
            if rate != -8192 {
                sat.rate = Some(rate as f64);
            }
        }
    }
    Ok(sats)
}

fn read_cells(
    reader: &mut BitReader,
    level: MsmLevel,
    count: usize,
) -> Result<Vec<FineCell>, DecodeError> {
    let mut cells = vec![FineCell::default(); count];
    let (pr_bits, pr_scale, cp_bits, cp_scale) = if level.high_resolution() {
        (20, P2_29, 24, P2_31)
    } else {
        (15, P2_24, 22, P2_29)
    };
    for cell in cells.iter_mut() {
        let raw = reader.signed(pr_bits)?;
        if raw != -(1 << (pr_bits - 1)) {
            cell.pseudorange = Some(raw as f64 * pr_scale * RANGE_MS);
        }
    }
    for cell in cells.iter_mut() {
        let raw = reader.signed(cp_bits)?;
        if raw != -(1 << (cp_bits - 1)) {
            cell.phase_range = Some(raw as f64 * cp_scale * RANGE_MS);
        }
    }
    for cell in cells.iter_mut() {
        cell.lock_ms = if level.high_resolution() {
            extended_lock_time_ms(reader.u16(10)?)
        } else {
            LOCK_TIME_4BIT[usize::from(reader.u8(4)?)]
        };
    }
    for cell in cells.iter_mut() {
        cell.half_cycle = reader.flag()?;
    }
    for cell in cells.iter_mut() {
        cell.cnr = if level.high_resolution() {
            reader.scaled_unsigned(10, 0.0625)?
        } else {
            reader.scaled_unsigned(6, 1.0)?
        };
    }
    if level.extended() {
        for cell in cells.iter_mut() {
            let raw = reader.signed(15)?;
            if raw != -16384 {
                cell.rate = Some(raw as f64 * 0.0001);
            }
        }
    }
    Ok(cells)
}

/// 1071–1137
pub(crate) fn decode_msm(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let message_type = reader.message_type();
    let constellation =
        msm_constellation(message_type).ok_or_else(|| reader.invalid("message type"))?;
    let level = MsmLevel((message_type % 10) as u8);
    let header = read_header(reader, ctx, constellation)?;
    ctx.check_station(header.station_id)?;

    if !(4..=7).contains(&level.0) {
        log::trace!("rtcm3 {message_type}: MSM{} observables not decoded", level.0);
        return Ok(DecodeEvent::Ignored);
    }

    let cell_count = header.cells.iter().filter(|c| **c).count();
    reader.ensure(header.satellites.len() * level.satellite_bits() + cell_count * level.cell_bits())?;
    let rough = read_satellites(reader, level, header.satellites.len())?;
    let fine = read_cells(reader, level, cell_count)?;

    let codes: Vec<Option<SignalCode>> = header
        .signals
        .iter()
        .map(|id| {
            let code = msm_signal(constellation, *id);
            if code.is_none() {
                log::debug!("rtcm3 {message_type}: unsupported signal id {id}");
            }
            code
        })
        .collect();
    let slots = assign_slots(constellation, &codes);
    ctx.set_msm_signals(constellation, codes.iter().flatten().copied().collect());

    let mut completed = ctx.begin_epoch(header.time);
    let nsig = header.signals.len();
    let mut cell_index = 0;

    for (i, (id, sat)) in header.satellites.iter().zip(&rough).enumerate() {
        let sv = msm_satellite(constellation, *id);
        if sv.is_none() {
            log::warn!("rtcm3 {message_type}: satellite number {id} out of range");
        }

        let channel = match sv {
            Some(sv) if constellation == Constellation::Glonass => {
                if level.extended() && sat.extended_info <= 13 {
                    let channel = sat.extended_info as i8 - 7;
                    ctx.set_glonass_channel(sv, channel);
                    Some(channel)
                } else {
                    ctx.glonass_channel(sv)
                }
            },
            _ => None,
        };

        let mut observations = Vec::with_capacity(nsig);
        for (j, code) in codes.iter().enumerate() {
            if !header.cells[i * nsig + j] {
                continue;
            }
            let cell = fine[cell_index];
            cell_index += 1;
            let (Some(sv), Some(slot), Some(code)) = (sv, slots[j], *code) else {
                continue;
            };
            let frequency = carrier_frequency(constellation, code, channel);
            let mut obs = observe(sat, &cell, code, frequency);
            if ctx.loss_of_lock(sv, slot, cell.lock_ms) {
                obs.lli |= LliFlags::SLIP;
            }
            observations.push((slot, obs));
        }

        let Some(sv) = sv else {
            continue;
        };
        match ctx.observation_mut(header.station_id, sv) {
            Some(record) => {
                for (slot, obs) in observations {
                    record.signals[slot] = obs;
                }
            },
            None => log::warn!("rtcm3 {message_type}: observation batch full"),
        }
    }

    ctx.end_epoch_message(header.more_follow, &mut completed);
    Ok(DecodeEvent::Observation { completed })
}

fn observe(
    sat: &RoughSatellite,
    cell: &FineCell,
    code: SignalCode,
    frequency: Option<f64>,
) -> SignalObservation {
    let mut obs = SignalObservation {
        code: Some(code),
        snr: snr_from_dbhz(cell.cnr),
        ..Default::default()
    };
    if cell.half_cycle {
        obs.lli |= LliFlags::HALF_CYCLE;
    }
    let Some(range) = sat.range else {
        return obs;
    };
    if let Some(pr) = cell.pseudorange {
        obs.pseudorange = range + pr;
    }
    if let Some(freq) = frequency {
        if let Some(cp) = cell.phase_range {
            obs.carrier_phase = (range + cp) * freq / SPEED_OF_LIGHT;
        }
        if let (Some(rate), Some(fine_rate)) = (sat.rate, cell.rate) {
            obs.doppler = (-(rate + fine_rate) * freq / SPEED_OF_LIGHT) as f32;
        }
    }
    obs
}
