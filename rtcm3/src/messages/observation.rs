//! Observation records and the legacy RTK observation messages
//! 1001–1004 (GPS) and 1009–1012 (GLONASS).

use bitflags::bitflags;
use gnss_rs::prelude::{Constellation, SV};

use crate::{
    bits::BitReader,
    constants::{PRUNIT_GLO, PRUNIT_GPS},
    context::DecodeContext,
    error::DecodeError,
    messages::DecodeEvent,
    satellite::{gps_or_sbas, satellite},
    signal::{wavelength, SignalCode, SIGNAL_SLOTS},
    time::{resolve_glonass_tod, resolve_tow, GpsTime},
};

/// Unit of [SignalObservation::snr] (dB-Hz)
pub const SNR_UNIT: f64 = 0.001;

bitflags! {
    /// Loss of lock indicator
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LliFlags: u8 {
        /// Lock lost or freshly acquired since the previous observation
        const SLIP = 0x01;
        /// Half-cycle ambiguity not resolved
        const HALF_CYCLE = 0x02;
    }
}

/// One signal slot of an [ObservationRecord]. Empty slots keep the default
/// value: no code and zero measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalObservation {
    pub code: Option<SignalCode>,
    /// Carrier to noise density, in [SNR_UNIT]
    pub snr: u16,
    pub lli: LliFlags,
    /// Carrier phase (cycles)
    pub carrier_phase: f64,
    /// Pseudorange (m)
    pub pseudorange: f64,
    /// Doppler (Hz)
    pub doppler: f32,
}

impl SignalObservation {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
    }

    /// Carrier to noise density (dB-Hz)
    pub fn snr_dbhz(&self) -> f64 {
        f64::from(self.snr) * SNR_UNIT
    }
}

/// Observations of one satellite at one epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservationRecord {
    pub time: GpsTime,
    pub station_id: u16,
    pub satellite: SV,
    pub signals: [SignalObservation; SIGNAL_SLOTS],
}

impl ObservationRecord {
    pub fn new(time: GpsTime, station_id: u16, satellite: SV) -> Self {
        Self {
            time,
            station_id,
            satellite,
            signals: [SignalObservation::default(); SIGNAL_SLOTS],
        }
    }

    /// The slot holding `code`, if any
    pub fn signal(&self, code: SignalCode) -> Option<&SignalObservation> {
        self.signals.iter().find(|s| s.code == Some(code))
    }
}

/// All satellite records sharing one epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservationBatch {
    time: GpsTime,
    capacity: usize,
    records: Vec<ObservationRecord>,
}

impl ObservationBatch {
    pub fn new(capacity: usize) -> Self {
        Self {
            time: GpsTime::default(),
            capacity,
            records: Vec::new(),
        }
    }

    pub fn time(&self) -> GpsTime {
        self.time
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of satellite records
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObservationRecord> {
        self.records.iter()
    }

    pub fn get(&self, satellite: &SV) -> Option<&ObservationRecord> {
        self.records.iter().find(|r| r.satellite == *satellite)
    }

    pub(crate) fn reset(&mut self, time: GpsTime) {
        self.time = time;
        self.records.clear();
    }

    /// Record of `satellite`, created on first use. `None` once the batch
    /// is full.
    pub(crate) fn record_mut(
        &mut self,
        station_id: u16,
        satellite: SV,
    ) -> Option<&mut ObservationRecord> {
        if let Some(idx) = self.records.iter().position(|r| r.satellite == satellite) {
            return Some(&mut self.records[idx]);
        }
        if self.records.len() >= self.capacity {
            return None;
        }
        self.records
            .push(ObservationRecord::new(self.time, station_id, satellite));
        self.records.last_mut()
    }
}

impl<'a> IntoIterator for &'a ObservationBatch {
    type Item = &'a ObservationRecord;
    type IntoIter = core::slice::Iter<'a, ObservationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// dB-Hz to [SNR_UNIT], zero when out of the meaningful range
pub(crate) fn snr_from_dbhz(dbhz: f64) -> u16 {
    if dbhz <= 0.0 || dbhz >= 100.0 {
        return 0;
    }
    (dbhz / SNR_UNIT + 0.5).min(f64::from(u16::MAX)) as u16
}

/// Lock time indicator of the legacy messages (DF013/DF019) to milliseconds
pub(crate) fn legacy_lock_time_ms(indicator: u8) -> u32 {
    let i = u32::from(indicator);
    let seconds = match i {
        0..=23 => i,
        24..=47 => 2 * i - 24,
        48..=71 => 4 * i - 120,
        72..=95 => 8 * i - 408,
        96..=119 => 16 * i - 1176,
        120..=126 => 32 * i - 3096,
        _ => 937,
    };
    seconds * 1000
}

const PHASE_RANGE_INVALID: i64 = -0x80000; // 0xFFF80000 as 20 bits
const L2_RANGE_DIFF_INVALID: i64 = -0x2000; // 0xFFFFE000 as 14 bits
const GPS_L2_CODES: [&str; 4] = ["2X", "2P", "2D", "2W"];

struct LegacyLayout {
    glonass: bool,
    dual_frequency: bool,
    extended: bool,
}

impl LegacyLayout {
    fn of(message_type: u16) -> Self {
        Self {
            glonass: (1009..=1012).contains(&message_type),
            dual_frequency: matches!(message_type, 1003 | 1004 | 1011 | 1012),
            extended: matches!(message_type, 1002 | 1004 | 1010 | 1012),
        }
    }

    fn satellite_bits(&self) -> usize {
        let mut bits = if self.glonass { 64 } else { 58 };
        if self.extended {
            bits += if self.glonass { 15 } else { 16 };
        }
        if self.dual_frequency {
            bits += 43;
            if self.extended {
                bits += 8;
            }
        }
        bits
    }
}

struct LegacySatellite {
    id: u16,
    p_code: bool,
    channel: Option<i8>,
    pseudorange: u64,
    phase_range: i64,
    lock: u8,
    ambiguity: u64,
    cnr: u8,
    l2: Option<LegacyL2>,
}

struct LegacyL2 {
    code: u8,
    range_diff: i64,
    phase_range: i64,
    lock: u8,
    cnr: u8,
}

fn read_satellite(reader: &mut BitReader, layout: &LegacyLayout) -> Result<LegacySatellite, DecodeError> {
    let id = reader.u16(6)?;
    let p_code = reader.flag()?;
    let channel = if layout.glonass {
        let raw = reader.u8(5)?;
        (raw <= 20).then(|| raw as i8 - 7)
    } else {
        None
    };
    let pseudorange = reader.unsigned(if layout.glonass { 25 } else { 24 })?;
    let phase_range = reader.signed(20)?;
    let lock = reader.u8(7)?;
    let (ambiguity, cnr) = if layout.extended {
        (reader.unsigned(if layout.glonass { 7 } else { 8 })?, reader.u8(8)?)
    } else {
        (0, 0)
    };
    let l2 = if layout.dual_frequency {
        Some(LegacyL2 {
            code: reader.u8(2)?,
            range_diff: reader.signed(14)?,
            phase_range: reader.signed(20)?,
            lock: reader.u8(7)?,
            cnr: if layout.extended { reader.u8(8)? } else { 0 },
        })
    } else {
        None
    };
    Ok(LegacySatellite {
        id,
        p_code,
        channel,
        pseudorange,
        phase_range,
        lock,
        ambiguity,
        cnr,
        l2,
    })
}

/// 1001–1004 and 1009–1012
pub(crate) fn decode_legacy(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let layout = LegacyLayout::of(reader.message_type());
    let constellation = if layout.glonass {
        Constellation::Glonass
    } else {
        Constellation::GPS
    };

    let station_id = reader.u16(12)?;
    let time = if layout.glonass {
        let tod = reader.scaled_unsigned(27, 0.001)?;
        if tod > 86_400.999 {
            return Err(reader.invalid("epoch time"));
        }
        resolve_glonass_tod(ctx.time(), tod)
    } else {
        let tow = reader.scaled_unsigned(30, 0.001)?;
        if tow >= 604_800.0 {
            return Err(reader.invalid("epoch time"));
        }
        resolve_tow(ctx.time(), tow)
    };
    let more_follow = reader.flag()?;
    let count = usize::from(reader.u8(5)?);
    reader.skip(4)?; // smoothing indicator and interval
    reader.ensure(count * layout.satellite_bits())?;

    ctx.check_station(station_id)?;
    let mut completed = ctx.begin_epoch(time);

    for _ in 0..count {
        let sat = read_satellite(reader, &layout)?;
        let sv = if layout.glonass {
            satellite(Constellation::Glonass, sat.id)
        } else {
            gps_or_sbas(sat.id)
        };
        let Some(sv) = sv else {
            log::warn!(
                "rtcm3 {}: satellite number {} out of range",
                reader.message_type(),
                sat.id
            );
            continue;
        };
        if let Some(channel) = sat.channel {
            ctx.set_glonass_channel(sv, channel);
        }
        let channel = sat.channel;
        let constellation = if layout.glonass {
            constellation
        } else {
            sv.constellation
        };

        let unit = if layout.glonass { PRUNIT_GLO } else { PRUNIT_GPS };
        let pr1 = sat.pseudorange as f64 * 0.02 + sat.ambiguity as f64 * unit;
        let l1_code = SignalCode::new(if sat.p_code { "1P" } else { "1C" });

        let mut signals = [SignalObservation::default(); 2];
        signals[0] = observe(
            ctx,
            sv,
            0,
            l1_code,
            channel,
            constellation,
            Some(pr1),
            pr1,
            sat.phase_range,
            sat.lock,
            sat.cnr,
        );

        if let Some(l2) = &sat.l2 {
            let l2_code = if layout.glonass {
                SignalCode::new(if l2.code == 0 { "2C" } else { "2P" })
            } else {
                SignalCode::new(GPS_L2_CODES[usize::from(l2.code)])
            };
            let pr2 =
                (l2.range_diff != L2_RANGE_DIFF_INVALID).then(|| pr1 + l2.range_diff as f64 * 0.02);
            signals[1] = observe(
                ctx,
                sv,
                1,
                l2_code,
                channel,
                constellation,
                pr2,
                pr1,
                l2.phase_range,
                l2.lock,
                l2.cnr,
            );
        }

        match ctx.observation_mut(station_id, sv) {
            Some(record) => {
                record.signals[0] = signals[0];
                if sat.l2.is_some() {
                    record.signals[1] = signals[1];
                }
            },
            None => log::warn!("rtcm3 {}: observation batch full", reader.message_type()),
        }
    }

    ctx.end_epoch_message(more_follow, &mut completed);
    Ok(DecodeEvent::Observation { completed })
}

#[allow(clippy::too_many_arguments)]
fn observe(
    ctx: &mut DecodeContext,
    sv: SV,
    slot: usize,
    code: Option<SignalCode>,
    channel: Option<i8>,
    constellation: Constellation,
    pseudorange: Option<f64>,
    l1_pseudorange: f64,
    phase_range: i64,
    lock: u8,
    cnr: u8,
) -> SignalObservation {
    let mut obs = SignalObservation {
        code,
        snr: snr_from_dbhz(f64::from(cnr) * 0.25),
        ..Default::default()
    };
    if let Some(pr) = pseudorange {
        obs.pseudorange = pr;
    }
    let lambda = code.and_then(|c| wavelength(constellation, c, channel));
    if let (Some(lambda), true) = (lambda, phase_range != PHASE_RANGE_INVALID) {
        let cycles = ctx.adjust_carrier(sv, slot, phase_range as f64 * 0.0005 / lambda);
        obs.carrier_phase = l1_pseudorange / lambda + cycles;
    }
    if ctx.loss_of_lock(sv, slot, legacy_lock_time_ms(lock)) {
        obs.lli |= LliFlags::SLIP;
    }
    obs
}
