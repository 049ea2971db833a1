//! State carried from one frame to the next.
//!
//! The [DecodeContext] holds the observation batch being assembled, the
//! ephemeris tables, the station description and the correction tables.
//! Decoders mutate it through crate-private methods; callers read it
//! between frames.

use std::collections::BTreeMap;

use gnss_rs::prelude::{Constellation, SV};

use crate::{
    error::DecodeError,
    messages::{
        ephemeris::{EphemerisHistory, GlonassEphemeris, KeplerEphemeris, NavSource},
        observation::{ObservationBatch, ObservationRecord},
        ssr::SsrCorrection,
        station::StationRecord,
        system::{SystemParameters, TextMessage},
    },
    options::DecoderOptions,
    signal::{SignalCode, SIGNAL_SLOTS},
    time::GpsTime,
};

/// Half of the carrier phase roll-over window (cycles)
const CARRIER_ROLLOVER_HALF: f64 = 750.0;
const CARRIER_ROLLOVER: f64 = 1500.0;
/// Two epoch times closer than this are the same epoch (s)
const EPOCH_TOLERANCE: f64 = 1e-9;

/// Differential GNSS correction of one satellite
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DgpsCorrection {
    /// Correction epoch
    pub t0: GpsTime,
    /// Pseudorange correction (m)
    pub prc: f64,
    /// Range rate correction (m/s)
    pub rrc: f64,
    /// Issue of data
    pub iod: u16,
    /// User differential range error (m)
    pub udre: f64,
}

/// Tracking history of one satellite, per signal slot
#[derive(Debug, Clone, Copy, Default)]
struct Tracking {
    lock_ms: [u32; SIGNAL_SLOTS],
    carrier: [f64; SIGNAL_SLOTS],
}

/// Decoder state shared by all messages of one stream.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    options: DecoderOptions,
    time: GpsTime,
    /// Station of the observations being assembled
    station_id: Option<u16>,
    /// Station carried by the message being decoded
    message_station: Option<u16>,
    batch: ObservationBatch,
    last_batch: Option<ObservationBatch>,
    tracking: BTreeMap<SV, Tracking>,
    glonass_channels: BTreeMap<SV, i8>,
    msm_signals: BTreeMap<Constellation, Vec<SignalCode>>,
    ephemerides: BTreeMap<(SV, NavSource), EphemerisHistory<KeplerEphemeris>>,
    glonass_ephemerides: BTreeMap<SV, EphemerisHistory<GlonassEphemeris>>,
    station: StationRecord,
    ssr: BTreeMap<SV, SsrCorrection>,
    dgps: BTreeMap<SV, DgpsCorrection>,
    text: Option<TextMessage>,
    system_parameters: Option<SystemParameters>,
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new(DecoderOptions::default())
    }
}

impl DecodeContext {
    pub fn new(options: DecoderOptions) -> Self {
        let capacity = options.max_observations;
        Self {
            time: initial_time(&options),
            options,
            station_id: None,
            message_station: None,
            batch: ObservationBatch::new(capacity),
            last_batch: None,
            tracking: BTreeMap::new(),
            glonass_channels: BTreeMap::new(),
            msm_signals: BTreeMap::new(),
            ephemerides: BTreeMap::new(),
            glonass_ephemerides: BTreeMap::new(),
            station: StationRecord::default(),
            ssr: BTreeMap::new(),
            dgps: BTreeMap::new(),
            text: None,
            system_parameters: None,
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Time of the most recent timed message, or the reference time
    pub fn time(&self) -> GpsTime {
        self.time
    }

    /// Station of the observations currently being assembled
    pub fn station_id(&self) -> Option<u16> {
        self.station_id
    }

    /// Batch being assembled. It may still grow until it is finalized.
    pub fn observations(&self) -> &ObservationBatch {
        &self.batch
    }

    /// Most recently finalized batch
    pub fn last_batch(&self) -> Option<&ObservationBatch> {
        self.last_batch.as_ref()
    }

    /// Newest ephemeris of `satellite` from `source`
    pub fn ephemeris(&self, satellite: SV, source: NavSource) -> Option<&KeplerEphemeris> {
        self.ephemerides.get(&(satellite, source))?.latest()
    }

    pub fn ephemeris_history(
        &self,
        satellite: SV,
        source: NavSource,
    ) -> Option<&EphemerisHistory<KeplerEphemeris>> {
        self.ephemerides.get(&(satellite, source))
    }

    /// Newest ephemeris of every known (satellite, source)
    pub fn ephemerides(&self) -> impl Iterator<Item = &KeplerEphemeris> {
        self.ephemerides.values().filter_map(|h| h.latest())
    }

    pub fn glonass_ephemeris(&self, satellite: SV) -> Option<&GlonassEphemeris> {
        self.glonass_ephemerides.get(&satellite)?.latest()
    }

    pub fn glonass_ephemeris_history(
        &self,
        satellite: SV,
    ) -> Option<&EphemerisHistory<GlonassEphemeris>> {
        self.glonass_ephemerides.get(&satellite)
    }

    pub fn station(&self) -> &StationRecord {
        &self.station
    }

    /// Names the station marker. Station messages leave it untouched.
    pub fn set_marker(&mut self, name: &str, number: &str) {
        self.station.marker_name = name.to_string();
        self.station.marker_number = number.to_string();
    }

    pub fn ssr(&self, satellite: SV) -> Option<&SsrCorrection> {
        self.ssr.get(&satellite)
    }

    pub fn ssr_corrections(&self) -> impl Iterator<Item = (&SV, &SsrCorrection)> {
        self.ssr.iter()
    }

    /// Clears the update flag of every SSR entry
    pub fn clear_ssr_updates(&mut self) {
        for entry in self.ssr.values_mut() {
            entry.update = false;
        }
    }

    pub fn dgps(&self, satellite: SV) -> Option<&DgpsCorrection> {
        self.dgps.get(&satellite)
    }

    pub fn dgps_corrections(&self) -> impl Iterator<Item = (&SV, &DgpsCorrection)> {
        self.dgps.iter()
    }

    pub fn set_dgps(&mut self, satellite: SV, correction: DgpsCorrection) {
        self.dgps.insert(satellite, correction);
    }

    /// Last 1029 text message
    pub fn text(&self) -> Option<&TextMessage> {
        self.text.as_ref()
    }

    /// Last 1013 system parameters
    pub fn system_parameters(&self) -> Option<&SystemParameters> {
        self.system_parameters.as_ref()
    }

    /// Frequency channel of a GLONASS satellite, learned from observation
    /// messages or its ephemeris
    pub fn glonass_channel(&self, satellite: SV) -> Option<i8> {
        self.glonass_channels.get(&satellite).copied().or_else(|| {
            self.glonass_ephemeris(satellite)
                .map(|eph| eph.frequency_channel)
        })
    }

    /// Signals of the last MSM message of `constellation`
    pub fn msm_signals(&self, constellation: Constellation) -> &[SignalCode] {
        self.msm_signals
            .get(&constellation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Forgets everything but the options
    pub fn reset(&mut self) {
        *self = Self::new(self.options.clone());
    }

    pub(crate) fn set_time(&mut self, time: GpsTime) {
        self.time = time;
    }

    /// Checks the station of a message against the configured filter and
    /// the station of the observations being assembled.
    pub(crate) fn check_station(&mut self, station_id: u16) -> Result<(), DecodeError> {
        self.message_station = Some(station_id);
        if let Some(expect) = self.options.station_id {
            if expect != station_id {
                return Err(DecodeError::StationMismatch {
                    expect,
                    got: station_id,
                });
            }
        }
        match self.station_id {
            Some(expect) if expect != station_id && !self.batch.is_empty() => {
                log::warn!(
                    "station id changed from {expect} to {station_id}, dropping {} records",
                    self.batch.len()
                );
                self.station_id = None;
                let time = self.batch.time();
                self.batch.reset(time);
                Err(DecodeError::StationMismatch {
                    expect,
                    got: station_id,
                })
            },
            _ => {
                self.station_id = Some(station_id);
                Ok(())
            },
        }
    }

    pub(crate) fn take_message_station(&mut self) -> Option<u16> {
        self.message_station.take()
    }

    /// Starts or continues the epoch at `time`. Returns the batch
    /// finalized because the epoch changed, if any.
    pub(crate) fn begin_epoch(&mut self, time: GpsTime) -> Vec<ObservationBatch> {
        let mut completed = Vec::new();
        if !self.batch.is_empty() && time.diff(&self.batch.time()).abs() > EPOCH_TOLERANCE {
            completed.push(self.finalize_batch());
        }
        if self.batch.is_empty() {
            self.batch.reset(time);
        }
        self.time = time;
        completed
    }

    /// Finalizes the batch after the last message of an epoch
    pub(crate) fn end_epoch_message(
        &mut self,
        more_follow: bool,
        completed: &mut Vec<ObservationBatch>,
    ) {
        if !more_follow && !self.batch.is_empty() {
            completed.push(self.finalize_batch());
        }
    }

    fn finalize_batch(&mut self) -> ObservationBatch {
        let batch = core::mem::replace(
            &mut self.batch,
            ObservationBatch::new(self.options.max_observations),
        );
        log::debug!(
            "epoch {} complete with {} satellites",
            batch.time(),
            batch.len()
        );
        self.last_batch = Some(batch.clone());
        batch
    }

    /// Record of `satellite` in the current batch, `None` once it is full
    pub(crate) fn observation_mut(
        &mut self,
        station_id: u16,
        satellite: SV,
    ) -> Option<&mut ObservationRecord> {
        self.batch.record_mut(station_id, satellite)
    }

    /// Records the lock time of a signal and reports whether lock was lost
    /// since the previous observation.
    pub(crate) fn loss_of_lock(&mut self, satellite: SV, slot: usize, lock_ms: u32) -> bool {
        let track = self.tracking.entry(satellite).or_default();
        let previous = track.lock_ms[slot];
        track.lock_ms[slot] = lock_ms;
        (lock_ms == 0 && previous == 0) || lock_ms < previous
    }

    /// Removes 1500 cycle roll-overs of a carrier phase against the
    /// previous value of the same signal.
    pub(crate) fn adjust_carrier(&mut self, satellite: SV, slot: usize, cycles: f64) -> f64 {
        let track = self.tracking.entry(satellite).or_default();
        let previous = track.carrier[slot];
        let mut cycles = cycles;
        if previous != 0.0 {
            if cycles < previous - CARRIER_ROLLOVER_HALF {
                cycles += CARRIER_ROLLOVER;
            } else if cycles > previous + CARRIER_ROLLOVER_HALF {
                cycles -= CARRIER_ROLLOVER;
            }
        }
        track.carrier[slot] = cycles;
        cycles
    }

    pub(crate) fn set_glonass_channel(&mut self, satellite: SV, channel: i8) {
        self.glonass_channels.insert(satellite, channel);
    }

    pub(crate) fn set_msm_signals(&mut self, constellation: Constellation, signals: Vec<SignalCode>) {
        self.msm_signals.insert(constellation, signals);
    }

    /// Stores an ephemeris under its (satellite, source). Returns false
    /// when the same set was already the newest one.
    pub(crate) fn store_ephemeris(&mut self, eph: KeplerEphemeris) -> bool {
        let (sv, source, iode) = (eph.satellite, eph.source, eph.iode);
        let stored = self
            .ephemerides
            .entry((sv, source))
            .or_default()
            .insert(eph, self.options.ephemeris_policy);
        if stored {
            log::debug!("{sv} {source:?} ephemeris iode={iode} stored");
        } else {
            log::trace!("{sv} {source:?} ephemeris iode={iode} unchanged");
        }
        stored
    }

    pub(crate) fn store_glonass_ephemeris(&mut self, eph: GlonassEphemeris) -> bool {
        let (sv, iode) = (eph.satellite, eph.iode);
        let stored = self
            .glonass_ephemerides
            .entry(sv)
            .or_default()
            .insert(eph, self.options.ephemeris_policy);
        if stored {
            log::debug!("{sv} ephemeris iode={iode} stored");
        }
        stored
    }

    pub(crate) fn station_mut(&mut self) -> &mut StationRecord {
        &mut self.station
    }

    pub(crate) fn set_text(&mut self, text: TextMessage) {
        self.text = Some(text);
    }

    pub(crate) fn set_system_parameters(&mut self, parameters: SystemParameters) {
        self.system_parameters = Some(parameters);
    }

    pub(crate) fn ssr_entry(&mut self, satellite: SV) -> &mut SsrCorrection {
        self.ssr.entry(satellite).or_default()
    }
}

fn initial_time(options: &DecoderOptions) -> GpsTime {
    if let Some(time) = options.reference_time {
        return time;
    }
    #[cfg(feature = "std")]
    {
        GpsTime::now()
    }
    #[cfg(not(feature = "std"))]
    {
        GpsTime::from_week_tow(crate::time::MIN_REFERENCE_WEEK, 0.0)
    }
}
