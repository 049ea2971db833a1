//! Broadcast ephemerides: Keplerian sets (GPS, QZSS, BeiDou, Galileo,
//! NavIC) and GLONASS state vectors.

mod beidou;
mod galileo;
mod glonass;
mod gps;
mod navic;

pub(crate) use beidou::decode_beidou;
pub(crate) use galileo::decode_galileo;
pub(crate) use glonass::decode_glonass;
pub(crate) use gps::{decode_gps, decode_qzss};
pub(crate) use navic::decode_navic;

use gnss_rs::prelude::SV;

use crate::{
    bits::BitReader,
    constants::{P2_19, P2_31, P2_33, P2_43, SC2RAD},
    error::DecodeError,
    options::EphemerisPolicy,
    time::GpsTime,
};

/// Issue of data generations kept per satellite and source
pub const EPHEMERIS_GENERATIONS: usize = 4;

/// Navigation message an ephemeris was broadcast in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NavSource {
    /// GPS legacy navigation message (1019)
    GpsLnav,
    /// QZSS legacy navigation message (1044)
    QzssLnav,
    /// BeiDou D1/D2 (1042)
    BeidouD1D2,
    /// Galileo I/NAV (1046)
    GalileoInav,
    /// Galileo F/NAV (1045)
    GalileoFnav,
    /// NavIC/IRNSS (1041)
    Navic,
}

/// Keplerian broadcast ephemeris.
///
/// Angles are in radians, distances in metres and clock terms in seconds.
/// `week` uses the numbering of the source: GPS weeks for GPS, QZSS, NavIC
/// and Galileo (GST week + 1024), BeiDou weeks for BeiDou. `toe` and `toc`
/// are always GPS time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeplerEphemeris {
    pub satellite: SV,
    pub source: NavSource,
    /// IODE, BeiDou AODE, Galileo IODnav
    pub iode: u16,
    /// IODC, BeiDou AODC, Galileo IODnav
    pub iodc: u16,
    /// Accuracy index (URA, SISA)
    pub sva: u8,
    pub health: u16,
    pub week: i64,
    /// GPS/QZSS: codes on L2; Galileo: data source bits
    pub code: u16,
    /// GPS/QZSS: L2 P data flag
    pub l2p_data_flag: bool,
    pub toe: GpsTime,
    pub toc: GpsTime,
    /// Receiver time at decoding
    pub transmission_time: GpsTime,
    /// Time of ephemeris, seconds of the broadcast week
    pub toe_seconds: f64,
    /// Curve fit interval (hours), zero when not broadcast
    pub fit_interval: f64,
    pub sqrt_a: f64,
    pub e: f64,
    pub i0: f64,
    pub omega0: f64,
    pub omega: f64,
    pub m0: f64,
    pub delta_n: f64,
    pub omega_dot: f64,
    pub idot: f64,
    pub crc: f64,
    pub crs: f64,
    pub cuc: f64,
    pub cus: f64,
    pub cic: f64,
    pub cis: f64,
    pub af0: f64,
    pub af1: f64,
    pub af2: f64,
    /// GPS/QZSS/NavIC: `[TGD]`, BeiDou: `[TGD1, TGD2]`, Galileo:
    /// `[BGD E5a/E1, BGD E5b/E1]`; remaining entries zero
    pub group_delays: [f64; 6],
}

impl KeplerEphemeris {
    pub fn semi_major_axis(&self) -> f64 {
        self.sqrt_a * self.sqrt_a
    }
}

/// GLONASS broadcast ephemeris, state vector in PZ-90 (metres, m/s, m/s²)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlonassEphemeris {
    pub satellite: SV,
    /// `tb` index, 7 bits
    pub iode: u16,
    pub frequency_channel: i8,
    /// `Bn` health flag
    pub health: u8,
    /// `FT` accuracy index
    pub accuracy: u8,
    /// `En` age of data (days)
    pub age: u8,
    pub toe: GpsTime,
    /// Message frame time
    pub tof: GpsTime,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],
    /// `tau_n` clock bias (s)
    pub tau_n: f64,
    /// `gamma_n` relative frequency bias
    pub gamma_n: f64,
    /// `delta tau_n` L1/L2 delay difference (s)
    pub delta_tau_n: f64,
    /// `NT` day number within the four year interval
    pub day_number: u16,
    /// `N4` four year interval number
    pub four_year_interval: u8,
    /// `M` satellite type, 1 for GLONASS-M
    pub modification: u8,
    /// `tau_c` GLONASS to UTC(SU) correction (s)
    pub tau_c: f64,
    /// `tau_GPS` GLONASS to GPS time correction (s)
    pub tau_gps: f64,
    /// Additional data (NT, N4, tau_GPS...) flagged valid
    pub additional_data: bool,
}

/// Identity of an ephemeris set inside an [EphemerisHistory]
pub trait IssueOfData {
    fn issue_of_data(&self) -> u16;

    /// True when `other` carries the same broadcast set
    fn same_set(&self, other: &Self) -> bool;
}

impl IssueOfData for KeplerEphemeris {
    fn issue_of_data(&self) -> u16 {
        self.iode
    }

    fn same_set(&self, other: &Self) -> bool {
        match self.source {
            // AODE only changes hourly, toe tells the sets apart
            NavSource::BeidouD1D2 => {
                self.toe.diff(&other.toe) == 0.0
                    && self.iode == other.iode
                    && self.iodc == other.iodc
            },
            _ => self.iode == other.iode,
        }
    }
}

impl IssueOfData for GlonassEphemeris {
    fn issue_of_data(&self) -> u16 {
        self.iode
    }

    fn same_set(&self, other: &Self) -> bool {
        self.toe.diff(&other.toe).abs() < 1.0 && self.health == other.health
    }
}

/// Recent ephemeris sets of one satellite, newest first.
///
/// A new issue of data becomes the latest entry while older ones stay
/// reachable through [EphemerisHistory::by_issue] until
/// [EPHEMERIS_GENERATIONS] newer sets have arrived.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EphemerisHistory<E> {
    entries: Vec<E>,
}

impl<E> Default for EphemerisHistory<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: IssueOfData> EphemerisHistory<E> {
    pub fn latest(&self) -> Option<&E> {
        self.entries.first()
    }

    pub fn by_issue(&self, issue_of_data: u16) -> Option<&E> {
        self.entries
            .iter()
            .find(|e| e.issue_of_data() == issue_of_data)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns false when the set was already the latest one and `policy`
    /// keeps it.
    pub(crate) fn insert(&mut self, eph: E, policy: EphemerisPolicy) -> bool {
        if policy == EphemerisPolicy::KeepExisting
            && self.latest().is_some_and(|latest| latest.same_set(&eph))
        {
            return false;
        }
        let iod = eph.issue_of_data();
        self.entries.retain(|e| e.issue_of_data() != iod);
        self.entries.insert(0, eph);
        self.entries.truncate(EPHEMERIS_GENERATIONS);
        true
    }
}

/// Widths and scales of the orbit block shared by the Keplerian messages
struct OrbitLayout {
    /// crs, crc
    radial: (usize, f64),
    /// cuc, cus, cic, cis
    angular: (usize, f64),
    /// toe (s)
    toe: (usize, f64),
}

/// Orbit block, in broadcast order: crs, delta n, M0, cuc, e, cus,
/// sqrt(A), toe, cic, OMEGA0, cis, i0, crc, omega, OMEGA dot
struct Orbit {
    crs: f64,
    delta_n: f64,
    m0: f64,
    cuc: f64,
    e: f64,
    cus: f64,
    sqrt_a: f64,
    toe_seconds: f64,
    cic: f64,
    omega0: f64,
    cis: f64,
    i0: f64,
    crc: f64,
    omega: f64,
    omega_dot: f64,
}

fn read_orbit(reader: &mut BitReader, layout: &OrbitLayout) -> Result<Orbit, DecodeError> {
    let (rw, rs) = layout.radial;
    let (aw, as_) = layout.angular;
    let (tw, ts) = layout.toe;
    Ok(Orbit {
        crs: reader.scaled(rw, rs)?,
        delta_n: reader.scaled(16, P2_43 * SC2RAD)?,
        m0: reader.scaled(32, P2_31 * SC2RAD)?,
        cuc: reader.scaled(aw, as_)?,
        e: reader.scaled_unsigned(32, P2_33)?,
        cus: reader.scaled(aw, as_)?,
        sqrt_a: reader.scaled_unsigned(32, P2_19)?,
        toe_seconds: reader.scaled_unsigned(tw, ts)?,
        cic: reader.scaled(aw, as_)?,
        omega0: reader.scaled(32, P2_31 * SC2RAD)?,
        cis: reader.scaled(aw, as_)?,
        i0: reader.scaled(32, P2_31 * SC2RAD)?,
        crc: reader.scaled(rw, rs)?,
        omega: reader.scaled(32, P2_31 * SC2RAD)?,
        omega_dot: reader.scaled(24, P2_43 * SC2RAD)?,
    })
}

impl KeplerEphemeris {
    /// Ephemeris holding `orbit`, every other field zero
    fn from_orbit(satellite: SV, source: NavSource, orbit: Orbit) -> Self {
        Self {
            satellite,
            source,
            iode: 0,
            iodc: 0,
            sva: 0,
            health: 0,
            week: 0,
            code: 0,
            l2p_data_flag: false,
            toe: GpsTime::default(),
            toc: GpsTime::default(),
            transmission_time: GpsTime::default(),
            toe_seconds: orbit.toe_seconds,
            fit_interval: 0.0,
            sqrt_a: orbit.sqrt_a,
            e: orbit.e,
            i0: orbit.i0,
            omega0: orbit.omega0,
            omega: orbit.omega,
            m0: orbit.m0,
            delta_n: orbit.delta_n,
            omega_dot: orbit.omega_dot,
            idot: 0.0,
            crc: orbit.crc,
            crs: orbit.crs,
            cuc: orbit.cuc,
            cus: orbit.cus,
            cic: orbit.cic,
            cis: orbit.cis,
            af0: 0.0,
            af1: 0.0,
            af2: 0.0,
            group_delays: [0.0; 6],
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gnss_rs::prelude::Constellation;

    pub(crate) fn gps_ephemeris(prn: u8, iode: u16) -> KeplerEphemeris {
        KeplerEphemeris {
            satellite: SV::new(Constellation::GPS, prn),
            source: NavSource::GpsLnav,
            iode,
            iodc: iode,
            sva: 0,
            health: 0,
            week: 2300,
            code: 1,
            l2p_data_flag: false,
            toe: GpsTime::from_week_tow(2300, 7200.0),
            toc: GpsTime::from_week_tow(2300, 7200.0),
            transmission_time: GpsTime::default(),
            toe_seconds: 7200.0,
            fit_interval: 4.0,
            sqrt_a: 5153.6,
            e: 0.01,
            i0: 0.95,
            omega0: 1.0,
            omega: -1.0,
            m0: 0.5,
            delta_n: 4e-9,
            omega_dot: -8e-9,
            idot: 1e-10,
            crc: 200.0,
            crs: -20.0,
            cuc: 1e-6,
            cus: 1e-6,
            cic: 1e-7,
            cis: 1e-7,
            af0: 1e-4,
            af1: 1e-12,
            af2: 0.0,
            group_delays: [0.0; 6],
        }
    }

    #[test]
    fn newer_issue_becomes_latest() {
        let mut history = EphemerisHistory::default();
        assert!(history.insert(gps_ephemeris(3, 5), EphemerisPolicy::KeepExisting));
        assert_eq!(history.latest().map(|e| e.iode), Some(5));
        assert!(history.insert(gps_ephemeris(3, 6), EphemerisPolicy::KeepExisting));
        assert_eq!(history.latest().map(|e| e.iode), Some(6));
        assert_eq!(history.by_issue(5).map(|e| e.iode), Some(5));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn same_issue_is_kept() {
        let mut history = EphemerisHistory::default();
        history.insert(gps_ephemeris(3, 5), EphemerisPolicy::KeepExisting);
        let mut resent = gps_ephemeris(3, 5);
        resent.af0 = 2e-4;
        assert!(!history.insert(resent.clone(), EphemerisPolicy::KeepExisting));
        assert_eq!(history.latest().map(|e| e.af0), Some(1e-4));
        assert!(history.insert(resent, EphemerisPolicy::AcceptAll));
        assert_eq!(history.latest().map(|e| e.af0), Some(2e-4));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn history_is_bounded() {
        let mut history = EphemerisHistory::default();
        for iode in 0..10 {
            history.insert(gps_ephemeris(1, iode), EphemerisPolicy::KeepExisting);
        }
        assert_eq!(history.len(), EPHEMERIS_GENERATIONS);
        let kept: Vec<u16> = history.iter().map(|e| e.iode).collect();
        assert_eq!(kept, vec![9, 8, 7, 6]);
        assert!(history.by_issue(5).is_none());
    }

    #[test]
    fn beidou_sets_differ_by_toe() {
        let mut a = gps_ephemeris(7, 1);
        a.source = NavSource::BeidouD1D2;
        let mut b = a.clone();
        assert!(a.same_set(&b));
        b.toe = b.toe.add_seconds(3600.0);
        assert!(!a.same_set(&b));
    }
}
