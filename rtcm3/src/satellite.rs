//! Mapping from RTCM satellite numbering onto [SV].
//!
//! SBAS satellites are stored the RINEX way, PRN minus 100 (`S20` for PRN
//! 120). QZSS satellites use their `J` number (PRN minus 192).

use gnss_rs::prelude::{Constellation, SV};

pub(crate) const MIN_PRN_SBAS: u16 = 120;
pub(crate) const MAX_PRN_SBAS: u16 = 158;
pub(crate) const MIN_PRN_QZSS: u16 = 193;
pub(crate) const MAX_PRN_QZSS: u16 = 202;

/// Builds a satellite from its constellation and the PRN as used by the
/// standard (SBAS 120..=158, QZSS 193..=202). Returns `None` when the
/// number is outside the constellation's range.
pub fn satellite(constellation: Constellation, prn: u16) -> Option<SV> {
    let (first, last, offset) = match constellation {
        Constellation::GPS => (1, 32, 0),
        Constellation::Glonass => (1, 27, 0),
        Constellation::Galileo => (1, 36, 0),
        Constellation::BeiDou => (1, 63, 0),
        Constellation::IRNSS => (1, 14, 0),
        Constellation::QZSS => (MIN_PRN_QZSS, MAX_PRN_QZSS, 192),
        c if c.is_sbas() => (MIN_PRN_SBAS, MAX_PRN_SBAS, 100),
        _ => return None,
    };
    if !(first..=last).contains(&prn) {
        return None;
    }
    let constellation = if constellation.is_sbas() {
        Constellation::SBAS
    } else {
        constellation
    };
    Some(SV::new(constellation, (prn - offset) as u8))
}

/// Legacy GPS message numbering: 1..=39 are GPS, 40.. are SBAS (PRN - 80).
pub(crate) fn gps_or_sbas(prn: u16) -> Option<SV> {
    if prn < 40 {
        satellite(Constellation::GPS, prn)
    } else {
        satellite(Constellation::SBAS, prn + 80)
    }
}

/// PRN as used by the standard, inverse of [satellite]
pub fn prn(sv: &SV) -> u16 {
    let prn = u16::from(sv.prn);
    match sv.constellation {
        Constellation::QZSS => prn + 192,
        c if c.is_sbas() => prn + 100,
        _ => prn,
    }
}
