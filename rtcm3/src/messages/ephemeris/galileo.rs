use gnss_rs::prelude::Constellation;

use super::{read_orbit, KeplerEphemeris, NavSource, OrbitLayout};
use crate::{
    bits::BitReader,
    constants::{P2_29, P2_32, P2_34, P2_43, P2_46, P2_5, P2_59, SC2RAD},
    context::DecodeContext,
    error::DecodeError,
    messages::DecodeEvent,
    satellite::satellite,
    time::GpsTime,
};

const GALILEO_ORBIT: OrbitLayout = OrbitLayout {
    radial: (16, P2_5),
    angular: (16, P2_29),
    toe: (14, 60.0),
};

/// Data source bits of the `code` field
const SOURCE_INAV_E1B: u16 = 1 << 0;
const SOURCE_FNAV_E5A: u16 = 1 << 1;
const SOURCE_INAV_E5B: u16 = 1 << 2;
const CLOCK_E1_E5A: u16 = 1 << 8;
const CLOCK_E1_E5B: u16 = 1 << 9;

/// 1045 (F/NAV) and 1046 (I/NAV), Galileo ephemeris
pub(crate) fn decode_galileo(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let inav = reader.message_type() == 1046;
    reader.ensure(if inav { 492 } else { 484 })?;
    let prn = reader.u16(6)?;
    let week = reader.u32(12)?;
    let iodnav = reader.u16(10)?;
    let sisa = reader.u8(8)?;
    let idot = reader.scaled(14, P2_43 * SC2RAD)?;
    let toc = reader.scaled_unsigned(14, 60.0)?;
    let af2 = reader.scaled(6, P2_59)?;
    let af1 = reader.scaled(21, P2_46)?;
    let af0 = reader.scaled(31, P2_34)?;
    let orbit = read_orbit(reader, &GALILEO_ORBIT)?;
    let bgd_e5a = reader.scaled(10, P2_32)?;

    let (source, bgd_e5b, health, code) = if inav {
        let bgd_e5b = reader.scaled(10, P2_32)?;
        let e5b_hs = reader.u16(2)?;
        let e5b_dvs = reader.u16(1)?;
        let e1_hs = reader.u16(2)?;
        let e1_dvs = reader.u16(1)?;
        (
            NavSource::GalileoInav,
            bgd_e5b,
            (e5b_hs << 7) | (e5b_dvs << 6) | (e1_hs << 1) | e1_dvs,
            SOURCE_INAV_E1B | SOURCE_INAV_E5B | CLOCK_E1_E5B,
        )
    } else {
        let e5a_hs = reader.u16(2)?;
        let e5a_dvs = reader.u16(1)?;
        (
            NavSource::GalileoFnav,
            0.0,
            (e5a_hs << 4) | (e5a_dvs << 3),
            SOURCE_FNAV_E5A | CLOCK_E1_E5A,
        )
    };

    let sv = satellite(Constellation::Galileo, prn)
        .ok_or_else(|| reader.invalid("satellite number"))?;
    // GST week 0 is GPS week 1024
    let week = i64::from(week) + 1024;

    let mut eph = KeplerEphemeris::from_orbit(sv, source, orbit);
    eph.iode = iodnav;
    eph.iodc = iodnav;
    eph.sva = sisa;
    eph.health = health;
    eph.week = week;
    eph.code = code;
    eph.toe = GpsTime::from_week_tow(week, eph.toe_seconds);
    eph.toc = GpsTime::from_week_tow(week, toc);
    eph.transmission_time = ctx.time();
    eph.idot = idot;
    eph.af0 = af0;
    eph.af1 = af1;
    eph.af2 = af2;
    eph.group_delays[0] = bgd_e5a;
    eph.group_delays[1] = bgd_e5b;

    let stored = ctx.store_ephemeris(eph);
    Ok(DecodeEvent::Ephemeris {
        satellite: sv,
        source,
        stored,
    })
}
