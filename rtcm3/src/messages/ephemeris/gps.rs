use gnss_rs::prelude::Constellation;

use super::{read_orbit, KeplerEphemeris, NavSource, OrbitLayout};
use crate::{
    bits::BitReader,
    constants::{P2_29, P2_31, P2_43, P2_5, P2_55, SC2RAD},
    context::DecodeContext,
    error::DecodeError,
    messages::DecodeEvent,
    satellite::{gps_or_sbas, satellite},
    time::{resolve_gps_week, GpsTime},
};

const LNAV_ORBIT: OrbitLayout = OrbitLayout {
    radial: (16, P2_5),
    angular: (16, P2_29),
    toe: (16, 16.0),
};

/// 1019, GPS ephemeris
pub(crate) fn decode_gps(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    reader.ensure(476)?;
    let prn = reader.u16(6)?;
    let week = reader.u32(10)?;
    let sva = reader.u8(4)?;
    let code = reader.u16(2)?;
    let idot = reader.scaled(14, P2_43 * SC2RAD)?;
    let iode = reader.u16(8)?;
    let toc = reader.scaled_unsigned(16, 16.0)?;
    let af2 = reader.scaled(8, P2_55)?;
    let af1 = reader.scaled(16, P2_43)?;
    let af0 = reader.scaled(22, P2_31)?;
    let iodc = reader.u16(10)?;
    let orbit = read_orbit(reader, &LNAV_ORBIT)?;
    let tgd = reader.scaled(8, P2_31)?;
    let health = reader.u16(6)?;
    let l2p_data_flag = reader.flag()?;
    let fit_flag = reader.flag()?;

    // 40.. are SBAS satellites, same as the observation messages
    let sv = gps_or_sbas(prn).ok_or_else(|| reader.invalid("satellite number"))?;
    let week = resolve_gps_week(ctx.time(), week);

    let mut eph = KeplerEphemeris::from_orbit(sv, NavSource::GpsLnav, orbit);
    eph.iode = iode;
    eph.iodc = iodc;
    eph.sva = sva;
    eph.health = health;
    eph.week = week;
    eph.code = code;
    eph.l2p_data_flag = l2p_data_flag;
    eph.toe = GpsTime::from_week_tow(week, eph.toe_seconds);
    eph.toc = GpsTime::from_week_tow(week, toc);
    eph.transmission_time = ctx.time();
    eph.fit_interval = if fit_flag { 6.0 } else { 4.0 };
    eph.idot = idot;
    eph.af0 = af0;
    eph.af1 = af1;
    eph.af2 = af2;
    eph.group_delays[0] = tgd;

    let stored = ctx.store_ephemeris(eph);
    Ok(DecodeEvent::Ephemeris {
        satellite: sv,
        source: NavSource::GpsLnav,
        stored,
    })
}

/// 1044, QZSS ephemeris
pub(crate) fn decode_qzss(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    reader.ensure(473)?;
    let prn = reader.u16(4)?;
    let toc = reader.scaled_unsigned(16, 16.0)?;
    let af2 = reader.scaled(8, P2_55)?;
    let af1 = reader.scaled(16, P2_43)?;
    let af0 = reader.scaled(22, P2_31)?;
    let iode = reader.u16(8)?;
    let orbit = read_orbit(reader, &LNAV_ORBIT)?;
    let idot = reader.scaled(14, P2_43 * SC2RAD)?;
    let code = reader.u16(2)?;
    let week = reader.u32(10)?;
    let sva = reader.u8(4)?;
    let health = reader.u16(6)?;
    let tgd = reader.scaled(8, P2_31)?;
    let iodc = reader.u16(10)?;
    let fit_flag = reader.flag()?;

    let sv = satellite(Constellation::QZSS, prn + 192)
        .ok_or_else(|| reader.invalid("satellite number"))?;
    let week = resolve_gps_week(ctx.time(), week);

    let mut eph = KeplerEphemeris::from_orbit(sv, NavSource::QzssLnav, orbit);
    eph.iode = iode;
    eph.iodc = iodc;
    eph.sva = sva;
    eph.health = health;
    eph.week = week;
    eph.code = code;
    eph.toe = GpsTime::from_week_tow(week, eph.toe_seconds);
    eph.toc = GpsTime::from_week_tow(week, toc);
    eph.transmission_time = ctx.time();
    eph.fit_interval = if fit_flag { 4.0 } else { 2.0 };
    eph.idot = idot;
    eph.af0 = af0;
    eph.af1 = af1;
    eph.af2 = af2;
    eph.group_delays[0] = tgd;

    let stored = ctx.store_ephemeris(eph);
    Ok(DecodeEvent::Ephemeris {
        satellite: sv,
        source: NavSource::QzssLnav,
        stored,
    })
}
