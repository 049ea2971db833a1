use gnss_rs::prelude::Constellation;

use super::{KeplerEphemeris, NavSource, Orbit};
use crate::{
    bits::BitReader,
    constants::{P2_19, P2_28, P2_31, P2_33, P2_41, P2_43, P2_55, SC2RAD},
    context::DecodeContext,
    error::DecodeError,
    messages::DecodeEvent,
    satellite::satellite,
    time::{resolve_gps_week, GpsTime},
};

/// 1041, NavIC/IRNSS ephemeris. The orbit fields come in their own order,
/// unlike the other Keplerian messages.
pub(crate) fn decode_navic(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    // 466 bits of fields, 4 reserved
    reader.ensure(470)?;
    let prn = reader.u16(6)?;
    let week = reader.u32(10)?;
    let af0 = reader.scaled(22, P2_31)?;
    let af1 = reader.scaled(16, P2_43)?;
    let af2 = reader.scaled(8, P2_55)?;
    let sva = reader.u8(4)?;
    let toc = reader.scaled_unsigned(16, 16.0)?;
    let tgd = reader.scaled(8, P2_31)?;
    let delta_n = reader.scaled(22, P2_41 * SC2RAD)?;
    let iode = reader.u16(8)?;
    reader.skip(10)?;
    let health = reader.u16(2)?;
    let cuc = reader.scaled(15, P2_28)?;
    let cus = reader.scaled(15, P2_28)?;
    let cic = reader.scaled(15, P2_28)?;
    let cis = reader.scaled(15, P2_28)?;
    let crc = reader.scaled(15, 0.0625)?;
    let crs = reader.scaled(15, 0.0625)?;
    let idot = reader.scaled(14, P2_43 * SC2RAD)?;
    let m0 = reader.scaled(32, P2_31 * SC2RAD)?;
    let toe_seconds = reader.scaled_unsigned(16, 16.0)?;
    let e = reader.scaled_unsigned(32, P2_33)?;
    let sqrt_a = reader.scaled_unsigned(32, P2_19)?;
    let omega0 = reader.scaled(32, P2_31 * SC2RAD)?;
    let omega = reader.scaled(32, P2_31 * SC2RAD)?;
    let omega_dot = reader.scaled(22, P2_41 * SC2RAD)?;
    let i0 = reader.scaled(32, P2_31 * SC2RAD)?;

    let sv = satellite(Constellation::IRNSS, prn)
        .ok_or_else(|| reader.invalid("satellite number"))?;
    // NavIC weeks count from the GPS week 1024 roll-over
    let week = resolve_gps_week(ctx.time(), week);

    let orbit = Orbit {
        crs,
        delta_n,
        m0,
        cuc,
        e,
        cus,
        sqrt_a,
        toe_seconds,
        cic,
        omega0,
        cis,
        i0,
        crc,
        omega,
        omega_dot,
    };
    let mut eph = KeplerEphemeris::from_orbit(sv, NavSource::Navic, orbit);
    eph.iode = iode;
    eph.iodc = iode;
    eph.sva = sva;
    eph.health = health;
    eph.week = week;
    eph.toe = GpsTime::from_week_tow(week, toe_seconds);
    eph.toc = GpsTime::from_week_tow(week, toc);
    eph.transmission_time = ctx.time();
    eph.idot = idot;
    eph.af0 = af0;
    eph.af1 = af1;
    eph.af2 = af2;
    eph.group_delays[0] = tgd;

    let stored = ctx.store_ephemeris(eph);
    Ok(DecodeEvent::Ephemeris {
        satellite: sv,
        source: NavSource::Navic,
        stored,
    })
}
