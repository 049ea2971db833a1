use gnss_rs::prelude::Constellation;

use super::{read_orbit, KeplerEphemeris, NavSource, OrbitLayout};
use crate::{
    bits::BitReader,
    constants::{P2_31, P2_33, P2_43, P2_50, P2_6, P2_66, SC2RAD},
    context::DecodeContext,
    error::DecodeError,
    messages::DecodeEvent,
    satellite::satellite,
    time::{resolve_beidou_week, GpsTime},
};

const D1_ORBIT: OrbitLayout = OrbitLayout {
    radial: (18, P2_6),
    angular: (18, P2_31),
    toe: (17, 8.0),
};

/// 1042, BeiDou ephemeris. Week and times are broadcast in BDT.
pub(crate) fn decode_beidou(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    reader.ensure(499)?;
    let prn = reader.u16(6)?;
    let week = reader.u32(13)?;
    let sva = reader.u8(4)?;
    let idot = reader.scaled(14, P2_43 * SC2RAD)?;
    let aode = reader.u16(5)?;
    let toc = reader.scaled_unsigned(17, 8.0)?;
    let af2 = reader.scaled(11, P2_66)?;
    let af1 = reader.scaled(22, P2_50)?;
    let af0 = reader.scaled(24, P2_33)?;
    let aodc = reader.u16(5)?;
    let orbit = read_orbit(reader, &D1_ORBIT)?;
    let tgd1 = reader.scaled(10, 1e-10)?;
    let tgd2 = reader.scaled(10, 1e-10)?;
    let health = reader.u16(1)?;

    let sv = satellite(Constellation::BeiDou, prn)
        .ok_or_else(|| reader.invalid("satellite number"))?;
    let week = resolve_beidou_week(ctx.time(), week);

    let mut eph = KeplerEphemeris::from_orbit(sv, NavSource::BeidouD1D2, orbit);
    eph.iode = aode;
    eph.iodc = aodc;
    eph.sva = sva;
    eph.health = health;
    eph.week = week;
    eph.toe = GpsTime::from_beidou_week_sow(week, eph.toe_seconds);
    eph.toc = GpsTime::from_beidou_week_sow(week, toc);
    eph.transmission_time = ctx.time();
    eph.idot = idot;
    eph.af0 = af0;
    eph.af1 = af1;
    eph.af2 = af2;
    eph.group_delays[0] = tgd1;
    eph.group_delays[1] = tgd2;

    let stored = ctx.store_ephemeris(eph);
    Ok(DecodeEvent::Ephemeris {
        satellite: sv,
        source: NavSource::BeidouD1D2,
        stored,
    })
}
