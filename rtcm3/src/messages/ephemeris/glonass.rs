use gnss_rs::prelude::Constellation;

use super::GlonassEphemeris;
use crate::{
    bits::BitReader,
    constants::{P2_11, P2_20, P2_30, P2_31, P2_40},
    context::DecodeContext,
    error::DecodeError,
    messages::DecodeEvent,
    satellite::satellite,
    time::resolve_glonass_tod,
};

/// 1020, GLONASS ephemeris
pub(crate) fn decode_glonass(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    reader.ensure(348)?;
    let prn = reader.u16(6)?;
    let channel = reader.u8(5)?;
    reader.skip(4)?; // almanac health, availability, P1
    let tk_hours = reader.unsigned(5)?;
    let tk_minutes = reader.unsigned(6)?;
    let tk_half_minutes = reader.unsigned(1)?;
    let bn = reader.u8(1)?;
    reader.skip(1)?; // P2
    let tb = reader.u16(7)?;

    let mut position = [0.0; 3];
    let mut velocity = [0.0; 3];
    let mut acceleration = [0.0; 3];
    // x, y, z each as velocity, position, acceleration
    for ((v, p), a) in velocity
        .iter_mut()
        .zip(position.iter_mut())
        .zip(acceleration.iter_mut())
    {
        *v = reader.scaled_sign_magnitude(24, P2_20 * 1e3)?;
        *p = reader.scaled_sign_magnitude(27, P2_11 * 1e3)?;
        *a = reader.scaled_sign_magnitude(5, P2_30 * 1e3)?;
    }

    reader.skip(1)?; // P3
    let gamma_n = reader.scaled_sign_magnitude(11, P2_40)?;
    reader.skip(3)?; // P, ln
    let tau_n = reader.scaled_sign_magnitude(22, P2_30)?;
    let delta_tau_n = reader.scaled_sign_magnitude(5, P2_30)?;
    let age = reader.u8(5)?;
    reader.skip(1)?; // P4
    let accuracy = reader.u8(4)?;
    let day_number = reader.u16(11)?;
    let modification = reader.u8(2)?;
    let additional_data = reader.flag()?;
    reader.skip(11)?; // NA
    let tau_c = reader.scaled_sign_magnitude(32, P2_31)?;
    let four_year_interval = reader.u8(5)?;
    let tau_gps = reader.scaled_sign_magnitude(22, P2_30)?;

    let sv = satellite(Constellation::Glonass, prn)
        .ok_or_else(|| reader.invalid("satellite number"))?;
    if channel > 20 {
        return Err(reader.invalid("frequency channel"));
    }
    let frequency_channel = channel as i8 - 7;
    ctx.set_glonass_channel(sv, frequency_channel);

    let tk = (tk_hours * 3600 + tk_minutes * 60 + tk_half_minutes * 30) as f64;
    let eph = GlonassEphemeris {
        satellite: sv,
        iode: tb & 0x7f,
        frequency_channel,
        health: bn,
        accuracy,
        age,
        toe: resolve_glonass_tod(ctx.time(), f64::from(tb) * 900.0),
        tof: resolve_glonass_tod(ctx.time(), tk),
        position,
        velocity,
        acceleration,
        tau_n,
        gamma_n,
        delta_tau_n,
        day_number,
        four_year_interval,
        modification,
        tau_c,
        tau_gps,
        additional_data,
    };

    let stored = ctx.store_glonass_ephemeris(eph);
    Ok(DecodeEvent::GlonassEphemeris { satellite: sv, stored })
}
