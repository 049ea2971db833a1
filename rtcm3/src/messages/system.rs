use crate::{
    bits::BitReader, context::DecodeContext, error::DecodeError, messages::DecodeEvent,
    time::GpsTime,
};

/// Modified Julian Date of 1970-01-01
const MJD_UNIX_EPOCH: i64 = 40_587;

/// UTC day and second of day to GPS time
fn utc_time(mjd: u16, seconds_of_day: u32) -> GpsTime {
    let unix = (i64::from(mjd) - MJD_UNIX_EPOCH) * 86_400 + i64::from(seconds_of_day);
    GpsTime::from_utc_scale(GpsTime::new(unix, 0.0))
}

/// Unicode text string, 1029
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextMessage {
    pub station_id: u16,
    pub mjd: u16,
    /// UTC seconds of day
    pub seconds_of_day: u32,
    /// `mjd` and `seconds_of_day` in GPS time
    pub time: GpsTime,
    /// Character count announced by the sender
    pub characters: u8,
    pub text: String,
}

/// Message announced in the system parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnouncedMessage {
    pub message_type: u16,
    pub synchronous: bool,
    /// Transmission interval (s)
    pub interval: f64,
}

/// System parameters, 1013
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemParameters {
    pub station_id: u16,
    pub mjd: u16,
    pub seconds_of_day: u32,
    pub time: GpsTime,
    /// GPS - UTC (s)
    pub leap_seconds: u8,
    pub messages: Vec<AnnouncedMessage>,
}

pub(crate) fn decode_text(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let station_id = reader.u16(12)?;
    let mjd = reader.u16(16)?;
    let seconds_of_day = reader.u32(17)?;
    let characters = reader.u8(7)?;
    let len = usize::from(reader.u8(8)?);
    let bytes = reader.bytes(len)?;

    ctx.check_station(station_id)?;
    ctx.set_text(TextMessage {
        station_id,
        mjd,
        seconds_of_day,
        time: utc_time(mjd, seconds_of_day),
        characters,
        text: String::from_utf8_lossy(&bytes).into_owned(),
    });
    Ok(DecodeEvent::Text)
}

pub(crate) fn decode_system_parameters(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let station_id = reader.u16(12)?;
    let mjd = reader.u16(16)?;
    let seconds_of_day = reader.u32(17)?;
    let count = usize::from(reader.u8(5)?);
    let leap_seconds = reader.u8(8)?;
    reader.ensure(count * 29)?;
    let mut messages = Vec::with_capacity(count);
    for _ in 0..count {
        messages.push(AnnouncedMessage {
            message_type: reader.u16(12)?,
            synchronous: reader.flag()?,
            interval: reader.scaled_unsigned(16, 0.1)?,
        });
    }

    ctx.check_station(station_id)?;
    ctx.set_system_parameters(SystemParameters {
        station_id,
        mjd,
        seconds_of_day,
        time: utc_time(mjd, seconds_of_day),
        leap_seconds,
        messages,
    });
    Ok(DecodeEvent::SystemParameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mjd_conversion() {
        // 2017-01-01 00:00:00 UTC, 18 leap seconds
        let t = utc_time(57_754, 0);
        assert_eq!(t.seconds, 1_483_228_800 + 18);
        let utc = t.to_utc().unwrap();
        assert_eq!(utc.timestamp(), 1_483_228_800);
    }
}
