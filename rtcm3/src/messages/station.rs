//! Reference station messages: position (1005, 1006), antenna and
//! receiver descriptors (1007, 1008, 1033) and GLONASS code-phase biases
//! (1230).

use bitflags::bitflags;

use crate::{
    bits::BitReader,
    context::DecodeContext,
    error::DecodeError,
    geodesy::{ecef_to_geodetic, Geodetic},
    messages::DecodeEvent,
};

bitflags! {
    /// Indicator bits of the station position messages
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StationIndicators: u8 {
        const GPS = 0x01;
        const GLONASS = 0x02;
        const GALILEO = 0x04;
        /// Physical reference station, as opposed to a virtual one
        const REFERENCE_STATION = 0x08;
        /// All raw data from one receiver oscillator
        const SINGLE_RECEIVER_OSCILLATOR = 0x10;
    }
}

/// GLONASS code-phase biases (m)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlonassBiases {
    /// Observations are already aligned to the quarter cycle convention
    pub aligned: bool,
    pub l1_ca: Option<f64>,
    pub l1_p: Option<f64>,
    pub l2_ca: Option<f64>,
    pub l2_p: Option<f64>,
}

/// Everything known about the reference station.
///
/// Each message only replaces the fields it carries.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationRecord {
    pub station_id: u16,
    /// Marker name. RTCM 3 never carries it, see [DecodeContext::set_marker].
    pub marker_name: String,
    /// Marker number, caller supplied like the name
    pub marker_number: String,
    /// ITRF realization year
    pub itrf_year: u8,
    pub indicators: StationIndicators,
    /// Quarter cycle indicator, 2 bits
    pub quarter_cycle: u8,
    /// Antenna reference point, ECEF (m)
    pub position: [f64; 3],
    /// Antenna height above the marker (m)
    pub antenna_height: f64,
    pub antenna_descriptor: String,
    pub antenna_setup: u8,
    pub antenna_serial: String,
    pub receiver_type: String,
    pub receiver_firmware: String,
    pub receiver_serial: String,
    pub glonass_biases: GlonassBiases,
}

impl StationRecord {
    /// Antenna reference point as latitude, longitude (rad) and height (m)
    pub fn geodetic(&self) -> Geodetic {
        ecef_to_geodetic(self.position)
    }

    pub fn has_position(&self) -> bool {
        self.position.iter().any(|c| *c != 0.0)
    }
}

/// 1005, 1006
pub(crate) fn decode_position(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let with_height = reader.message_type() == 1006;
    reader.ensure(if with_height { 156 } else { 140 })?;
    let station_id = reader.u16(12)?;
    let itrf_year = reader.u8(6)?;
    let gnss = reader.u8(4)?;
    let x = reader.scaled(38, 1e-4)?;
    let oscillator = reader.flag()?;
    reader.skip(1)?;
    let y = reader.scaled(38, 1e-4)?;
    let quarter_cycle = reader.u8(2)?;
    let z = reader.scaled(38, 1e-4)?;
    let antenna_height = if with_height {
        Some(reader.scaled_unsigned(16, 1e-4)?)
    } else {
        None
    };

    ctx.check_station(station_id)?;

    // broadcast order is GPS, GLONASS, Galileo, reference station
    let mut indicators = StationIndicators::empty();
    for (bit, flag) in [
        (3, StationIndicators::GPS),
        (2, StationIndicators::GLONASS),
        (1, StationIndicators::GALILEO),
        (0, StationIndicators::REFERENCE_STATION),
    ] {
        if gnss & (1 << bit) != 0 {
            indicators |= flag;
        }
    }
    if oscillator {
        indicators |= StationIndicators::SINGLE_RECEIVER_OSCILLATOR;
    }

    let station = ctx.station_mut();
    station.station_id = station_id;
    station.itrf_year = itrf_year;
    station.indicators = indicators;
    station.quarter_cycle = quarter_cycle;
    station.position = [x, y, z];
    if let Some(height) = antenna_height {
        station.antenna_height = height;
    }
    Ok(DecodeEvent::Station)
}

/// 1007, 1008
pub(crate) fn decode_antenna(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let station_id = reader.u16(12)?;
    let descriptor = reader.counted_string()?;
    let setup = reader.u8(8)?;
    let serial = if reader.message_type() == 1008 {
        Some(reader.counted_string()?)
    } else {
        None
    };

    ctx.check_station(station_id)?;
    let station = ctx.station_mut();
    station.station_id = station_id;
    station.antenna_descriptor = descriptor;
    station.antenna_setup = setup;
    if let Some(serial) = serial {
        station.antenna_serial = serial;
    }
    Ok(DecodeEvent::Station)
}

/// 1033
pub(crate) fn decode_receiver(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let station_id = reader.u16(12)?;
    let descriptor = reader.counted_string()?;
    let setup = reader.u8(8)?;
    let antenna_serial = reader.counted_string()?;
    let receiver_type = reader.counted_string()?;
    let receiver_firmware = reader.counted_string()?;
    let receiver_serial = reader.counted_string()?;

    ctx.check_station(station_id)?;
    let station = ctx.station_mut();
    station.station_id = station_id;
    station.antenna_descriptor = descriptor;
    station.antenna_setup = setup;
    station.antenna_serial = antenna_serial;
    station.receiver_type = receiver_type;
    station.receiver_firmware = receiver_firmware;
    station.receiver_serial = receiver_serial;
    Ok(DecodeEvent::Station)
}

/// 1230
pub(crate) fn decode_glonass_biases(
    reader: &mut BitReader,
    ctx: &mut DecodeContext,
) -> Result<DecodeEvent, DecodeError> {
    let station_id = reader.u16(12)?;
    let aligned = reader.flag()?;
    reader.skip(3)?;
    let mask = reader.u8(4)?;
    let mut values = [None; 4];
    for (i, value) in values.iter_mut().enumerate() {
        if mask & (0x8 >> i) != 0 {
            *value = Some(reader.scaled(16, 0.02)?);
        }
    }

    ctx.check_station(station_id)?;
    let [l1_ca, l1_p, l2_ca, l2_p] = values;
    let station = ctx.station_mut();
    station.station_id = station_id;
    station.glonass_biases = GlonassBiases {
        aligned,
        l1_ca,
        l1_p,
        l2_ca,
        l2_p,
    };
    Ok(DecodeEvent::GlonassBiases)
}
