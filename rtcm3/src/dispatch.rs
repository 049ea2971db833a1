//! Message number to decoder routing.

use crate::{
    bits::BitReader,
    constants::{RTCM_CRC_LEN, RTCM_HEADER_LEN},
    context::DecodeContext,
    error::DecodeError,
    messages::{
        ephemeris, msm, observation, ssr, station, system, DecodeEvent, DecodedMessage,
    },
};

type DecodeFn = fn(&mut BitReader, &mut DecodeContext) -> Result<DecodeEvent, DecodeError>;

/// Message numbers `first..=last` are decoded by `decode`
struct Route {
    first: u16,
    last: u16,
    decode: DecodeFn,
}

const fn route(first: u16, last: u16, decode: DecodeFn) -> Route {
    Route {
        first,
        last,
        decode,
    }
}

/// Sorted by message number
static ROUTES: [Route; 18] = [
    route(1001, 1004, observation::decode_legacy),
    route(1005, 1006, station::decode_position),
    route(1007, 1008, station::decode_antenna),
    route(1009, 1012, observation::decode_legacy),
    route(1013, 1013, system::decode_system_parameters),
    route(1019, 1019, ephemeris::decode_gps),
    route(1020, 1020, ephemeris::decode_glonass),
    route(1029, 1029, system::decode_text),
    route(1033, 1033, station::decode_receiver),
    route(1041, 1041, ephemeris::decode_navic),
    route(1042, 1042, ephemeris::decode_beidou),
    route(1044, 1044, ephemeris::decode_qzss),
    route(1045, 1046, ephemeris::decode_galileo),
    route(1057, 1068, ssr::decode_ssr),
    route(1071, 1137, msm::decode_msm),
    route(1230, 1230, station::decode_glonass_biases),
    route(1240, 1263, ssr::decode_ssr),
    route(1265, 1270, ssr::decode_ssr),
];

fn find_route(message_type: u16) -> Option<&'static Route> {
    let idx = ROUTES.partition_point(|r| r.last < message_type);
    let route = ROUTES
        .get(idx)
        .filter(|r| (r.first..=r.last).contains(&message_type))?;
    // inside the MSM range only numbers ending in 1 to 7 are messages
    if route.first == 1071 && msm::msm_constellation(message_type).is_none() {
        return None;
    }
    Some(route)
}

/// True when a decoder exists for `message_type`
pub fn is_supported(message_type: u16) -> bool {
    find_route(message_type).is_some()
}

/// Decodes a CRC-checked frame (preamble to CRC inclusive).
pub(crate) fn decode_frame(
    frame: &[u8],
    ctx: &mut DecodeContext,
) -> Result<DecodedMessage, DecodeError> {
    let payload = &frame[RTCM_HEADER_LEN..frame.len() - RTCM_CRC_LEN];
    let mut reader = BitReader::new(payload)?;
    let message_type = reader.message_type();
    log::trace!("rtcm3 {message_type}: {} byte payload", payload.len());

    let result = match find_route(message_type) {
        Some(route) => (route.decode)(&mut reader, ctx),
        None => {
            // proprietary or unsupported, framed but not decoded
            log::trace!("rtcm3 {message_type}: not decoded");
            Ok(DecodeEvent::Ignored)
        },
    };
    let station_id = ctx.take_message_station();
    Ok(DecodedMessage {
        message_type,
        station_id,
        time: ctx.time(),
        event: result?,
    })
}
