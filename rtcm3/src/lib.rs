//! # rtcm3
//!
//! A pure-rust decoder for RTCM 3 streams: observations (legacy RTK and
//! MSM4-7), broadcast ephemerides, reference station descriptions and
//! state space corrections, as sent by reference stations and NTRIP
//! casters.
//!
//! Decoding a stream
//! =================
//!
//! Bytes are fed to a [Decoder] in arrival order, in chunks of any size.
//! The decoder keeps an internal buffer, so a frame split across several
//! reads is decoded once its last byte arrives. Each decoded frame updates
//! the [DecodeContext] and is reported as a [DecodedMessage]:
//! ```
//! use rtcm3::{DecodeEvent, Decoder};
//!
//! // 1005, reference station 2003
//! let frame = [
//!     0xd3, 0x00, 0x13, 0x3e, 0xd7, 0xd3, 0x02, 0x02, 0x98, 0x0e, 0xde, 0xef, 0x34, 0xb4, 0xbd,
//!     0x62, 0xac, 0x09, 0x41, 0x98, 0x6f, 0x33, 0x36, 0x0b, 0x98,
//! ];
//!
//! let mut decoder = Decoder::default();
//! let mut it = decoder.consume(&frame);
//! loop {
//!     match it.next() {
//!         Some(Ok(msg)) => {
//!             assert_eq!(msg.message_type, 1005);
//!             assert_eq!(msg.event, DecodeEvent::Station);
//!         },
//!         Some(Err(e)) => {
//!             // CRC failure or invalid content, decoding goes on
//!             println!("{e}");
//!         },
//!         None => {
//!             // More bytes needed
//!             break;
//!         },
//!     }
//! }
//! drop(it);
//!
//! let station = decoder.context().station();
//! assert_eq!(station.station_id, 2003);
//! assert!((station.position[0] - 1_114_104.5999).abs() < 1e-3);
//! ```
//!
//! Observation epochs
//! ==================
//!
//! One epoch is usually spread over several messages (one per
//! constellation). Observations accumulate in
//! [DecodeContext::observations] and the finished [ObservationBatch] is
//! returned in [DecodeEvent::Observation] once the epoch is complete.
//!
//! Fixed buffers
//! =============
//!
//! [DecoderBuilder::with_fixed_buffer] builds a decoder that never
//! reallocates its frame buffer. Frames larger than the buffer are
//! reported as [DecodeError::OutOfMemory] and skipped.

mod bits;
mod constants;
mod context;
mod crc;
mod dispatch;
mod error;
mod geodesy;
mod messages;
mod options;
mod parser;
mod satellite;
mod signal;
mod time;

pub use gnss_rs::prelude::{Constellation, SV};

pub use crate::{
    bits::{read_scaled, read_sign_magnitude, read_signed, read_unsigned},
    constants::{MAX_FRAME_LEN, MAX_OBSERVATIONS, MAX_PAYLOAD_LEN, RTCM_PREAMBLE, SPEED_OF_LIGHT},
    context::{DecodeContext, DgpsCorrection},
    crc::{check_crc, crc24q},
    dispatch::is_supported,
    error::{DecodeError, ErrorKind, OptionsError},
    geodesy::{ecef_to_geodetic, ecef_to_lla, Geodetic, WGS84_FLATTENING, WGS84_SEMI_MAJOR_AXIS},
    messages::{
        ephemeris::{
            EphemerisHistory, GlonassEphemeris, IssueOfData, KeplerEphemeris, NavSource,
            EPHEMERIS_GENERATIONS,
        },
        msm::msm_constellation,
        observation::{
            LliFlags, ObservationBatch, ObservationRecord, SignalObservation, SNR_UNIT,
        },
        ssr::{
            ssr_message, ClockCorrection, CodeBiases, HighRateClock, OrbitCorrection, PhaseBias,
            PhaseBiases, SsrCorrection, SsrEpoch, SsrKind, UraCorrection,
        },
        station::{GlonassBiases, StationIndicators, StationRecord},
        system::{AnnouncedMessage, SystemParameters, TextMessage},
        DecodeEvent, DecodedMessage,
    },
    options::{DecoderOptions, EphemerisPolicy},
    parser::{
        DecodeIter, Decoder, DecoderBuilder, FixedBuffer, FrameSynchronizer, Poll, SyncState,
        UnderlyingBuffer,
    },
    satellite::{prn, satellite},
    signal::{
        assign_slots, carrier_frequency, msm_signal, ssr_signal, wavelength, SignalCode,
        MAX_EXTRA_SIGNALS, MAX_FREQUENCIES, SIGNAL_SLOTS,
    },
    time::GpsTime,
};
