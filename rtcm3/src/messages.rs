//! Decoded message records and the per-type decoders.

pub mod ephemeris;
pub mod msm;
pub mod observation;
pub mod ssr;
pub mod station;
pub mod system;

use gnss_rs::prelude::SV;

use crate::{
    messages::{ephemeris::NavSource, observation::ObservationBatch, ssr::SsrKind},
    time::GpsTime,
};

/// Result of decoding one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub message_type: u16,
    /// Reference station carried by the message, when it has one
    pub station_id: Option<u16>,
    /// Decoder time after the message was applied
    pub time: GpsTime,
    pub event: DecodeEvent,
}

/// What a frame changed in the [crate::DecodeContext]
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// Observations were added to the current epoch. `completed` holds the
    /// batches finalized by this message, oldest first: a batch is
    /// finalized when an epoch with a different time starts or when the
    /// last message of an epoch (multiple message flag clear) arrives.
    Observation { completed: Vec<ObservationBatch> },
    /// A Keplerian ephemeris was decoded. `stored` is false when an
    /// ephemeris with the same issue of data was already known.
    Ephemeris {
        satellite: SV,
        source: NavSource,
        stored: bool,
    },
    /// A GLONASS ephemeris was decoded, see [DecodeEvent::Ephemeris]
    GlonassEphemeris { satellite: SV, stored: bool },
    /// Station description, position or antenna record updated
    Station,
    /// SSR corrections of `satellites` satellites updated
    Ssr { kind: SsrKind, satellites: usize },
    /// Text message (1029)
    Text,
    /// System parameters (1013)
    SystemParameters,
    /// GLONASS code-phase biases (1230)
    GlonassBiases,
    /// Valid frame of a type this crate does not decode, or an MSM1-3
    /// message of which only the header is read
    Ignored,
}

impl DecodeEvent {
    /// True when at least one observation batch was finalized
    pub fn has_completed_epoch(&self) -> bool {
        matches!(self, Self::Observation { completed } if !completed.is_empty())
    }
}
