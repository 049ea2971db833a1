use core::str::FromStr;

use crate::{constants::MAX_OBSERVATIONS, error::OptionsError, time::GpsTime};

/// What to do with an ephemeris whose issue of data is already stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EphemerisPolicy {
    /// Keep the stored set and report the message as unchanged
    #[default]
    KeepExisting,
    /// Always store the newly received set
    AcceptAll,
}

/// Decoder configuration.
///
/// Also parses the classic option string form, whitespace separated:
/// `-EPHALL` selects [EphemerisPolicy::AcceptAll], `-STA=<id>` restricts
/// decoding to one reference station. Unknown options are ignored.
///
/// ```
/// use rtcm3::{DecoderOptions, EphemerisPolicy};
///
/// let opts: DecoderOptions = "-EPHALL -STA=12".parse().unwrap();
/// assert_eq!(opts.station_id, Some(12));
/// assert_eq!(opts.ephemeris_policy, EphemerisPolicy::AcceptAll);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoderOptions {
    /// Only accept messages from this reference station
    pub station_id: Option<u16>,
    pub ephemeris_policy: EphemerisPolicy,
    /// Coarse current time, used to expand truncated week numbers and times
    /// of day. The system clock is used when unset (with the `std` feature).
    pub reference_time: Option<GpsTime>,
    /// Maximum number of satellites in one observation batch
    pub max_observations: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            station_id: None,
            ephemeris_policy: EphemerisPolicy::default(),
            reference_time: None,
            max_observations: MAX_OBSERVATIONS,
        }
    }
}

impl FromStr for DecoderOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut opts = Self::default();
        for token in s.split_whitespace() {
            if token == "-EPHALL" {
                opts.ephemeris_policy = EphemerisPolicy::AcceptAll;
            } else if let Some(id) = token.strip_prefix("-STA=") {
                let id = id
                    .parse::<u16>()
                    .map_err(|_| OptionsError::InvalidStationId(token.to_string()))?;
                opts.station_id = Some(id);
            } else {
                log::debug!("ignoring decoder option {token}");
            }
        }
        Ok(opts)
    }
}
