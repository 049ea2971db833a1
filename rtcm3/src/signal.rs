//! Observation signal codes, carrier frequencies and the fixed slot layout
//! of observation records.

use core::fmt;

use gnss_rs::prelude::Constellation;

use crate::constants::SPEED_OF_LIGHT;

/// Base carrier frequencies kept in fixed slots of an observation record
pub const MAX_FREQUENCIES: usize = 3;
/// Extra slots for additional signals sharing a base frequency
pub const MAX_EXTRA_SIGNALS: usize = 3;
/// Width of every per-signal array in an observation record
pub const SIGNAL_SLOTS: usize = MAX_FREQUENCIES + MAX_EXTRA_SIGNALS;

const FREQ_L1: f64 = 1.575_42e9;
const FREQ_L2: f64 = 1.227_60e9;
const FREQ_L5: f64 = 1.176_45e9;
const FREQ_E6: f64 = 1.278_75e9;
const FREQ_E5B: f64 = 1.207_14e9;
const FREQ_E5AB: f64 = 1.191_795e9;
const FREQ_S: f64 = 2.492_028e9;
const FREQ_G1: f64 = 1.602_00e9;
const FREQ_G1_STEP: f64 = 0.562_50e6;
const FREQ_G2: f64 = 1.246_00e9;
const FREQ_G2_STEP: f64 = 0.437_50e6;
const FREQ_G3: f64 = 1.202_025e9;
const FREQ_G1A: f64 = 1.600_995e9;
const FREQ_G2A: f64 = 1.248_06e9;
const FREQ_B1I: f64 = 1.561_098e9;
const FREQ_B3: f64 = 1.268_52e9;

/// Two-character observation code: frequency band digit and tracking
/// attribute, as in RINEX 3 (`1C`, `2W`, `5Q`...).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalCode([u8; 2]);

impl SignalCode {
    /// Builds a code from its two characters, `None` unless `code` is a
    /// digit followed by an upper case letter.
    pub const fn new(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        if bytes.len() == 2 && bytes[0].is_ascii_digit() && bytes[1].is_ascii_uppercase() {
            Some(Self([bytes[0], bytes[1]]))
        } else {
            None
        }
    }

    /// Frequency band number
    pub const fn band(&self) -> u8 {
        self.0[0] - b'0'
    }

    /// Tracking mode / channel attribute
    pub const fn attribute(&self) -> char {
        self.0[1] as char
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for SignalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Serialized as its two characters so that it can key JSON maps
#[cfg(feature = "serde")]
impl serde::Serialize for SignalCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SignalCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CodeVisitor;

        impl serde::de::Visitor<'_> for CodeVisitor {
            type Value = SignalCode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a two character observation code")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<SignalCode, E> {
                SignalCode::new(v).ok_or_else(|| E::invalid_value(serde::de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(CodeVisitor)
    }
}

impl fmt::Debug for SignalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalCode({})", self.as_str())
    }
}

const fn code(s: &str) -> Option<SignalCode> {
    SignalCode::new(s)
}

macro_rules! signal_table {
    ($($code:literal),* $(,)?) => {
        [$(code($code)),*]
    };
}

/// MSM signal mask bit (1-based) to observation code, per constellation
const MSM_GPS: [Option<SignalCode>; 32] = signal_table![
    "", "1C", "1P", "1W", "", "", "", "2C", "2P", "2W", "", "", "", "", "2S", "2L", "2X", "", "",
    "", "", "5I", "5Q", "5X", "", "", "", "", "", "1S", "1L", "1X",
];
const MSM_GLONASS: [Option<SignalCode>; 32] = signal_table![
    "", "1C", "1P", "", "", "", "", "2C", "2P", "", "", "", "", "", "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "", "", "",
];
const MSM_GALILEO: [Option<SignalCode>; 32] = signal_table![
    "", "1C", "1A", "1B", "1X", "1Z", "", "6C", "6A", "6B", "6X", "6Z", "", "7I", "7Q", "7X", "",
    "8I", "8Q", "8X", "", "5I", "5Q", "5X", "", "", "", "", "", "", "", "",
];
const MSM_SBAS: [Option<SignalCode>; 32] = signal_table![
    "", "1C", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "5I",
    "5Q", "5X", "", "", "", "", "", "", "", "",
];
const MSM_QZSS: [Option<SignalCode>; 32] = signal_table![
    "", "1C", "", "", "", "", "", "", "6S", "6L", "6X", "", "", "", "2S", "2L", "2X", "", "", "",
    "", "5I", "5Q", "5X", "", "", "", "", "", "1S", "1L", "1X",
];
const MSM_BEIDOU: [Option<SignalCode>; 32] = signal_table![
    "", "2I", "2Q", "2X", "", "", "", "6I", "6Q", "6X", "", "", "", "7I", "7Q", "7X", "", "", "",
    "", "", "5D", "5P", "5X", "7D", "", "", "", "", "1D", "1P", "1X",
];
const MSM_IRNSS: [Option<SignalCode>; 32] = signal_table![
    "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "5A", "",
    "", "", "", "", "", "", "", "", "",
];

/// Observation code of MSM signal mask bit `id` (1..=32)
pub fn msm_signal(constellation: Constellation, id: u8) -> Option<SignalCode> {
    let table = match constellation {
        Constellation::GPS => &MSM_GPS,
        Constellation::Glonass => &MSM_GLONASS,
        Constellation::Galileo => &MSM_GALILEO,
        Constellation::QZSS => &MSM_QZSS,
        Constellation::BeiDou => &MSM_BEIDOU,
        Constellation::IRNSS => &MSM_IRNSS,
        c if c.is_sbas() => &MSM_SBAS,
        _ => return None,
    };
    let idx = usize::from(id).checked_sub(1)?;
    table.get(idx).copied().flatten()
}

/// SSR bias signal identifiers, per constellation
const BIAS_GPS: [Option<SignalCode>; 20] = signal_table![
    "1C", "1P", "1W", "1Y", "1M", "2C", "2D", "2S", "2L", "2X", "2P", "2W", "2Y", "2M", "5I", "5Q",
    "5X", "1S", "1L", "1X",
];
const BIAS_GLONASS: [Option<SignalCode>; 13] = signal_table![
    "1C", "1P", "2C", "2P", "4A", "4B", "4X", "6A", "6B", "6X", "3I", "3Q", "3X",
];
const BIAS_GALILEO: [Option<SignalCode>; 19] = signal_table![
    "1A", "1B", "1C", "1X", "1Z", "5I", "5Q", "5X", "7I", "7Q", "7X", "8I", "8Q", "8X", "6A", "6B",
    "6C", "6X", "6Z",
];
const BIAS_QZSS: [Option<SignalCode>; 19] = signal_table![
    "1C", "1S", "1L", "2S", "2L", "2X", "5I", "5Q", "5X", "6S", "6L", "6X", "1X", "1Z", "5D", "5P",
    "5Z", "6E", "6Z",
];
const BIAS_BEIDOU: [Option<SignalCode>; 17] = signal_table![
    "2I", "2Q", "2X", "6I", "6Q", "6X", "7I", "7Q", "7X", "1D", "1P", "1X", "5D", "5P", "5X", "1A",
    "6A",
];
const BIAS_SBAS: [Option<SignalCode>; 4] = signal_table!["1C", "5I", "5Q", "5X"];

/// Observation code of SSR signal and tracking mode identifier `id`
pub fn ssr_signal(constellation: Constellation, id: u8) -> Option<SignalCode> {
    let table: &[Option<SignalCode>] = match constellation {
        Constellation::GPS => &BIAS_GPS,
        Constellation::Glonass => &BIAS_GLONASS,
        Constellation::Galileo => &BIAS_GALILEO,
        Constellation::QZSS => &BIAS_QZSS,
        Constellation::BeiDou => &BIAS_BEIDOU,
        c if c.is_sbas() => &BIAS_SBAS,
        _ => return None,
    };
    table.get(usize::from(id)).copied().flatten()
}

/// Frequency index of a code: 0..MAX_FREQUENCIES are the base slots,
/// larger values are bands only ever stored in extra slots.
fn frequency_index(constellation: Constellation, code: SignalCode) -> Option<usize> {
    let band = code.band();
    let idx = match constellation {
        Constellation::GPS => match band {
            1 => 0,
            2 => 1,
            5 => 2,
            _ => return None,
        },
        Constellation::Glonass => match band {
            1 | 4 => 0,
            2 | 6 => 1,
            3 => 2,
            _ => return None,
        },
        Constellation::Galileo => match band {
            1 => 0,
            7 => 1,
            5 => 2,
            6 => 3,
            8 => 4,
            _ => return None,
        },
        Constellation::QZSS => match band {
            1 => 0,
            2 => 1,
            5 => 2,
            6 => 3,
            _ => return None,
        },
        Constellation::BeiDou => match band {
            2 => 0,
            7 => 1,
            6 => 2,
            1 => 3,
            5 => 4,
            8 => 5,
            _ => return None,
        },
        Constellation::IRNSS => match band {
            5 => 0,
            9 => 1,
            _ => return None,
        },
        c if c.is_sbas() => match band {
            1 => 0,
            5 => 1,
            _ => return None,
        },
        _ => return None,
    };
    Some(idx)
}

/// Tracking attributes per band, most preferred first
fn preference(constellation: Constellation, band: u8) -> &'static str {
    match (constellation, band) {
        (Constellation::GPS, 1) => "CPYWMNSLX",
        (Constellation::GPS, 2) => "CDSLXPYWMN",
        (Constellation::GPS, 5) => "IQX",
        (Constellation::Glonass, 1 | 2) => "CP",
        (Constellation::Glonass, 3) => "IQX",
        (Constellation::Glonass, 4 | 6) => "ABX",
        (Constellation::Galileo, 1) => "CABXZ",
        (Constellation::Galileo, 6) => "ABCXZ",
        (Constellation::Galileo, 5 | 7 | 8) => "IQX",
        (Constellation::QZSS, 1) => "CLSXZB",
        (Constellation::QZSS, 2) => "LSX",
        (Constellation::QZSS, 5) => "IQXDPZ",
        (Constellation::QZSS, 6) => "LSXEZ",
        (Constellation::BeiDou, 2) => "IQX",
        (Constellation::BeiDou, 6 | 7) => "IQXDPZ",
        (Constellation::BeiDou, 1) => "DPXAN",
        (Constellation::BeiDou, 5 | 8) => "DPX",
        (Constellation::IRNSS, 5 | 9) => "ABCX",
        (c, 1) if c.is_sbas() => "C",
        (c, 5) if c.is_sbas() => "IQX",
        _ => "",
    }
}

fn priority(constellation: Constellation, code: SignalCode) -> usize {
    let preferred = preference(constellation, code.band());
    preferred
        .find(code.attribute())
        .unwrap_or(preferred.len())
}

/// Assigns record slots to the signals of one message.
///
/// Each base frequency slot goes to its most preferred signal; any other
/// signal takes the next free extra slot. Signals left without a slot map
/// to `None`.
pub fn assign_slots(
    constellation: Constellation,
    codes: &[Option<SignalCode>],
) -> Vec<Option<usize>> {
    let mut slots = vec![None; codes.len()];
    let mut used = [false; SIGNAL_SLOTS];

    let mut order: Vec<(usize, usize, usize)> = codes
        .iter()
        .enumerate()
        .filter_map(|(k, c)| {
            let c = (*c)?;
            let idx = frequency_index(constellation, c)?;
            Some((idx, priority(constellation, c), k))
        })
        .collect();
    order.sort_unstable();

    let mut overflow = Vec::new();
    for (idx, _, k) in order {
        if idx < MAX_FREQUENCIES && !used[idx] {
            used[idx] = true;
            slots[k] = Some(idx);
        } else {
            overflow.push(k);
        }
    }
    for k in overflow {
        if let Some(free) = (MAX_FREQUENCIES..SIGNAL_SLOTS).find(|&s| !used[s]) {
            used[free] = true;
            slots[k] = Some(free);
        }
    }
    slots
}

/// Carrier frequency (Hz) of `code`. GLONASS FDMA bands need the frequency
/// channel number.
pub fn carrier_frequency(
    constellation: Constellation,
    code: SignalCode,
    channel: Option<i8>,
) -> Option<f64> {
    let band = code.band();
    let freq = match constellation {
        Constellation::GPS => match band {
            1 => FREQ_L1,
            2 => FREQ_L2,
            5 => FREQ_L5,
            _ => return None,
        },
        Constellation::Glonass => match band {
            1 => FREQ_G1 + FREQ_G1_STEP * f64::from(channel?),
            2 => FREQ_G2 + FREQ_G2_STEP * f64::from(channel?),
            3 => FREQ_G3,
            4 => FREQ_G1A,
            6 => FREQ_G2A,
            _ => return None,
        },
        Constellation::Galileo => match band {
            1 => FREQ_L1,
            5 => FREQ_L5,
            6 => FREQ_E6,
            7 => FREQ_E5B,
            8 => FREQ_E5AB,
            _ => return None,
        },
        Constellation::QZSS => match band {
            1 => FREQ_L1,
            2 => FREQ_L2,
            5 => FREQ_L5,
            6 => FREQ_E6,
            _ => return None,
        },
        Constellation::BeiDou => match band {
            1 => FREQ_L1,
            2 => FREQ_B1I,
            5 => FREQ_L5,
            6 => FREQ_B3,
            7 => FREQ_E5B,
            8 => FREQ_E5AB,
            _ => return None,
        },
        Constellation::IRNSS => match band {
            5 => FREQ_L5,
            9 => FREQ_S,
            _ => return None,
        },
        c if c.is_sbas() => match band {
            1 => FREQ_L1,
            5 => FREQ_L5,
            _ => return None,
        },
        _ => return None,
    };
    Some(freq)
}

/// Wavelength (m) of `code`, see [carrier_frequency]
pub fn wavelength(constellation: Constellation, code: SignalCode, channel: Option<i8>) -> Option<f64> {
    carrier_frequency(constellation, code, channel).map(|f| SPEED_OF_LIGHT / f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sc(s: &str) -> SignalCode {
        SignalCode::new(s).unwrap()
    }

    #[test]
    fn code_parts() {
        let c = sc("5Q");
        assert_eq!(c.band(), 5);
        assert_eq!(c.attribute(), 'Q');
        assert_eq!(c.to_string(), "5Q");
        assert_eq!(SignalCode::new(""), None);
        assert_eq!(SignalCode::new("Q5"), None);
    }

    #[test]
    fn msm_tables() {
        assert_eq!(msm_signal(Constellation::GPS, 2), Some(sc("1C")));
        assert_eq!(msm_signal(Constellation::GPS, 16), Some(sc("2L")));
        assert_eq!(msm_signal(Constellation::GPS, 1), None);
        assert_eq!(msm_signal(Constellation::GPS, 0), None);
        assert_eq!(msm_signal(Constellation::GPS, 33), None);
        assert_eq!(msm_signal(Constellation::Galileo, 15), Some(sc("7Q")));
        assert_eq!(msm_signal(Constellation::BeiDou, 2), Some(sc("2I")));
        assert_eq!(msm_signal(Constellation::SBAS, 2), Some(sc("1C")));
        assert_eq!(msm_signal(Constellation::IRNSS, 22), Some(sc("5A")));
    }

    #[test]
    fn bias_tables() {
        assert_eq!(ssr_signal(Constellation::GPS, 0), Some(sc("1C")));
        assert_eq!(ssr_signal(Constellation::GPS, 11), Some(sc("2W")));
        assert_eq!(ssr_signal(Constellation::GPS, 20), None);
        assert_eq!(ssr_signal(Constellation::Galileo, 2), Some(sc("1C")));
    }

    #[test]
    fn base_slots_follow_frequency() {
        let codes = [Some(sc("1C")), Some(sc("2W")), Some(sc("5Q"))];
        assert_eq!(
            assign_slots(Constellation::GPS, &codes),
            vec![Some(0), Some(1), Some(2)]
        );
    }

    #[test]
    fn second_signal_on_a_band_goes_to_extra_slot() {
        // L2C (L) ranks above semi-codeless P(Y) (W)
        let codes = [Some(sc("1C")), Some(sc("2W")), Some(sc("2L")), None];
        let slots = assign_slots(Constellation::GPS, &codes);
        assert_eq!(slots[0], Some(0));
        assert_eq!(slots[2], Some(1));
        assert_eq!(slots[1], Some(MAX_FREQUENCIES));
        assert_eq!(slots[3], None);
    }

    #[test]
    fn extra_bands_use_extra_slots() {
        let codes = [Some(sc("1C")), Some(sc("6C")), Some(sc("7Q")), Some(sc("8Q"))];
        let slots = assign_slots(Constellation::Galileo, &codes);
        assert_eq!(slots, vec![Some(0), Some(3), Some(1), Some(4)]);
    }

    #[test]
    fn slots_run_out() {
        let codes: Vec<_> = ["1C", "1P", "1W", "1S", "1L", "1X", "2C", "2W"]
            .iter()
            .map(|c| SignalCode::new(c))
            .collect();
        let slots = assign_slots(Constellation::GPS, &codes);
        // no L5 signal, so base slot 2 stays free
        assert_eq!(slots.iter().filter(|s| s.is_some()).count(), SIGNAL_SLOTS - 1);
        assert_eq!(slots[0], Some(0));
        assert_eq!(slots[6], Some(1));
    }

    #[test]
    fn glonass_needs_channel() {
        assert_eq!(carrier_frequency(Constellation::Glonass, sc("1C"), None), None);
        let f = carrier_frequency(Constellation::Glonass, sc("1C"), Some(-7)).unwrap();
        assert!((f - (1.602e9 - 7.0 * 0.5625e6)).abs() < 1e-3);
        assert!(carrier_frequency(Constellation::Glonass, sc("3Q"), None).is_some());
    }

    #[test]
    fn gps_wavelength() {
        let l1 = wavelength(Constellation::GPS, sc("1C"), None).unwrap();
        assert!((l1 - 0.190_293_672_798_365).abs() < 1e-12);
    }
}
