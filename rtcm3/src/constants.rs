pub const RTCM_PREAMBLE: u8 = 0xd3;
pub const RTCM_HEADER_LEN: usize = 3; // preamble (1) + reserved/length (2)
pub const RTCM_CRC_LEN: usize = 3;
pub(crate) const RTCM_LENGTH_MASK: u16 = 0x03ff; // 10 bits for length (6 bits reserved)
pub const MAX_PAYLOAD_LEN: usize = 1023;
pub const MAX_FRAME_LEN: usize = RTCM_HEADER_LEN + MAX_PAYLOAD_LEN + RTCM_CRC_LEN;

/// Speed of light (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// GPS semi-circle to radian, exactly as the ICD defines pi
pub(crate) const SC2RAD: f64 = 3.141_592_653_589_8;
/// One light-millisecond (m)
pub(crate) const RANGE_MS: f64 = SPEED_OF_LIGHT * 0.001;
/// Legacy GPS pseudorange ambiguity unit (m)
pub(crate) const PRUNIT_GPS: f64 = 299_792.458;
/// Legacy GLONASS pseudorange ambiguity unit (m)
pub(crate) const PRUNIT_GLO: f64 = 599_584.916;

/// Default observation batch capacity
pub const MAX_OBSERVATIONS: usize = 96;

pub(crate) const P2_5: f64 = 1.0 / 32.0;
pub(crate) const P2_6: f64 = 1.0 / 64.0;
pub(crate) const P2_10: f64 = 1.0 / 1024.0;
pub(crate) const P2_11: f64 = 1.0 / 2048.0;
pub(crate) const P2_19: f64 = 1.0 / (1u64 << 19) as f64;
pub(crate) const P2_20: f64 = 1.0 / (1u64 << 20) as f64;
pub(crate) const P2_24: f64 = 1.0 / (1u64 << 24) as f64;
pub(crate) const P2_28: f64 = 1.0 / (1u64 << 28) as f64;
pub(crate) const P2_29: f64 = 1.0 / (1u64 << 29) as f64;
pub(crate) const P2_30: f64 = 1.0 / (1u64 << 30) as f64;
pub(crate) const P2_31: f64 = 1.0 / (1u64 << 31) as f64;
pub(crate) const P2_32: f64 = 1.0 / (1u64 << 32) as f64;
pub(crate) const P2_33: f64 = 1.0 / (1u64 << 33) as f64;
pub(crate) const P2_34: f64 = 1.0 / (1u64 << 34) as f64;
pub(crate) const P2_40: f64 = 1.0 / (1u64 << 40) as f64;
pub(crate) const P2_41: f64 = 1.0 / (1u64 << 41) as f64;
pub(crate) const P2_43: f64 = 1.0 / (1u64 << 43) as f64;
pub(crate) const P2_46: f64 = 1.0 / (1u64 << 46) as f64;
pub(crate) const P2_50: f64 = 1.0 / (1u64 << 50) as f64;
pub(crate) const P2_55: f64 = 1.0 / (1u64 << 55) as f64;
pub(crate) const P2_59: f64 = 1.0 / (1u64 << 59) as f64;
pub(crate) const P2_66: f64 = P2_33 * P2_33;
