//! CRC-24Q (Qualcomm) as used by the RTCM 3 transport layer

use crate::{
    constants::{RTCM_CRC_LEN, RTCM_HEADER_LEN},
    error::DecodeError,
};

const CRC24Q_POLY: u32 = 0x0186_4cfb;
const CRC24Q_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut byte = 0;
    while byte < 256 {
        let mut crc = (byte as u32) << 16;
        let mut bit = 0;
        while bit < 8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC24Q_POLY;
            }
            bit += 1;
        }
        table[byte] = crc & 0x00ff_ffff;
        byte += 1;
    }
    table
}

/// Streaming CRC-24Q calculator, zero initial state
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Crc24qCalc {
    crc: u32,
}

impl Crc24qCalc {
    pub(crate) const fn new() -> Self {
        Self { crc: 0 }
    }

    pub(crate) const fn update(&mut self, bytes: &[u8]) {
        let mut i = 0;
        while i < bytes.len() {
            self.update_byte(bytes[i]);
            i += 1;
        }
    }

    pub(crate) const fn update_byte(&mut self, byte: u8) {
        let idx = ((self.crc >> 16) ^ byte as u32) & 0xff;
        self.crc = ((self.crc << 8) & 0x00ff_ffff) ^ CRC24Q_TABLE[idx as usize];
    }

    pub(crate) const fn result(self) -> u32 {
        self.crc
    }

    /// Compares against the big-endian 24-bit value found at the end of a frame
    pub(crate) fn validate_result(self, received: [u8; 3]) -> Result<(), DecodeError> {
        let expect = u32::from_be_bytes([0, received[0], received[1], received[2]]);
        let got = self.result();
        if expect == got {
            Ok(())
        } else {
            Err(DecodeError::InvalidCrc { expect, got })
        }
    }
}

/// CRC-24Q of `data`
pub const fn crc24q(data: &[u8]) -> u32 {
    let mut calc = Crc24qCalc::new();
    calc.update(data);
    calc.result()
}

/// Checks the trailing 24-bit CRC of a complete frame (header, payload and
/// CRC). Inputs too short to hold a header and a CRC are rejected, never
/// panicked on.
pub fn check_crc(frame: &[u8]) -> bool {
    validate_frame(frame).is_ok()
}

pub(crate) fn validate_frame(frame: &[u8]) -> Result<(), DecodeError> {
    if frame.len() < RTCM_HEADER_LEN + RTCM_CRC_LEN {
        return Err(DecodeError::Incomplete);
    }
    let (body, crc) = frame.split_at(frame.len() - RTCM_CRC_LEN);
    let mut calc = Crc24qCalc::new();
    calc.update(body);
    calc.validate_result([crc[0], crc[1], crc[2]])
}
