use thiserror::Error;

/// Coarse classification of a [DecodeError], the way callers usually need
/// to branch on it: retry with more bytes, count a corrupt frame, or report
/// a decoder/protocol mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// More bytes are needed, nothing is wrong with the data seen so far
    Incomplete,
    /// A frame failed its CRC24Q check and was skipped
    Crc,
    /// A frame passed its CRC but its content is not acceptable
    InvalidData,
}

/// Error that possible during RTCM 3 stream decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("incomplete frame, more data needed")]
    Incomplete,

    #[error("invalid frame CRC, expect {expect:06x}, got {got:06x}")]
    InvalidCrc { expect: u32, got: u32 },

    #[error("invalid message {message_type} length, need {expect} bits, got {got}")]
    InvalidLength {
        message_type: u16,
        expect: usize,
        got: usize,
    },

    #[error("invalid field {field} of message {message_type}")]
    InvalidField {
        message_type: u16,
        field: &'static str,
    },

    #[error("unexpected station id {got}, expect {expect}")]
    StationMismatch { expect: u16, got: u16 },

    #[error("frame of {required_size} bytes does not fit in the buffer")]
    OutOfMemory { required_size: usize },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Incomplete => ErrorKind::Incomplete,
            DecodeError::InvalidCrc { .. } => ErrorKind::Crc,
            DecodeError::InvalidLength { .. }
            | DecodeError::InvalidField { .. }
            | DecodeError::StationMismatch { .. }
            | DecodeError::OutOfMemory { .. } => ErrorKind::InvalidData,
        }
    }

    /// Returns true when the caller should simply supply more bytes
    pub fn is_incomplete(&self) -> bool {
        self.kind() == ErrorKind::Incomplete
    }
}

/// Error returned when parsing a [crate::DecoderOptions] string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("invalid station id in option {0:?}")]
    InvalidStationId(String),
}
