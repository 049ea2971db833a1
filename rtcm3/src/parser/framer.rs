use crate::{
    constants::{RTCM_CRC_LEN, RTCM_HEADER_LEN, RTCM_LENGTH_MASK, RTCM_PREAMBLE},
    crc::validate_frame,
    error::DecodeError,
    parser::buffer::UnderlyingBuffer,
};

/// Where the synchronizer stands with respect to the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Looking for the preamble byte
    #[default]
    Seeking,
    /// Preamble and length read, waiting for the rest of the frame
    LengthKnown { frame_len: usize },
    /// A complete frame with a valid CRC sits at the start of the buffer
    FrameReady { frame_len: usize },
}

/// Outcome of [FrameSynchronizer::poll]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// A frame of this many bytes is ready, see [FrameSynchronizer::frame]
    Frame(usize),
    /// More bytes are needed
    NeedMore,
    /// A candidate frame was dropped, scanning resumed one byte later
    Rejected(DecodeError),
}

/// Splits a byte stream into CRC-checked RTCM3 frames.
///
/// Bytes are accumulated into the underlying buffer until a complete frame
/// is available. A CRC failure discards only the preamble byte of the
/// candidate, so a real frame hidden inside the rejected bytes is still
/// found.
#[derive(Debug, Clone)]
pub struct FrameSynchronizer<T: UnderlyingBuffer> {
    buf: T,
    state: SyncState,
}

impl<T: UnderlyingBuffer + Default> Default for FrameSynchronizer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: UnderlyingBuffer> FrameSynchronizer<T> {
    pub fn new(buf: T) -> Self {
        Self {
            buf,
            state: SyncState::Seeking,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn buffer_len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_buffer_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends stream bytes, returns how many fit into the buffer.
    pub fn fill(&mut self, bytes: &[u8]) -> usize {
        if self.state == SyncState::Seeking && self.buf.is_empty() {
            // nothing before a preamble is ever needed
            match bytes.iter().position(|b| *b == RTCM_PREAMBLE) {
                Some(pos) => {
                    if pos > 0 {
                        log::trace!("skipped {pos} bytes before preamble");
                    }
                    return pos + self.buf.append(&bytes[pos..]);
                },
                None => return bytes.len(),
            }
        }
        self.buf.append(bytes)
    }

    /// Advances the state machine as far as the buffered bytes allow.
    pub fn poll(&mut self) -> Poll {
        loop {
            match self.state {
                SyncState::Seeking => {
                    match self.buf.find_from(0, RTCM_PREAMBLE) {
                        Some(0) => {},
                        Some(pos) => {
                            log::trace!("skipped {pos} bytes before preamble");
                            self.buf.drain(pos);
                        },
                        None => {
                            self.buf.clear();
                            return Poll::NeedMore;
                        },
                    }
                    if self.buf.len() < RTCM_HEADER_LEN {
                        return Poll::NeedMore;
                    }
                    let payload_len = u16::from_be_bytes([self.buf[1], self.buf[2]]) & RTCM_LENGTH_MASK;
                    let frame_len = RTCM_HEADER_LEN + usize::from(payload_len) + RTCM_CRC_LEN;
                    if frame_len > self.buf.max_capacity() {
                        self.buf.drain(1);
                        return Poll::Rejected(DecodeError::OutOfMemory {
                            required_size: frame_len,
                        });
                    }
                    self.state = SyncState::LengthKnown { frame_len };
                },
                SyncState::LengthKnown { frame_len } => {
                    if self.buf.len() < frame_len {
                        return Poll::NeedMore;
                    }
                    if let Err(err) = validate_frame(&self.buf[0..frame_len]) {
                        log::warn!("dropping RTCM3 frame of {frame_len} bytes: {err}");
                        self.buf.drain(1);
                        self.state = SyncState::Seeking;
                        return Poll::Rejected(err);
                    }
                    self.state = SyncState::FrameReady { frame_len };
                },
                SyncState::FrameReady { frame_len } => return Poll::Frame(frame_len),
            }
        }
    }

    /// The ready frame, preamble to CRC inclusive
    pub fn frame(&self) -> Option<&[u8]> {
        match self.state {
            SyncState::FrameReady { frame_len } => Some(&self.buf[0..frame_len]),
            _ => None,
        }
    }

    /// Drops the ready frame from the buffer and starts seeking the next one.
    pub fn release(&mut self) {
        if let SyncState::FrameReady { frame_len } = self.state {
            self.buf.drain(frame_len);
            self.state = SyncState::Seeking;
        }
    }

    /// Forgets every buffered byte.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.state = SyncState::Seeking;
    }
}
