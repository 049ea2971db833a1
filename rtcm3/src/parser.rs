mod buffer;
mod framer;

pub use buffer::{FixedBuffer, UnderlyingBuffer};
pub use framer::{FrameSynchronizer, Poll, SyncState};

use crate::{
    context::DecodeContext,
    dispatch,
    error::DecodeError,
    messages::DecodedMessage,
    options::{DecoderOptions, EphemerisPolicy},
    time::GpsTime,
};

/// Streaming RTCM 3 decoder.
///
/// Feed it bytes in arrival order, in chunks of any size, with
/// [Decoder::consume]; every complete frame is decoded into the
/// [DecodeContext] and reported through the returned iterator. The default
/// constructor uses a growing `Vec<u8>`; see [DecoderBuilder] for a fixed
/// buffer.
#[derive(Debug, Clone)]
pub struct Decoder<T: UnderlyingBuffer = Vec<u8>> {
    framer: FrameSynchronizer<T>,
    context: DecodeContext,
}

impl Default for Decoder<Vec<u8>> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Decoder<Vec<u8>> {
    pub fn with_options(options: DecoderOptions) -> Self {
        DecoderBuilder::new().options(options).build()
    }
}

impl<T: UnderlyingBuffer> Decoder<T> {
    /// Decoder with default options over `buf`
    pub fn new(buf: T) -> Self {
        Self::from_parts(buf, DecoderOptions::default())
    }

    fn from_parts(buf: T, options: DecoderOptions) -> Self {
        Self {
            framer: FrameSynchronizer::new(buf),
            context: DecodeContext::new(options),
        }
    }

    /// Appends `bytes` to the stream and iterates over the frames they
    /// complete. Bytes not yet part of a complete frame are kept for the
    /// next call, even when the iterator is dropped early.
    pub fn consume<'a>(&'a mut self, bytes: &'a [u8]) -> DecodeIter<'a, T> {
        DecodeIter {
            decoder: self,
            pending: bytes,
        }
    }

    /// Decodes every frame completed by `bytes` and returns the outcome of
    /// the last one, or [DecodeError::Incomplete] when no frame completed.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<DecodedMessage, DecodeError> {
        let mut last = Err(DecodeError::Incomplete);
        let mut it = self.consume(bytes);
        while let Some(result) = it.next() {
            last = result;
        }
        last
    }

    /// Byte at a time form of [Decoder::decode]
    pub fn input_byte(&mut self, byte: u8) -> Result<DecodedMessage, DecodeError> {
        self.decode(&[byte])
    }

    pub fn context(&self) -> &DecodeContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut DecodeContext {
        &mut self.context
    }

    pub fn sync_state(&self) -> SyncState {
        self.framer.state()
    }

    pub fn buffer_len(&self) -> usize {
        self.framer.buffer_len()
    }

    pub fn is_buffer_empty(&self) -> bool {
        self.framer.is_buffer_empty()
    }

    /// Drops buffered bytes and all decoded state, keeping the options
    pub fn reset(&mut self) {
        self.framer.clear();
        self.context.reset();
    }
}

/// Iterator over the frames completed by one [Decoder::consume] call
pub struct DecodeIter<'a, T: UnderlyingBuffer> {
    decoder: &'a mut Decoder<T>,
    pending: &'a [u8],
}

impl<T: UnderlyingBuffer> DecodeIter<'_, T> {
    #[allow(clippy::should_implement_trait)]
    /// Analog of `core::iter::Iterator::next`. `None` means more bytes are
    /// needed.
    pub fn next(&mut self) -> Option<Result<DecodedMessage, DecodeError>> {
        let Decoder { framer, context } = &mut *self.decoder;
        loop {
            match framer.poll() {
                Poll::Frame(_) => {
                    let result = match framer.frame() {
                        Some(frame) => dispatch::decode_frame(frame, context),
                        None => Err(DecodeError::Incomplete),
                    };
                    framer.release();
                    return Some(result);
                },
                Poll::Rejected(err) => return Some(Err(err)),
                Poll::NeedMore => {
                    if self.pending.is_empty() {
                        return None;
                    }
                    let taken = framer.fill(self.pending);
                    if taken == 0 {
                        // buffer full without a frame boundary
                        let required_size = framer.buffer_len() + self.pending.len();
                        framer.clear();
                        return Some(Err(DecodeError::OutOfMemory { required_size }));
                    }
                    self.pending = &self.pending[taken..];
                },
            }
        }
    }
}

impl<T: UnderlyingBuffer> Drop for DecodeIter<'_, T> {
    fn drop(&mut self) {
        let taken = self.decoder.framer.fill(self.pending);
        if taken < self.pending.len() {
            log::warn!(
                "{} bytes dropped, decoder buffer full",
                self.pending.len() - taken
            );
        }
    }
}

/// Builds a [Decoder]
///
/// ```
/// use rtcm3::{DecoderBuilder, EphemerisPolicy};
///
/// let decoder = DecoderBuilder::new()
///     .station_id(2003)
///     .ephemeris_policy(EphemerisPolicy::AcceptAll)
///     .with_fixed_buffer::<1029>();
/// assert!(decoder.is_buffer_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DecoderBuilder {
    options: DecoderOptions,
}

impl DecoderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only messages of this reference station
    pub fn station_id(mut self, station_id: u16) -> Self {
        self.options.station_id = Some(station_id);
        self
    }

    pub fn ephemeris_policy(mut self, policy: EphemerisPolicy) -> Self {
        self.options.ephemeris_policy = policy;
        self
    }

    /// Coarse current time used to resolve truncated times
    pub fn reference_time(mut self, time: GpsTime) -> Self {
        self.options.reference_time = Some(time);
        self
    }

    pub fn max_observations(mut self, max: usize) -> Self {
        self.options.max_observations = max;
        self
    }

    /// Replaces every option at once
    pub fn options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Decoder<Vec<u8>> {
        self.build_with_buffer(Vec::new())
    }

    pub fn build_with_buffer<T: UnderlyingBuffer>(self, buf: T) -> Decoder<T> {
        Decoder::from_parts(buf, self.options)
    }

    pub fn with_fixed_buffer<const N: usize>(self) -> Decoder<FixedBuffer<N>> {
        self.build_with_buffer(FixedBuffer::new())
    }
}
