use core::cmp::min;

/// Storage the frame synchronizer accumulates stream bytes into.
///
/// Implemented for `Vec<u8>` (grows as needed) and [FixedBuffer] (capacity
/// known at compile time, no allocation). A custom store only has to keep
/// the bytes contiguous and in arrival order.
///
/// Indexing only reaches stored bytes; anything at or past
/// [UnderlyingBuffer::len] panics like a slice would.
pub trait UnderlyingBuffer:
    core::ops::Index<core::ops::Range<usize>, Output = [u8]> + core::ops::Index<usize, Output = u8>
{
    /// Removes every stored byte.
    fn clear(&mut self);

    /// Number of bytes currently stored.
    fn len(&self) -> usize;

    /// Upper bound on [UnderlyingBuffer::len]. A buffer must be able to hold
    /// at least one complete frame ([crate::MAX_FRAME_LEN] bytes) to decode
    /// every message.
    fn max_capacity(&self) -> usize;

    /// Appends as much of `bytes` as fits and returns how many were taken.
    fn append(&mut self, bytes: &[u8]) -> usize;

    /// Removes the first `count` bytes. Draining more than
    /// [UnderlyingBuffer::len] empties the buffer.
    fn drain(&mut self, count: usize);

    /// Index of the first `value` at or after `start`.
    fn find_from(&self, start: usize, value: u8) -> Option<usize> {
        (start..self.len()).find(|&i| self[i] == value)
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Space left before [UnderlyingBuffer::max_capacity] is reached.
    fn free_space(&self) -> usize {
        self.max_capacity().saturating_sub(self.len())
    }
}

impl UnderlyingBuffer for Vec<u8> {
    fn clear(&mut self) {
        self.clear();
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn max_capacity(&self) -> usize {
        usize::MAX
    }

    fn append(&mut self, bytes: &[u8]) -> usize {
        self.extend_from_slice(bytes);
        bytes.len()
    }

    fn drain(&mut self, count: usize) {
        let count = min(count, self.len());
        self.drain(0..count);
    }

    fn find_from(&self, start: usize, value: u8) -> Option<usize> {
        self.get(start..)?
            .iter()
            .position(|b| *b == value)
            .map(|i| i + start)
    }
}

/// Owned buffer backed by a `[u8; N]` array.
///
/// `N` should be at least [crate::MAX_FRAME_LEN]; smaller buffers only
/// decode frames that fit and report the rest as out of memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedBuffer<const N: usize> {
    buffer: [u8; N],
    len: usize,
}

impl<const N: usize> FixedBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            len: 0,
        }
    }

    fn stored(&self) -> &[u8] {
        &self.buffer[..self.len]
    }
}

impl<const N: usize> Default for FixedBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::ops::Index<core::ops::Range<usize>> for FixedBuffer<N> {
    type Output = [u8];

    fn index(&self, range: core::ops::Range<usize>) -> &[u8] {
        &self.stored()[range]
    }
}

impl<const N: usize> core::ops::Index<usize> for FixedBuffer<N> {
    type Output = u8;

    fn index(&self, pos: usize) -> &u8 {
        &self.stored()[pos]
    }
}

impl<const N: usize> UnderlyingBuffer for FixedBuffer<N> {
    fn clear(&mut self) {
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn max_capacity(&self) -> usize {
        N
    }

    fn append(&mut self, bytes: &[u8]) -> usize {
        let taken = min(bytes.len(), N - self.len);
        self.buffer[self.len..self.len + taken].copy_from_slice(&bytes[..taken]);
        self.len += taken;
        taken
    }

    fn drain(&mut self, count: usize) {
        if count >= self.len {
            self.len = 0;
            return;
        }
        self.buffer.copy_within(count..self.len, 0);
        self.len -= count;
    }

    fn find_from(&self, start: usize, value: u8) -> Option<usize> {
        self.stored()
            .get(start..)?
            .iter()
            .position(|b| *b == value)
            .map(|i| i + start)
    }
}
