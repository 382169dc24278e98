use std::fmt;

use crate::{NioError, Result};

pub type ByteBuffer = Buffer<u8>;
pub type CharBuffer = Buffer<char>;

/// Fixed-capacity buffer with a read/write cursor.
///
/// The three counters always satisfy `position <= limit <= capacity`.
/// In write mode `position` is where the next element goes and `limit`
/// is the capacity. [`Buffer::flip`] switches to read mode, exposing
/// everything written so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buffer<T> {
    data: Box<[T]>,
    position: usize,
    limit: usize,
}

impl<T: Copy + Default> Buffer<T> {
    pub fn allocate(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity].into_boxed_slice(),
            position: 0,
            limit: capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Copy `length` elements of `src` starting at `offset`
    /// into the buffer at the current position.
    pub fn put(
        &mut self,
        src: &[T],
        offset: usize,
        length: usize,
    ) -> Result<&mut Self> {
        let end = offset.checked_add(length).filter(|end| *end <= src.len());
        let end = end.ok_or(NioError::OutOfBounds {
            offset,
            length,
            len: src.len(),
        })?;
        if length > self.remaining() {
            return Err(NioError::Overflow {
                requested: length,
                remaining: self.remaining(),
            });
        }

        self.data[self.position..self.position + length]
            .copy_from_slice(&src[offset..end]);
        self.position += length;
        Ok(self)
    }

    pub fn put_one(&mut self, value: T) -> Result<&mut Self> {
        if !self.has_remaining() {
            return Err(NioError::Overflow {
                requested: 1,
                remaining: 0,
            });
        }
        self.data[self.position] = value;
        self.position += 1;
        Ok(self)
    }

    pub fn get(&mut self) -> Result<T> {
        if !self.has_remaining() {
            return Err(NioError::Underflow);
        }
        let value = self.data[self.position];
        self.position += 1;
        Ok(value)
    }

    /// Read the next `n` elements and advance past them.
    pub fn get_slice(&mut self, n: usize) -> Result<&[T]> {
        if n > self.remaining() {
            return Err(NioError::Underflow);
        }
        let start = self.position;
        self.position += n;
        Ok(&self.data[start..start + n])
    }

    /// Switch from write mode to read mode:
    /// the limit becomes the current position, the position becomes zero.
    pub fn flip(&mut self) -> &mut Self {
        self.limit = self.position;
        self.position = 0;
        self
    }

    /// Reset to write mode over the full capacity.
    /// Old contents are not zeroed, only forgotten.
    pub fn clear(&mut self) -> &mut Self {
        self.position = 0;
        self.limit = self.capacity();
        self
    }

    pub fn rewind(&mut self) -> &mut Self {
        self.position = 0;
        self
    }

    /// Space between position and limit, for filling from a reader.
    /// Call [`Buffer::advance`] with the number of elements written.
    pub fn unfilled_mut(&mut self) -> &mut [T] {
        &mut self.data[self.position..self.limit]
    }

    pub fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(NioError::Overflow {
                requested: n,
                remaining: self.remaining(),
            });
        }
        self.position += n;
        Ok(())
    }
}

impl<T> fmt::Display for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "capacity:{} limit:{} position:{}",
            self.data.len(),
            self.limit,
            self.position
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn fresh_buffer_counters() {
        let buffer = CharBuffer::allocate(10);
        assert_eq!(buffer.capacity(), 10);
        assert_eq!(buffer.limit(), 10);
        assert_eq!(buffer.position(), 0);
        assert_eq!(buffer.to_string(), "capacity:10 limit:10 position:0");
    }

    #[test]
    fn put_in_pairs_then_flip_and_drain() {
        let text: Vec<char> = "testText".chars().collect();
        let mut buffer = CharBuffer::allocate(10);

        for idx in (0..text.len()).step_by(2) {
            buffer.put(&text, idx, 2).unwrap();
            assert_eq!(buffer.position(), idx + 2);
            assert_eq!(buffer.limit(), 10);
        }

        buffer.flip();
        assert_eq!(buffer.limit(), 8);
        assert_eq!(buffer.position(), 0);

        let mut drained = String::new();
        for idx in 0..buffer.limit() {
            drained.push(buffer.get().unwrap());
            assert_eq!(buffer.position(), idx + 1);
            assert_eq!(buffer.capacity(), 10);
        }
        assert_eq!(drained, "testText");
        assert!(matches!(buffer.get(), Err(NioError::Underflow)));
    }

    #[test]
    fn overflow_leaves_buffer_untouched() {
        let mut buffer = ByteBuffer::allocate(3);
        buffer.put(b"ab", 0, 2).unwrap();

        let err = buffer.put(b"cd", 0, 2).unwrap_err();
        assert!(matches!(
            err,
            NioError::Overflow {
                requested: 2,
                remaining: 1
            }
        ));
        assert_eq!(buffer.position(), 2);

        buffer.put_one(b'c').unwrap();
        assert!(buffer.put_one(b'd').is_err());
    }

    #[rstest]
    #[case(0, 5)]
    #[case(3, 2)]
    #[case(usize::MAX, 1)]
    fn put_rejects_bad_source_range(
        #[case] offset: usize,
        #[case] length: usize,
    ) {
        let mut buffer = ByteBuffer::allocate(16);
        let err = buffer.put(b"abcd", offset, length).unwrap_err();
        assert!(matches!(err, NioError::OutOfBounds { len: 4, .. }));
        assert_eq!(buffer.position(), 0);
    }

    #[test]
    fn clear_restores_write_mode() {
        let mut buffer = ByteBuffer::allocate(4);
        buffer.put(b"xyz", 0, 3).unwrap();
        buffer.flip();
        assert_eq!(buffer.get_slice(2).unwrap(), b"xy");

        buffer.clear();
        assert_eq!(buffer.position(), 0);
        assert_eq!(buffer.limit(), 4);
        assert_eq!(buffer.unfilled_mut().len(), 4);
    }

    #[test]
    fn fill_through_unfilled_slice() {
        let mut buffer = ByteBuffer::allocate(4);
        buffer.unfilled_mut()[..2].copy_from_slice(b"hi");
        buffer.advance(2).unwrap();
        assert!(buffer.advance(3).is_err());

        buffer.flip();
        assert_eq!(buffer.remaining(), 2);
        assert_eq!(buffer.get_slice(2).unwrap(), b"hi");
        assert!(!buffer.has_remaining());

        buffer.rewind();
        assert_eq!(buffer.get().unwrap(), b'h');
    }
}
