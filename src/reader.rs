//! Bounds-checked cursor over an in-memory `.risum` buffer.
//!
//! All integers are little-endian.  Slices are borrowed from the backing
//! buffer, never copied.  A read that would cross the end of the buffer
//! fails with [`OutOfBounds`] and leaves the cursor where it was.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Read of {requested} byte(s) at offset {offset} exceeds buffer ({remaining} remaining)")]
pub struct OutOfBounds {
    pub offset:    usize,
    pub requested: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone)]
pub struct ContainerReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ContainerReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor position, in bytes from the start of the buffer.
    #[inline]
    pub fn offset(&self) -> usize { self.pos }

    #[inline]
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    #[inline]
    pub fn at_end(&self) -> bool { self.pos >= self.buf.len() }

    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        let b = *self.buf.get(self.pos).ok_or_else(|| self.out_of_bounds(1))?;
        self.pos += 1;
        Ok(b)
    }

    /// Read a 4-byte little-endian length prefix.
    pub fn read_length(&mut self) -> Result<u32, OutOfBounds> {
        let bytes = self.read_slice(4)?;
        Ok(LittleEndian::read_u32(bytes))
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], OutOfBounds> {
        if len > self.remaining() {
            return Err(self.out_of_bounds(len));
        }
        let buf = self.buf;
        let start = self.pos;
        self.pos += len;
        Ok(&buf[start..self.pos])
    }

    /// `read_length` followed by `read_slice` of that many bytes.
    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8], OutOfBounds> {
        let len = self.read_length()?;
        self.read_slice(len as usize)
    }

    fn out_of_bounds(&self, requested: usize) -> OutOfBounds {
        OutOfBounds { offset: self.pos, requested, remaining: self.remaining() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sequential_reads() {
        let buf = [0x6F, 0x00, 0x03, 0x00, 0x00, 0x00, b'a', b'b', b'c', 0x01];
        let mut r = ContainerReader::new(&buf);
        assert_eq!(r.read_u8().unwrap(), 0x6F);
        assert_eq!(r.read_u8().unwrap(), 0x00);
        assert_eq!(r.read_length().unwrap(), 3);
        assert_eq!(r.read_slice(3).unwrap(), b"abc");
        assert_eq!(r.remaining(), 1);
        assert!(!r.at_end());
        assert_eq!(r.read_u8().unwrap(), 1);
        assert!(r.at_end());
    }

    #[test]
    fn test_length_is_little_endian() {
        let buf = [0x78, 0x56, 0x34, 0x12];
        let mut r = ContainerReader::new(&buf);
        assert_eq!(r.read_length().unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut r = ContainerReader::new(&[]);
        assert_eq!(
            r.read_u8().unwrap_err(),
            OutOfBounds { offset: 0, requested: 1, remaining: 0 }
        );

        let buf = [1u8, 2, 3];
        let mut r = ContainerReader::new(&buf);
        assert!(r.read_length().is_err());
        // A failed read does not move the cursor.
        assert_eq!(r.offset(), 0);
        assert!(r.read_slice(4).is_err());
        assert_eq!(r.read_slice(3).unwrap(), &buf[..]);
    }

    #[test]
    fn test_slice_borrows_backing_buffer() {
        let buf = vec![9u8; 16];
        let mut r = ContainerReader::new(&buf);
        let s = r.read_slice(8).unwrap();
        assert_eq!(s.as_ptr(), buf.as_ptr());
    }

    #[test]
    fn test_length_prefixed_truncated() {
        let buf = [10u8, 0, 0, 0, 1, 2, 3];
        let mut r = ContainerReader::new(&buf);
        let err = r.read_length_prefixed().unwrap_err();
        assert_eq!(err.offset, 4);
        assert_eq!(err.requested, 10);
        assert_eq!(err.remaining, 3);
    }

    proptest! {
        #[test]
        fn prop_never_reads_past_end(buf in proptest::collection::vec(any::<u8>(), 0..64),
                                     lens in proptest::collection::vec(0usize..24, 0..16)) {
            let mut r = ContainerReader::new(&buf);
            for len in lens {
                let before = r.offset();
                match r.read_slice(len) {
                    Ok(s) => {
                        prop_assert_eq!(s.len(), len);
                        prop_assert_eq!(r.offset(), before + len);
                    }
                    Err(e) => {
                        prop_assert!(len > e.remaining);
                        prop_assert_eq!(r.offset(), before);
                    }
                }
                prop_assert!(r.offset() <= buf.len());
                prop_assert_eq!(r.remaining(), buf.len() - r.offset());
            }
        }
    }
}
