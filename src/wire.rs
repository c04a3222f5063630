//! Wire-format primitives: unsigned varints and the envelope reader.
//!
//! One value on the wire is an *envelope*:
//!
//! ```text
//! type_tag       : uvarint        (0 reserved for back-references)
//! if type_tag == 0:
//!     ref_id     : uvarint
//! else:
//!     payload_len: uvarint
//!     payload    : payload_len bytes, codec-specific
//! ```
//!
//! Varints are unsigned LEB128, at most [`MAX_VARINT_LEN`] bytes for a `u64`.
use {
    crate::error::{truncated, varint_overflow, Result},
    bytes::{Buf, Bytes},
};

/// Wire tag reserved for back-reference envelopes.
pub const BACKREF_TAG: u64 = 0;

/// Maximum encoded length of a `u64` varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `value` to `out` as an unsigned LEB128 varint.
#[inline]
pub fn put_uvarint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Cursor over a decode buffer.
///
/// Tracks the absolute stream offset so malformed-stream errors report where
/// decoding stopped, even from inside a nested payload window. Splitting a
/// window is zero-copy: the window shares the input allocation, so payload
/// bytes handed to codecs alias the caller's buffer.
pub struct Reader {
    buf: Bytes,
    offset: usize,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf, offset: 0 }
    }

    /// Absolute offset of the next unread byte.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    #[inline]
    pub fn get_byte(&mut self) -> Result<u8> {
        if !self.buf.has_remaining() {
            return Err(truncated(self.offset, 1));
        }
        self.offset += 1;
        Ok(self.buf.get_u8())
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.buf.remaining() < N {
            return Err(truncated(self.offset, N as u64));
        }
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        self.offset += N;
        Ok(out)
    }

    /// Take the next `len` bytes without copying.
    ///
    /// The returned [`Bytes`] aliases the input buffer.
    #[inline]
    pub fn take_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.buf.remaining() < len {
            return Err(truncated(self.offset, len as u64));
        }
        self.offset += len;
        Ok(self.buf.split_to(len))
    }

    /// Read an unsigned LEB128 varint.
    pub fn get_uvarint(&mut self) -> Result<u64> {
        let start = self.offset;
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.get_byte()?;
            if shift == 63 && byte > 1 {
                return Err(varint_overflow(start));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(varint_overflow(start));
            }
        }
    }

    /// Split off the next `len` bytes as an independent reader (zero-copy).
    ///
    /// The window reports absolute offsets, and a codec handed the window
    /// cannot read past it into sibling envelopes.
    pub fn split_window(&mut self, len: u64) -> Result<Reader> {
        let Ok(len) = usize::try_from(len) else {
            return Err(truncated(self.offset, len));
        };
        if self.buf.remaining() < len {
            return Err(truncated(self.offset, len as u64));
        }
        let window = Reader {
            buf: self.buf.split_to(len),
            offset: self.offset,
        };
        self.offset += len;
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::error::Error, proptest::prelude::*};

    fn uvarint_bytes(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        put_uvarint(&mut out, value);
        out
    }

    #[test]
    fn varint_known_encodings() {
        assert_eq!(uvarint_bytes(0), [0x00]);
        assert_eq!(uvarint_bytes(1), [0x01]);
        assert_eq!(uvarint_bytes(127), [0x7f]);
        assert_eq!(uvarint_bytes(128), [0x80, 0x01]);
        assert_eq!(uvarint_bytes(300), [0xac, 0x02]);
        assert_eq!(uvarint_bytes(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn varint_overflow_rejected() {
        let mut reader = Reader::new(Bytes::from(vec![0xff; MAX_VARINT_LEN]));
        assert!(matches!(
            reader.get_uvarint(),
            Err(Error::VarintOverflow(0))
        ));
    }

    #[test]
    fn varint_truncation_rejected() {
        let mut reader = Reader::new(Bytes::from_static(&[0x80, 0x80]));
        assert!(matches!(
            reader.get_uvarint(),
            Err(Error::Truncated { offset: 2, .. })
        ));
    }

    #[test]
    fn window_bounds_sibling_reads() {
        let mut reader = Reader::new(Bytes::from_static(&[1, 2, 3, 4, 5]));
        let mut window = reader.split_window(2).unwrap();
        assert_eq!(window.offset(), 0);
        assert_eq!(reader.offset(), 2);
        assert_eq!(window.get_byte().unwrap(), 1);
        assert_eq!(window.get_byte().unwrap(), 2);
        // The sibling bytes are out of reach for the window.
        assert!(matches!(
            window.get_byte(),
            Err(Error::Truncated { offset: 2, .. })
        ));
        assert_eq!(reader.get_byte().unwrap(), 3);
    }

    #[test]
    fn window_longer_than_input_rejected() {
        let mut reader = Reader::new(Bytes::from_static(&[1, 2]));
        assert!(matches!(
            reader.split_window(3),
            Err(Error::Truncated { offset: 0, needed: 3 })
        ));
    }

    #[test]
    fn take_bytes_aliases_input() {
        let input = Bytes::from(vec![9u8; 64]);
        let ptr = input.as_ptr();
        let mut reader = Reader::new(input);
        reader.get_byte().unwrap();
        let taken = reader.take_bytes(16).unwrap();
        // Zero-copy: the slice points into the original allocation.
        assert_eq!(taken.as_ptr(), unsafe { ptr.add(1) });
    }

    proptest! {
        #[test]
        fn varint_round_trip(value in any::<u64>()) {
            let mut reader = Reader::new(Bytes::from(uvarint_bytes(value)));
            prop_assert_eq!(reader.get_uvarint().unwrap(), value);
            prop_assert!(reader.is_empty());
        }

        #[test]
        fn varint_sequence_round_trip(values in proptest::collection::vec(any::<u64>(), 0..=32)) {
            let mut out = Vec::new();
            for &value in &values {
                put_uvarint(&mut out, value);
            }
            let mut reader = Reader::new(Bytes::from(out));
            for &value in &values {
                prop_assert_eq!(reader.get_uvarint().unwrap(), value);
            }
            prop_assert!(reader.is_empty());
        }
    }
}
