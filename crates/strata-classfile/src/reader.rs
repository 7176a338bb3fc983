use crate::error::{Error, Result};

/// Big-endian cursor over a byte slice.
///
/// Offsets reported in errors are absolute: a sub-reader created for an
/// attribute body remembers where that body starts in the enclosing file.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self::with_base(bytes, 0)
    }

    pub(crate) fn with_base(bytes: &'a [u8], base: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            base,
        }
    }

    /// Absolute offset of the next unread byte.
    pub(crate) fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn read_u1(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub(crate) fn read_u2(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_u4(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_i4(&mut self) -> Result<i32> {
        Ok(self.read_u4()? as i32)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u64> {
        let hi = self.read_u4()? as u64;
        let lo = self.read_u4()? as u64;
        Ok((hi << 32) | lo)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::UnexpectedEof {
                offset: self.offset(),
                needed: len - self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.bytes[start..self.pos])
    }

    /// Reads a `u4`-length-prefixed attribute body and returns a sub-reader
    /// positioned at its start.
    pub(crate) fn sub_reader(&mut self, len: usize) -> Result<Reader<'a>> {
        let base = self.offset();
        let bytes = self.read_bytes(len)?;
        Ok(Reader::with_base(bytes, base))
    }

    pub(crate) fn ensure_empty(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::TrailingBytes {
                offset: self.offset(),
                remaining: self.remaining(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_values() {
        let bytes = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0x07];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_u4().unwrap(), 0xCAFEBABE);
        assert_eq!(reader.read_u2().unwrap(), 52);
        assert_eq!(reader.read_u1().unwrap(), 7);
        reader.ensure_empty().unwrap();
    }

    #[test]
    fn eof_reports_absolute_offset() {
        let bytes = [0u8; 4];
        let mut outer = Reader::with_base(&bytes, 100);
        outer.read_u2().unwrap();
        let mut sub = outer.sub_reader(2).unwrap();
        sub.read_u1().unwrap();
        let err = sub.read_u2().unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedEof {
                offset: 103,
                needed: 1
            }
        );
    }
}
