use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder};

use crate::encodings::Encoding;
use crate::error::{Error, Result};

/// A bounds-checked big-endian cursor over a shared byte buffer. Cloning a stream yields an
/// independent cursor over the same bytes.
#[derive(Debug, Clone)]
pub struct DecodeStream {
    buffer: Rc<[u8]>,
    pos: usize,
}

impl DecodeStream {
    pub fn new(buffer: impl Into<Rc<[u8]>>) -> Self {
        DecodeStream {
            buffer: buffer.into(),
            pos: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.pos)
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buffer.len() {
            return Err(self.eof(pos.saturating_sub(self.pos)));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn eof(&self, len: usize) -> Error {
        Error::UnexpectedEof {
            pos: self.pos,
            len,
            total: self.buffer.len(),
        }
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| self.eof(len))?;
        let start = self.pos;
        self.pos = end;
        Ok(&self.buffer[start..end])
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        self.take(len)
    }

    pub fn read_buffer(&mut self, len: usize) -> Result<Rc<[u8]>> {
        self.take(len).map(Rc::from)
    }

    /// Splits off the next `len` bytes into a stream of their own.
    pub fn sub_stream(&mut self, len: usize) -> Result<DecodeStream> {
        self.read_buffer(len).map(DecodeStream::new)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.take(2).map(BigEndian::read_u16)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.take(2).map(BigEndian::read_i16)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        self.take(3).map(BigEndian::read_u24)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.take(4).map(BigEndian::read_u32)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.take(4).map(BigEndian::read_i32)
    }

    pub fn read_tag(&mut self) -> Result<String> {
        self.read_string(4, Encoding::Ascii)
    }

    pub fn read_string(&mut self, len: usize, encoding: Encoding) -> Result<String> {
        self.take(len).map(|bytes| encoding.decode(bytes))
    }

    /// Reads a string up to a NUL code unit of the encoding's width and skips the terminator.
    /// Without a terminator the string extends to the end of the buffer.
    pub fn read_terminated_string(&mut self, encoding: Encoding) -> Result<String> {
        let width = encoding.width();
        let start = self.pos;
        let mut end = start;
        while end + width <= self.buffer.len() && self.buffer[end..end + width].iter().any(|b| *b != 0) {
            end += width;
        }
        let value = encoding.decode(&self.buffer[start..end.min(self.buffer.len())]);
        self.pos = (end + width).min(self.buffer.len());
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_numbers() {
        let mut stream = DecodeStream::new(vec![0x01, 0x02, 0xff, 0xfe, 0x00, 0x01, 0x02, 0x80]);
        assert_eq!(stream.read_u16().unwrap(), 0x0102);
        assert_eq!(stream.read_i16().unwrap(), -2);
        assert_eq!(stream.read_u24().unwrap(), 0x000102);
        assert_eq!(stream.read_i8().unwrap(), -128);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let mut stream = DecodeStream::new(vec![0x01, 0x02, 0x03]);
        stream.skip(2).unwrap();
        match stream.read_u16() {
            Err(Error::UnexpectedEof { pos, len, total }) => {
                assert_eq!((pos, len, total), (2, 2, 3));
            }
            other => panic!("expected eof, got {:?}", other),
        }
        assert_eq!(stream.pos(), 2);
        assert!(stream.seek(4).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = DecodeStream::new(vec![1, 2, 3, 4]);
        let mut b = a.clone();
        a.skip(3).unwrap();
        assert_eq!(b.read_u8().unwrap(), 1);
        assert_eq!(a.read_u8().unwrap(), 4);
    }

    #[test]
    fn test_terminated_string() {
        let mut stream = DecodeStream::new(b"abc\0de".to_vec());
        assert_eq!(stream.read_terminated_string(Encoding::Ascii).unwrap(), "abc");
        assert_eq!(stream.pos(), 4);
        assert_eq!(stream.read_terminated_string(Encoding::Ascii).unwrap(), "de");
        assert_eq!(stream.pos(), 6);

        let mut stream = DecodeStream::new(vec![0x00, 0x41, 0x00, 0x00, 0x00, 0x42]);
        assert_eq!(stream.read_terminated_string(Encoding::Utf16Be).unwrap(), "A");
        assert_eq!(stream.pos(), 4);
    }
}
