//! Builders for synthetic font data used by the tests of `fontdecode`.
//!
//! Every builder produces the big-endian binary form of a table or a complete font file, so tests
//! can describe fixtures by their content instead of checking in binary files.

pub mod cmap;
pub mod glyf;
pub mod sample;
pub mod sfnt;
pub mod tables;
pub mod ttc;
pub mod woff;
pub mod woff2;

use byteorder::{BigEndian, WriteBytesExt};

/// Big-endian writes into a byte vector.
pub(crate) trait Put {
    fn put_u8(&mut self, value: u8) -> &mut Self;
    fn put_i8(&mut self, value: i8) -> &mut Self;
    fn put_u16(&mut self, value: u16) -> &mut Self;
    fn put_i16(&mut self, value: i16) -> &mut Self;
    fn put_u24(&mut self, value: u32) -> &mut Self;
    fn put_u32(&mut self, value: u32) -> &mut Self;
    fn put_i32(&mut self, value: i32) -> &mut Self;
}

// writing into a Vec never fails
impl Put for Vec<u8> {
    fn put_u8(&mut self, value: u8) -> &mut Self {
        self.push(value);
        self
    }

    fn put_i8(&mut self, value: i8) -> &mut Self {
        self.write_i8(value).unwrap();
        self
    }

    fn put_u16(&mut self, value: u16) -> &mut Self {
        self.write_u16::<BigEndian>(value).unwrap();
        self
    }

    fn put_i16(&mut self, value: i16) -> &mut Self {
        self.write_i16::<BigEndian>(value).unwrap();
        self
    }

    fn put_u24(&mut self, value: u32) -> &mut Self {
        self.write_u24::<BigEndian>(value).unwrap();
        self
    }

    fn put_u32(&mut self, value: u32) -> &mut Self {
        self.write_u32::<BigEndian>(value).unwrap();
        self
    }

    fn put_i32(&mut self, value: i32) -> &mut Self {
        self.write_i32::<BigEndian>(value).unwrap();
        self
    }
}

/// Pads to a multiple of four bytes.
pub(crate) fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}
