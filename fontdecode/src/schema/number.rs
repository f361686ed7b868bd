use super::{Context, Type, Value};
use crate::error::Result;
use crate::stream::DecodeStream;

/// Big-endian integer primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    U8,
    U16,
    U24,
    U32,
    I8,
    I16,
    I32,
}

impl Number {
    pub fn byte_size(self) -> usize {
        match self {
            Number::U8 | Number::I8 => 1,
            Number::U16 | Number::I16 => 2,
            Number::U24 => 3,
            Number::U32 | Number::I32 => 4,
        }
    }

    pub fn read(self, stream: &mut DecodeStream) -> Result<i64> {
        Ok(match self {
            Number::U8 => i64::from(stream.read_u8()?),
            Number::U16 => i64::from(stream.read_u16()?),
            Number::U24 => i64::from(stream.read_u24()?),
            Number::U32 => i64::from(stream.read_u32()?),
            Number::I8 => i64::from(stream.read_i8()?),
            Number::I16 => i64::from(stream.read_i16()?),
            Number::I32 => i64::from(stream.read_i32()?),
        })
    }
}

impl Type for Number {
    fn decode(&self, stream: &mut DecodeStream, _: Option<&Context<'_>>) -> Result<Value> {
        self.read(stream).map(Value::Int)
    }

    fn size(&self, _: Option<&Context<'_>>) -> Result<usize> {
        Ok(self.byte_size())
    }
}

/// Signed fixed-point number: the raw integer divided by `2^frac_bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed {
    number: Number,
    frac_bits: u32,
}

impl Fixed {
    /// 16.16 fixed-point, as used by `Fixed` fields in font tables.
    pub const FIXED32: Fixed = Fixed {
        number: Number::I32,
        frac_bits: 16,
    };

    /// 8.8 fixed-point.
    pub const FIXED16: Fixed = Fixed {
        number: Number::I16,
        frac_bits: 8,
    };

    /// 2.14 fixed-point, as used by component scales.
    pub const F2DOT14: Fixed = Fixed {
        number: Number::I16,
        frac_bits: 14,
    };

    pub fn read(self, stream: &mut DecodeStream) -> Result<f64> {
        let raw = self.number.read(stream)?;
        Ok(raw as f64 / f64::from(1u32 << self.frac_bits))
    }
}

impl Type for Fixed {
    fn decode(&self, stream: &mut DecodeStream, _: Option<&Context<'_>>) -> Result<Value> {
        self.read(stream).map(Value::Float)
    }

    fn size(&self, _: Option<&Context<'_>>) -> Result<usize> {
        Ok(self.number.byte_size())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_signed_and_unsigned() {
        let data = vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let mut stream = DecodeStream::new(data);
        assert_eq!(Number::U16.read(&mut stream).unwrap(), 0xffff);
        assert_eq!(Number::I16.read(&mut stream).unwrap(), -1);
        assert_eq!(Number::U24.read(&mut stream).unwrap(), 0xff_ffff);
        assert_eq!(Number::U8.size(None).unwrap(), 1);
    }

    #[test]
    fn test_fixed() {
        let mut stream = DecodeStream::new(vec![0xff, 0xf4, 0x80, 0x00, 0x40, 0x00, 0xc0, 0x00]);
        assert_eq!(Fixed::FIXED32.read(&mut stream).unwrap(), -11.5);
        assert_eq!(Fixed::F2DOT14.read(&mut stream).unwrap(), 1.0);
        assert_eq!(Fixed::F2DOT14.read(&mut stream).unwrap(), -1.0);
    }
}
