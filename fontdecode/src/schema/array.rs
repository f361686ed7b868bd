use std::rc::Rc;

use super::{type_ref, Context, Frame, Length, Type, TypeRef, Value};
use crate::error::{Error, Result};
use crate::stream::DecodeStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Count,
    Bytes,
}

/// A sequence of values decoded eagerly.
#[derive(Debug, Clone)]
pub struct Array {
    ty: TypeRef,
    length: Option<Length>,
    unit: Unit,
}

impl Array {
    /// An array of `length` elements.
    pub fn new(ty: impl Type + 'static, length: impl Into<Length>) -> Self {
        Array {
            ty: type_ref(ty),
            length: Some(length.into()),
            unit: Unit::Count,
        }
    }

    /// An array spanning `length` bytes.
    pub fn bytes(ty: impl Type + 'static, length: impl Into<Length>) -> Self {
        Array {
            ty: type_ref(ty),
            length: Some(length.into()),
            unit: Unit::Bytes,
        }
    }

    /// An array filling the remainder of the enclosing struct's declared length, or of the
    /// stream when the length is unknown.
    pub fn unbounded(ty: impl Type + 'static) -> Self {
        Array {
            ty: type_ref(ty),
            length: None,
            unit: Unit::Bytes,
        }
    }
}

impl Type for Array {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        let pos = stream.pos();
        let length = match &self.length {
            Some(length) => Some(length.resolve(Some(stream), ctx)?),
            None => None,
        };

        // Elements of an array with an inline length see a scope spanning the array itself.
        let inline = match (&self.length, length) {
            (Some(l), Some(length)) if l.is_inline() => Some(Context::from_frame(
                Frame {
                    start_offset: Some(pos),
                    length,
                },
                ctx,
            )),
            _ => None,
        };
        let item_ctx = inline.as_ref().or(ctx);

        let mut items = Vec::new();
        match (length, self.unit) {
            (Some(count), Unit::Count) => {
                items.reserve(count.min(stream.remaining()));
                for _ in 0..count {
                    items.push(self.ty.decode(stream, item_ctx)?);
                }
            }
            (length, _) => {
                let end = match length {
                    Some(bytes) => stream.pos() + bytes,
                    None => match ctx {
                        Some(ctx) if ctx.length() > 0 => {
                            ctx.start_offset().unwrap_or(0) + ctx.length()
                        }
                        _ => stream.len(),
                    },
                };
                while stream.pos() < end {
                    let before = stream.pos();
                    items.push(self.ty.decode(stream, item_ctx)?);
                    if stream.pos() == before {
                        return Err(Error::invalid("array element consumed no bytes"));
                    }
                }
            }
        }

        Ok(Value::Array(Rc::new(items)))
    }

    fn size(&self, ctx: Option<&Context<'_>>) -> Result<usize> {
        match (&self.length, self.unit) {
            (Some(Length::Fixed(count)), Unit::Count) => Ok(count * self.ty.size(ctx)?),
            (Some(Length::Fixed(bytes)), Unit::Bytes) => Ok(*bytes),
            _ => Err(Error::NotFixedSize),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{field, Number, Structure};
    use pretty_assertions::assert_eq;

    fn ints(value: &Value) -> Vec<i64> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_int().unwrap())
            .collect()
    }

    #[test]
    fn test_count_and_inline_length() {
        let mut stream = DecodeStream::new(vec![0x00, 0x02, 0x01, 0x02, 0x03, 0x04, 0x05]);
        let value = Array::new(Number::U16, Number::U16)
            .decode(&mut stream, None)
            .unwrap();
        assert_eq!(ints(&value), vec![0x0102, 0x0304]);
        assert_eq!(stream.pos(), 6);
    }

    #[test]
    fn test_byte_length() {
        let mut stream = DecodeStream::new(vec![0, 1, 0, 2, 0, 3]);
        let value = Array::bytes(Number::U16, 4).decode(&mut stream, None).unwrap();
        assert_eq!(ints(&value), vec![1, 2]);
        assert_eq!(stream.pos(), 4);
    }

    #[test]
    fn test_unbounded_uses_parent_length() {
        let structure = Structure::new(vec![
            field("head", Number::U8),
            field("rest", Array::unbounded(Number::U8)),
        ]);
        let mut stream = DecodeStream::new(vec![9, 1, 2, 3, 4, 5]);
        let res = structure.decode_struct(&mut stream, None, 4).unwrap();
        assert_eq!(res.ints("rest").unwrap(), vec![1, 2, 3]);

        let mut stream = DecodeStream::new(vec![9, 1, 2, 3, 4, 5]);
        let res = structure.decode_struct(&mut stream, None, 0).unwrap();
        assert_eq!(res.ints("rest").unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_size() {
        assert_eq!(Array::new(Number::U32, 3).size(None).unwrap(), 12);
        assert!(Array::new(Number::U32, "n").size(None).is_err());
    }
}
