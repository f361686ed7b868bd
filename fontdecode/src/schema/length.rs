use std::convert::TryFrom;
use std::fmt;

use super::{Context, Number};
use crate::error::{Error, Result};
use crate::stream::DecodeStream;

pub type LengthFn = fn(&Context<'_>) -> Result<i64>;

/// How the element count or byte length of a descriptor is determined.
#[derive(Clone)]
pub enum Length {
    Fixed(usize),
    /// Dotted path resolved against the enclosing struct.
    Field(&'static str),
    Callback(LengthFn),
    /// Read from the stream immediately before the data.
    Inline(Number),
}

impl Length {
    /// `stream` is required for inline lengths and `ctx` for field and callback lengths.
    pub fn resolve(
        &self,
        stream: Option<&mut DecodeStream>,
        ctx: Option<&Context<'_>>,
    ) -> Result<usize> {
        let value = match self {
            Length::Fixed(n) => return Ok(*n),
            Length::Field(path) => ctx
                .and_then(|ctx| ctx.lookup(path))
                .and_then(|v| v.as_int())
                .ok_or(Error::NotFixedSize)?,
            Length::Callback(f) => f(ctx.ok_or(Error::NotFixedSize)?)?,
            Length::Inline(number) => number.read(stream.ok_or(Error::NotFixedSize)?)?,
        };
        usize::try_from(value).map_err(|_| Error::NotFixedSize)
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Length::Inline(_))
    }
}

impl From<usize> for Length {
    fn from(n: usize) -> Self {
        Length::Fixed(n)
    }
}

impl From<&'static str> for Length {
    fn from(path: &'static str) -> Self {
        Length::Field(path)
    }
}

impl From<Number> for Length {
    fn from(number: Number) -> Self {
        Length::Inline(number)
    }
}

impl From<LengthFn> for Length {
    fn from(f: LengthFn) -> Self {
        Length::Callback(f)
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Fixed(n) => write!(f, "Fixed({})", n),
            Length::Field(path) => write!(f, "Field({:?})", path),
            Length::Callback(_) => f.write_str("Callback(..)"),
            Length::Inline(number) => write!(f, "Inline({:?})", number),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{Struct, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_lengths() {
        let mut s = Struct::new(0, 0);
        s.set("count", Value::Int(3));
        s.set("negative", Value::Int(-1));
        let ctx = Context::for_struct(&s, None);

        assert_eq!(Length::from(5).resolve(None, None).unwrap(), 5);
        assert_eq!(Length::from("count").resolve(None, Some(&ctx)).unwrap(), 3);
        let double: LengthFn = |ctx| Ok(ctx.int("count")? * 2);
        assert_eq!(Length::from(double).resolve(None, Some(&ctx)).unwrap(), 6);

        let mut stream = DecodeStream::new(vec![0x00, 0x04]);
        assert_eq!(
            Length::from(Number::U16)
                .resolve(Some(&mut stream), None)
                .unwrap(),
            4
        );
        assert_eq!(stream.pos(), 2);
    }

    #[test]
    fn test_unresolvable_lengths() {
        let mut s = Struct::new(0, 0);
        s.set("negative", Value::Int(-1));
        s.set("name", Value::String("x".into()));
        let ctx = Context::for_struct(&s, None);

        for length in vec![
            Length::from("missing"),
            Length::from("negative"),
            Length::from("name"),
        ] {
            assert!(matches!(
                length.resolve(None, Some(&ctx)),
                Err(Error::NotFixedSize)
            ));
        }
        assert!(matches!(
            Length::from(Number::U8).resolve(None, Some(&ctx)),
            Err(Error::NotFixedSize)
        ));
    }
}
