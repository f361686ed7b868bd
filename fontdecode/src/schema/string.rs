use std::fmt;

use super::{Context, Length, Type, Value};
use crate::encodings::Encoding;
use crate::error::{Error, Result};
use crate::stream::DecodeStream;

pub type EncodingFn = fn(&Context<'_>) -> Option<Encoding>;

#[derive(Clone, Copy)]
enum EncodingSource {
    Fixed(Encoding),
    Callback(EncodingFn),
}

/// A string of a given byte length, or NUL terminated when no length is given.
#[derive(Clone)]
pub struct Text {
    length: Option<Length>,
    encoding: EncodingSource,
}

impl Text {
    pub fn new(length: impl Into<Length>, encoding: Encoding) -> Self {
        Text {
            length: Some(length.into()),
            encoding: EncodingSource::Fixed(encoding),
        }
    }

    pub fn terminated(encoding: Encoding) -> Self {
        Text {
            length: None,
            encoding: EncodingSource::Fixed(encoding),
        }
    }

    /// A string whose encoding depends on sibling fields. Falls back to ASCII when the callback
    /// yields no encoding.
    pub fn with_encoding(length: impl Into<Length>, encoding: EncodingFn) -> Self {
        Text {
            length: Some(length.into()),
            encoding: EncodingSource::Callback(encoding),
        }
    }

    fn encoding(&self, ctx: Option<&Context<'_>>) -> Encoding {
        match self.encoding {
            EncodingSource::Fixed(encoding) => encoding,
            EncodingSource::Callback(f) => ctx.and_then(f).unwrap_or(Encoding::Ascii),
        }
    }
}

impl Type for Text {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        let encoding = self.encoding(ctx);
        let value = match &self.length {
            Some(length) => {
                let len = length.resolve(Some(stream), ctx)?;
                stream.read_string(len, encoding)?
            }
            None => stream.read_terminated_string(encoding)?,
        };
        Ok(Value::String(value))
    }

    fn size(&self, ctx: Option<&Context<'_>>) -> Result<usize> {
        match &self.length {
            Some(Length::Fixed(len)) => Ok(*len),
            Some(length @ Length::Field(_)) | Some(length @ Length::Callback(_)) => {
                length.resolve(None, ctx)
            }
            _ => Err(Error::NotFixedSize),
        }
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoding = match self.encoding {
            EncodingSource::Fixed(encoding) => format!("{:?}", encoding),
            EncodingSource::Callback(_) => "<computed>".to_string(),
        };
        f.debug_struct("Text")
            .field("length", &self.length)
            .field("encoding", &encoding)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{field, Number, Structure};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fixed_and_inline() {
        let mut stream = DecodeStream::new(b"head\x03abc".to_vec());
        let tag = Text::new(4, Encoding::Ascii).decode(&mut stream, None).unwrap();
        assert_eq!(tag.as_str(), Some("head"));
        let pascal = Text::new(Number::U8, Encoding::Ascii)
            .decode(&mut stream, None)
            .unwrap();
        assert_eq!(pascal.as_str(), Some("abc"));
    }

    #[test]
    fn test_encoding_from_siblings() {
        let structure = Structure::new(vec![
            field("platform", Number::U8),
            field(
                "text",
                Text::with_encoding(4, |ctx| match ctx.int("platform").ok()? {
                    3 => Some(Encoding::Utf16Be),
                    _ => None,
                }),
            ),
        ]);
        let mut stream = DecodeStream::new(vec![3, 0x00, 0x48, 0x00, 0x69]);
        let res = structure.decode_struct(&mut stream, None, 0).unwrap();
        assert_eq!(res.string("text").unwrap(), "Hi");

        let mut stream = DecodeStream::new(vec![1, 0x00, 0x48, 0x00, 0x69]);
        let res = structure.decode_struct(&mut stream, None, 0).unwrap();
        assert_eq!(res.string("text").unwrap(), "\0H\0i");
    }

    #[test]
    fn test_terminated() {
        let mut stream = DecodeStream::new(b"abc\0d".to_vec());
        let value = Text::terminated(Encoding::Ascii)
            .decode(&mut stream, None)
            .unwrap();
        assert_eq!(value.as_str(), Some("abc"));
        assert_eq!(stream.pos(), 4);
    }
}
