use super::{Context, Length, Type, Value};
use crate::error::{Error, Result};
use crate::stream::DecodeStream;

/// Raw bytes of a given length.
#[derive(Debug, Clone)]
pub struct Buffer {
    length: Length,
}

impl Buffer {
    pub fn new(length: impl Into<Length>) -> Self {
        Buffer {
            length: length.into(),
        }
    }
}

impl Type for Buffer {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        let len = self.length.resolve(Some(stream), ctx)?;
        stream.read_buffer(len).map(Value::Bytes)
    }

    fn size(&self, ctx: Option<&Context<'_>>) -> Result<usize> {
        match &self.length {
            Length::Inline(_) => Err(Error::NotFixedSize),
            length => length.resolve(None, ctx),
        }
    }
}
