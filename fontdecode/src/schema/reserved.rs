use super::{Context, Length, Number, Type, Value};
use crate::error::Result;
use crate::stream::DecodeStream;

/// Padding that is skipped and never stored.
#[derive(Debug, Clone)]
pub struct Reserved {
    number: Number,
    count: Length,
}

impl Reserved {
    pub fn new(number: Number, count: impl Into<Length>) -> Self {
        Reserved {
            number,
            count: count.into(),
        }
    }
}

impl Type for Reserved {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        stream.skip(self.size(ctx)?)?;
        Ok(Value::Void)
    }

    fn size(&self, ctx: Option<&Context<'_>>) -> Result<usize> {
        Ok(self.count.resolve(None, ctx)? * self.number.byte_size())
    }
}
