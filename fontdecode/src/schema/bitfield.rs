use std::rc::Rc;

use super::{Context, Flags, Number, Type, Value};
use crate::error::Result;
use crate::stream::DecodeStream;

/// An integer whose bits are exposed as named flags. `None` entries skip a bit.
#[derive(Debug, Clone)]
pub struct Bitfield {
    number: Number,
    names: &'static [Option<&'static str>],
}

impl Bitfield {
    pub const fn new(number: Number, names: &'static [Option<&'static str>]) -> Self {
        Bitfield { number, names }
    }
}

impl Type for Bitfield {
    fn decode(&self, stream: &mut DecodeStream, _: Option<&Context<'_>>) -> Result<Value> {
        let raw = self.number.read(stream)?;
        let names = self
            .names
            .iter()
            .enumerate()
            .filter_map(|(bit, name)| name.map(|name| (name, raw & (1 << bit) != 0)))
            .collect();
        Ok(Value::Flags(Rc::new(Flags { raw, names })))
    }

    fn size(&self, _: Option<&Context<'_>>) -> Result<usize> {
        Ok(self.number.byte_size())
    }
}
