use std::fmt;
use std::rc::Rc;

use super::{decode_fields, fields_size, Context, Field, Struct, Type, Value};
use crate::error::Result;
use crate::stream::DecodeStream;

/// Post-decode hook that may rewrite the decoded struct in place.
pub type ProcessFn = fn(&mut Struct) -> Result<()>;

/// An ordered sequence of named fields.
#[derive(Clone)]
pub struct Structure {
    fields: Vec<Field>,
    process: Option<ProcessFn>,
}

impl Structure {
    pub fn new(fields: Vec<Field>) -> Self {
        Structure {
            fields,
            process: None,
        }
    }

    pub fn with_process(mut self, process: ProcessFn) -> Self {
        self.process = Some(process);
        self
    }

    pub fn decode_struct(
        &self,
        stream: &mut DecodeStream,
        parent: Option<&Context<'_>>,
        length: usize,
    ) -> Result<Struct> {
        let mut res = Struct::new(stream.pos(), length);
        decode_fields(stream, &mut res, &self.fields, parent)?;
        if let Some(process) = self.process {
            process(&mut res)?;
        }
        Ok(res)
    }
}

impl Type for Structure {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        self.decode_with_length(stream, ctx, 0)
    }

    fn decode_with_length(
        &self,
        stream: &mut DecodeStream,
        ctx: Option<&Context<'_>>,
        length: usize,
    ) -> Result<Value> {
        self.decode_struct(stream, ctx, length)
            .map(|s| Value::Struct(Rc::new(s)))
    }

    fn size(&self, ctx: Option<&Context<'_>>) -> Result<usize> {
        fields_size(&self.fields, ctx)
    }
}

impl fmt::Debug for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("fields", &self.fields)
            .finish()
    }
}
