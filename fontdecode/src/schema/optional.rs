use std::fmt;

use super::{type_ref, Context, Type, TypeRef, Value};
use crate::error::Result;
use crate::stream::DecodeStream;

#[derive(Clone, Copy)]
pub enum Condition {
    Always(bool),
    Callback(fn(&Context<'_>) -> Result<bool>),
}

/// A value that is only present when its condition holds.
#[derive(Clone)]
pub struct Optional {
    ty: TypeRef,
    condition: Condition,
}

impl Optional {
    pub fn new(ty: impl Type + 'static, condition: Condition) -> Self {
        Optional {
            ty: type_ref(ty),
            condition,
        }
    }

    pub fn when(ty: impl Type + 'static, f: fn(&Context<'_>) -> Result<bool>) -> Self {
        Self::new(ty, Condition::Callback(f))
    }

    fn holds(&self, ctx: Option<&Context<'_>>) -> Result<bool> {
        match self.condition {
            Condition::Always(present) => Ok(present),
            Condition::Callback(f) => ctx.map(f).unwrap_or(Ok(false)),
        }
    }
}

impl Type for Optional {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        if self.holds(ctx)? {
            self.ty.decode(stream, ctx)
        } else {
            Ok(Value::Void)
        }
    }

    fn size(&self, ctx: Option<&Context<'_>>) -> Result<usize> {
        if self.holds(ctx)? {
            self.ty.size(ctx)
        } else {
            Ok(0)
        }
    }
}

impl fmt::Debug for Optional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let condition = match self.condition {
            Condition::Always(present) => format!("{}", present),
            Condition::Callback(_) => "<computed>".to_string(),
        };
        f.debug_struct("Optional")
            .field("ty", &self.ty)
            .field("condition", &condition)
            .finish()
    }
}
