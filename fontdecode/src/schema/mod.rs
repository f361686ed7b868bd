//! Declarative descriptions of binary layouts. Tables are described by composing descriptors
//! (numbers, strings, arrays, structs, pointers, ...), and decoding a descriptor against a
//! [`DecodeStream`] produces a [`Value`].

use std::fmt;
use std::sync::Arc;

mod array;
mod bitfield;
mod buffer;
mod context;
mod lazy_array;
mod length;
mod number;
mod optional;
mod pointer;
mod reserved;
mod string;
mod structure;
mod value;
mod versioned;

pub use array::Array;
pub use bitfield::Bitfield;
pub use buffer::Buffer;
pub use context::{Context, Frame, Resolve};
pub(crate) use context::with_ancestry;
pub use lazy_array::{LazyArray, LazyArrayValue};
pub use length::{Length, LengthFn};
pub use number::{Fixed, Number};
pub use optional::{Condition, Optional};
pub use pointer::{LazyValue, Origin, Pointer};
pub use reserved::Reserved;
pub use string::{EncodingFn, Text};
pub use structure::{ProcessFn, Structure};
pub use value::{Flags, Struct, TagMap, Value};
pub use versioned::{Discriminant, Version, VersionedStructure};

use crate::error::{Error, Result};
use crate::stream::DecodeStream;

/// A binary layout descriptor.
pub trait Type: fmt::Debug + Send + Sync {
    /// Decodes a value at the stream's position, advancing it past the consumed bytes. `ctx` is
    /// the scope of the enclosing struct, if any.
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value>;

    /// Like [`Type::decode`] but with a known byte length for the value. Only structs make use
    /// of it.
    fn decode_with_length(
        &self,
        stream: &mut DecodeStream,
        ctx: Option<&Context<'_>>,
        _length: usize,
    ) -> Result<Value> {
        self.decode(stream, ctx)
    }

    /// Encoded size in bytes, for fixed-size descriptors.
    fn size(&self, _ctx: Option<&Context<'_>>) -> Result<usize> {
        Err(Error::NotFixedSize)
    }
}

/// A shared descriptor.
pub type TypeRef = Arc<dyn Type>;

impl<T: Type + ?Sized> Type for Arc<T> {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        (**self).decode(stream, ctx)
    }

    fn decode_with_length(
        &self,
        stream: &mut DecodeStream,
        ctx: Option<&Context<'_>>,
        length: usize,
    ) -> Result<Value> {
        (**self).decode_with_length(stream, ctx, length)
    }

    fn size(&self, ctx: Option<&Context<'_>>) -> Result<usize> {
        (**self).size(ctx)
    }
}

pub(crate) fn type_ref(ty: impl Type + 'static) -> TypeRef {
    Arc::new(ty)
}

pub type ComputeFn = fn(&Context<'_>) -> Result<Value>;

/// A named struct member, either decoded from the stream or computed from sibling fields.
#[derive(Clone)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
}

#[derive(Clone)]
enum FieldKind {
    Decoded(TypeRef),
    Computed(ComputeFn),
}

impl Field {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldKind::Decoded(ty) => write!(f, "{}: {:?}", self.name, ty),
            FieldKind::Computed(_) => write!(f, "{}: <computed>", self.name),
        }
    }
}

pub fn field(name: &'static str, ty: impl Type + 'static) -> Field {
    Field {
        name,
        kind: FieldKind::Decoded(type_ref(ty)),
    }
}

pub fn computed(name: &'static str, f: ComputeFn) -> Field {
    Field {
        name,
        kind: FieldKind::Computed(f),
    }
}

/// Decodes `fields` in order into `res`. Each field sees the partially built struct as its
/// context, with `parent` as the enclosing scope.
pub(crate) fn decode_fields(
    stream: &mut DecodeStream,
    res: &mut Struct,
    fields: &[Field],
    parent: Option<&Context<'_>>,
) -> Result<()> {
    for field in fields {
        let value = {
            let ctx = Context::for_struct(res, parent);
            match &field.kind {
                FieldKind::Computed(f) => f(&ctx)?,
                FieldKind::Decoded(ty) => ty.decode(stream, Some(&ctx))?,
            }
        };
        res.set(field.name, value);
        res.current_offset = stream.pos().saturating_sub(res.start_offset);
    }
    Ok(())
}

/// Sum of the sizes of fixed-size fields. Computed fields take no space.
pub(crate) fn fields_size(fields: &[Field], ctx: Option<&Context<'_>>) -> Result<usize> {
    fields.iter().try_fold(0, |size, field| match &field.kind {
        FieldKind::Decoded(ty) => Ok(size + ty.size(ctx)?),
        FieldKind::Computed(_) => Ok(size),
    })
}
