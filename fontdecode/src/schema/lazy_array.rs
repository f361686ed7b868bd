use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use super::{type_ref, with_ancestry, Context, Frame, Length, Type, TypeRef, Value};
use crate::error::{Error, Result};
use crate::stream::DecodeStream;

/// An array of fixed-size elements that are only decoded when accessed.
#[derive(Debug, Clone)]
pub struct LazyArray {
    ty: TypeRef,
    length: Length,
}

impl LazyArray {
    pub fn new(ty: impl Type + 'static, length: impl Into<Length>) -> Self {
        LazyArray {
            ty: type_ref(ty),
            length: length.into(),
        }
    }
}

impl Type for LazyArray {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        let pos = stream.pos();
        let len = self.length.resolve(Some(stream), ctx)?;

        let mut ancestry = ctx.map(|ctx| ctx.ancestry()).unwrap_or_default();
        if self.length.is_inline() {
            ancestry.push(Frame {
                start_offset: Some(pos),
                length: len,
            });
        }

        let item_size = with_ancestry(&ancestry, |ctx: Option<&Context<'_>>| self.ty.size(ctx))?;
        if item_size == 0 && len > 0 {
            return Err(Error::invalid("lazy array of zero sized elements"));
        }
        let base = stream.pos();
        let total = len
            .checked_mul(item_size)
            .ok_or_else(|| Error::invalid("lazy array length overflow"))?;
        stream.skip(total)?;

        log::trace!("lazy array of {} items at {}", len, base);

        Ok(Value::LazyArray(Rc::new(LazyArrayValue {
            stream: stream.clone(),
            base,
            item_size,
            ty: self.ty.clone(),
            ancestry,
            items: (0..len).map(|_| OnceCell::new()).collect(),
        })))
    }

    fn size(&self, ctx: Option<&Context<'_>>) -> Result<usize> {
        let len = self.length.resolve(None, ctx)?;
        Ok(len * self.ty.size(ctx)?)
    }
}

/// The decoded handle of a [`LazyArray`]. Element `i` is decoded from `base + i * item_size`
/// on first access and cached afterwards.
pub struct LazyArrayValue {
    stream: DecodeStream,
    base: usize,
    item_size: usize,
    ty: TypeRef,
    ancestry: Vec<Frame>,
    items: Vec<OnceCell<Value>>,
}

impl LazyArrayValue {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Result<Option<&Value>> {
        let cell = match self.items.get(index) {
            Some(cell) => cell,
            None => return Ok(None),
        };
        cell.get_or_try_init(|| {
            let mut stream = self.stream.clone();
            stream.seek(self.base + index * self.item_size)?;
            with_ancestry(&self.ancestry, |ctx: Option<&Context<'_>>| {
                self.ty.decode(&mut stream, ctx)
            })
        })
        .map(Some)
    }

    /// Integer element at `index`; out of range indices and negative indices yield `None`.
    pub fn int(&self, index: i64) -> Result<Option<i64>> {
        if index < 0 {
            return Ok(None);
        }
        Ok(self.get(index as usize)?.and_then(Value::as_int))
    }

    /// Decodes all elements.
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        (0..self.len())
            .map(|i| self.get(i).map(|v| v.cloned().unwrap_or(Value::Null)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<&Value>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i).transpose())
    }

    pub fn decoded_count(&self) -> usize {
        self.items.iter().filter(|cell| cell.get().is_some()).count()
    }
}

impl fmt::Debug for LazyArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyArrayValue")
            .field("base", &self.base)
            .field("len", &self.len())
            .field("decoded", &self.decoded_count())
            .finish()
    }
}
