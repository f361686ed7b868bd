use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use super::{type_ref, with_ancestry, Context, Frame, Number, Type, TypeRef, Value};
use crate::error::{Error, Result};
use crate::stream::DecodeStream;

/// What a pointer's offset is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The start of the struct containing the pointer.
    Local,
    /// The position of the offset field itself.
    Immediate,
    /// The start of the struct enclosing the containing struct.
    Parent,
    /// The start of the outermost scope.
    Global,
}

pub type RelativeFn = fn(&Context<'_>) -> Result<i64>;

/// An offset field pointing at a value elsewhere in the stream.
#[derive(Clone)]
pub struct Pointer {
    offset_type: Number,
    target: Option<TypeRef>,
    origin: Origin,
    null_value: Option<i64>,
    lazy: bool,
    relative_to: Option<RelativeFn>,
}

impl Pointer {
    pub fn new(offset_type: Number, target: impl Type + 'static) -> Self {
        Pointer {
            offset_type,
            target: Some(type_ref(target)),
            origin: Origin::Local,
            null_value: Some(0),
            lazy: false,
            relative_to: None,
        }
    }

    /// A pointer without a target type. It decodes to the absolute offset it points at.
    pub fn void(offset_type: Number) -> Self {
        Pointer {
            target: None,
            ..Pointer::new(offset_type, Number::U8)
        }
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Defer decoding the target until it is first accessed.
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Treat every offset, including the null value, as a real offset.
    pub fn non_null(mut self) -> Self {
        self.null_value = None;
        self
    }

    pub fn null_value(mut self, value: i64) -> Self {
        self.null_value = Some(value);
        self
    }

    /// Adds a computed base to the origin.
    pub fn relative_to(mut self, f: RelativeFn) -> Self {
        self.relative_to = Some(f);
        self
    }

    fn origin_offset(&self, field_pos: usize, ctx: Option<&Context<'_>>) -> Result<usize> {
        Ok(match self.origin {
            Origin::Local => ctx.and_then(|ctx| ctx.start_offset()).unwrap_or(0),
            Origin::Immediate => field_pos,
            Origin::Parent => {
                let parent = ctx
                    .and_then(|ctx| ctx.parent())
                    .ok_or_else(|| Error::invalid("parent relative pointer without a parent"))?;
                parent.start_offset().unwrap_or(0)
            }
            Origin::Global => ctx.map(|ctx| ctx.root_offset()).unwrap_or(0),
        })
    }
}

impl Type for Pointer {
    fn decode(&self, stream: &mut DecodeStream, ctx: Option<&Context<'_>>) -> Result<Value> {
        let field_pos = stream.pos();
        let offset = self.offset_type.read(stream)?;
        if self.null_value == Some(offset) {
            return Ok(Value::Null);
        }

        let mut relative = self.origin_offset(field_pos, ctx)? as i64;
        if let Some(f) = self.relative_to {
            let ctx = ctx.ok_or_else(|| Error::invalid("relative pointer without a scope"))?;
            relative += f(ctx)?;
        }
        let target = usize::try_from(relative + offset)
            .map_err(|_| Error::invalid(format!("negative pointer target {}", relative + offset)))?;

        let ty = match &self.target {
            Some(ty) => ty,
            None => return Ok(Value::Offset(target)),
        };

        if self.lazy {
            return Ok(Value::Lazy(Rc::new(LazyValue {
                stream: stream.clone(),
                pos: target,
                ty: ty.clone(),
                ancestry: ctx.map(|ctx| ctx.ancestry()).unwrap_or_default(),
                value: OnceCell::new(),
            })));
        }

        let pos = stream.pos();
        stream.seek(target)?;
        let value = ty.decode(stream, ctx);
        stream.seek(pos)?;
        value
    }

    fn size(&self, _: Option<&Context<'_>>) -> Result<usize> {
        Ok(self.offset_type.byte_size())
    }
}

impl fmt::Debug for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointer")
            .field("offset_type", &self.offset_type)
            .field("target", &self.target)
            .field("origin", &self.origin)
            .field("null_value", &self.null_value)
            .field("lazy", &self.lazy)
            .finish()
    }
}

/// A pointer target decoded on first access, with the scope of the pointer's struct captured at
/// decode time.
pub struct LazyValue {
    stream: DecodeStream,
    pos: usize,
    ty: TypeRef,
    ancestry: Vec<Frame>,
    value: OnceCell<Value>,
}

impl LazyValue {
    pub fn get(&self) -> Result<&Value> {
        self.value.get_or_try_init(|| {
            log::trace!("decoding deferred pointer target at {}", self.pos);
            let mut stream = self.stream.clone();
            stream.seek(self.pos)?;
            with_ancestry(&self.ancestry, |ctx: Option<&Context<'_>>| {
                self.ty.decode(&mut stream, ctx)
            })
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_decoded(&self) -> bool {
        self.value.get().is_some()
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyValue")
            .field("pos", &self.pos)
            .field("value", &self.value.get())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{field, Structure};
    use pretty_assertions::assert_eq;

    fn record(pointer: Pointer) -> Structure {
        Structure::new(vec![field("pad", Number::U8), field("ptr", pointer)])
    }

    #[test]
    fn test_origins() {
        // pad | u8 offset | ... | target
        let data = vec![0xaa, 0xbb, 0x04, 0x00, 0x2a, 0x2b, 0x2c];
        let cases = vec![
            (Origin::Local, 0x2b),
            (Origin::Immediate, 0x2c),
            (Origin::Global, 0x2a),
        ];
        for (origin, expected) in cases {
            let mut stream = DecodeStream::new(data.clone());
            stream.skip(1).unwrap();
            let outer = Structure::new(vec![field(
                "inner",
                record(Pointer::new(Number::U8, Number::U8).origin(origin)),
            )]);
            let root = Context::from_frame(
                Frame {
                    start_offset: Some(0),
                    length: 0,
                },
                None,
            );
            let res = outer.decode_struct(&mut stream, Some(&root), 0).unwrap();
            let inner = res.structure("inner").unwrap();
            assert_eq!(inner.int("ptr").unwrap(), expected, "{:?}", origin);
            assert_eq!(stream.pos(), 3);
        }
    }

    #[test]
    fn test_parent_origin() {
        let data = vec![0x00, 0x01, 0x03, 0x09, 0x07];
        let mut stream = DecodeStream::new(data);
        let outer = Structure::new(vec![
            field("pad", Number::U8),
            field(
                "inner",
                record(Pointer::new(Number::U8, Number::U8).origin(Origin::Parent)),
            ),
        ]);
        let res = outer.decode_struct(&mut stream, None, 0).unwrap();
        assert_eq!(res.structure("inner").unwrap().int("ptr").unwrap(), 0x09);

        let mut stream = DecodeStream::new(vec![0x00, 0x01]);
        assert!(record(Pointer::new(Number::U8, Number::U8).origin(Origin::Parent))
            .decode(&mut stream, None)
            .is_err());
    }

    #[test]
    fn test_null_and_void() {
        let mut stream = DecodeStream::new(vec![0x00, 0x00, 0x00, 0x05]);
        let res = record(Pointer::new(Number::U8, Number::U8))
            .decode_struct(&mut stream, None, 0)
            .unwrap();
        assert!(res.get("ptr").unwrap().is_null());

        let value = Pointer::void(Number::U16)
            .decode(&mut stream, None)
            .unwrap();
        assert_eq!(value.as_offset(), Some(5));

        let mut stream = DecodeStream::new(vec![0xff, 0x07]);
        let value = Pointer::new(Number::U8, Number::U8)
            .null_value(0xff)
            .decode(&mut stream, None)
            .unwrap();
        assert!(value.is_null());

        let mut stream = DecodeStream::new(vec![0x00]);
        let value = Pointer::new(Number::U8, Number::U8)
            .non_null()
            .decode(&mut stream, None)
            .unwrap();
        assert_eq!(value.as_int(), Some(0));
    }

    #[test]
    fn test_relative_to() {
        let structure = Structure::new(vec![
            field("base", Number::U8),
            field(
                "ptr",
                Pointer::new(Number::U8, Number::U8).relative_to(|ctx| ctx.int("base")),
            ),
        ]);
        let mut stream = DecodeStream::new(vec![0x02, 0x01, 0x00, 0x33]);
        let res = structure.decode_struct(&mut stream, None, 0).unwrap();
        assert_eq!(res.int("ptr").unwrap(), 0x33);
    }

    #[test]
    fn test_lazy() {
        let mut stream = DecodeStream::new(vec![0x02, 0x00, 0x00, 0x10]);
        let value = Pointer::new(Number::U8, Number::U16)
            .lazy()
            .decode(&mut stream, None)
            .unwrap();
        assert_eq!(stream.pos(), 1);
        let lazy = match &value {
            Value::Lazy(lazy) => lazy.clone(),
            other => panic!("expected lazy value, got {:?}", other),
        };
        assert!(!lazy.is_decoded());
        assert_eq!(value.resolve().unwrap().as_int(), Some(0x10));
        assert!(lazy.is_decoded());
    }

    #[test]
    fn test_lazy_failure_is_deferred() {
        let mut stream = DecodeStream::new(vec![0x40]);
        let value = Pointer::new(Number::U8, Number::U32)
            .lazy()
            .decode(&mut stream, None)
            .unwrap();
        assert!(value.resolve().is_err());
    }
}
