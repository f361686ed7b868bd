use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use super::{decode_fields, Context, Field, ProcessFn, Struct, Type, TypeRef, Value};
use crate::error::{Error, Result};
use crate::stream::DecodeStream;

/// Where the version of a [`VersionedStructure`] comes from.
#[derive(Debug, Clone)]
pub enum Discriminant {
    /// Decoded from the stream as the first field, stored as `version`.
    Inline(TypeRef),
    /// Dotted path resolved against the enclosing scope, e.g. `head.indexToLocFormat`.
    Path(&'static str),
}

/// Layout of a single version.
#[derive(Debug, Clone)]
pub enum Version {
    Fields(Vec<Field>),
    /// Delegates the remaining decode to another versioned structure.
    Nested(Arc<VersionedStructure>),
}

/// A struct whose fields depend on a version discriminant.
#[derive(Clone)]
pub struct VersionedStructure {
    discriminant: Discriminant,
    header: Vec<Field>,
    versions: BTreeMap<i64, Version>,
    process: Option<ProcessFn>,
}

impl VersionedStructure {
    pub fn new(discriminant: Discriminant) -> Self {
        VersionedStructure {
            discriminant,
            header: Vec::new(),
            versions: BTreeMap::new(),
            process: None,
        }
    }

    pub fn inline(ty: impl Type + 'static) -> Self {
        Self::new(Discriminant::Inline(super::type_ref(ty)))
    }

    pub fn path(path: &'static str) -> Self {
        Self::new(Discriminant::Path(path))
    }

    /// Fields common to all versions, decoded right after an inline version.
    pub fn header(mut self, fields: Vec<Field>) -> Self {
        self.header = fields;
        self
    }

    pub fn version(mut self, version: i64, fields: Vec<Field>) -> Self {
        self.versions.insert(version, Version::Fields(fields));
        self
    }

    pub fn nested(mut self, version: i64, nested: Arc<VersionedStructure>) -> Self {
        self.versions.insert(version, Version::Nested(nested));
        self
    }

    pub fn with_process(mut self, process: ProcessFn) -> Self {
        self.process = Some(process);
        self
    }

    pub fn versions(&self) -> impl Iterator<Item = i64> + '_ {
        self.versions.keys().copied()
    }

    pub fn decode_struct(
        &self,
        stream: &mut DecodeStream,
        parent: Option<&Context<'_>>,
        length: usize,
    ) -> Result<Struct> {
        let mut res = Struct::new(stream.pos(), length);

        let version = match &self.discriminant {
            Discriminant::Inline(ty) => ty.decode(stream, parent)?,
            Discriminant::Path(path) => parent
                .and_then(|ctx| ctx.lookup(path))
                .ok_or_else(|| Error::missing(path))?,
        };
        let key = version
            .as_int()
            .ok_or_else(|| Error::mismatch("version", "integer"))?;
        res.set("version", version);
        res.current_offset = stream.pos() - res.start_offset;

        decode_fields(stream, &mut res, &self.header, parent)?;

        match self.versions.get(&key) {
            None => return Err(Error::UnknownVersion(key)),
            Some(Version::Nested(nested)) => {
                return nested.decode_struct(stream, parent, length);
            }
            Some(Version::Fields(fields)) => {
                decode_fields(stream, &mut res, fields, parent)?;
            }
        }

        if let Some(process) = self.process {
            process(&mut res)?;
        }
        Ok(res)
    }
}

impl Type for VersionedStructure {
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
}

impl fmt::Debug for VersionedStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedStructure")
            .field("discriminant", &self.discriminant)
            .field("header", &self.header)
            .field("versions", &self.versions)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{field, Number, Resolve};
    use pretty_assertions::assert_eq;

    fn sample() -> VersionedStructure {
        VersionedStructure::inline(Number::U16)
            .header(vec![field("length", Number::U16)])
            .version(0, vec![field("small", Number::U8)])
            .version(1, vec![field("large", Number::U32)])
    }

    #[test]
    fn test_inline_version() {
        let mut stream = DecodeStream::new(vec![0x00, 0x01, 0x00, 0x0a, 0x00, 0x00, 0x01, 0x00]);
        let res = sample().decode_struct(&mut stream, None, 0).unwrap();
        assert_eq!(res.int("version").unwrap(), 1);
        assert_eq!(res.int("length").unwrap(), 10);
        assert_eq!(res.int("large").unwrap(), 256);
        assert!(res.get("small").is_none());
    }

    #[test]
    fn test_unknown_version() {
        let mut stream = DecodeStream::new(vec![0x00, 0x07, 0x00, 0x00, 0x00]);
        assert!(matches!(
            sample().decode_struct(&mut stream, None, 0),
            Err(Error::UnknownVersion(7))
        ));
    }

    struct Root;

    impl Resolve for Root {
        fn resolve(&self, name: &str) -> Option<Value> {
            if name == "head" {
                let mut head = Struct::new(0, 0);
                head.set("indexToLocFormat", Value::Int(1));
                Some(Value::Struct(Rc::new(head)))
            } else {
                None
            }
        }
    }

    #[test]
    fn test_path_version() {
        let versioned = VersionedStructure::path("head.indexToLocFormat")
            .version(0, vec![field("offset", Number::U16)])
            .version(1, vec![field("offset", Number::U32)]);
        let root = Root;
        let ctx = Context::root(&root);
        let mut stream = DecodeStream::new(vec![0x00, 0x00, 0x01, 0x00]);
        let res = versioned.decode_struct(&mut stream, Some(&ctx), 4).unwrap();
        assert_eq!(res.int("offset").unwrap(), 256);
        assert_eq!(res.length(), 4);

        assert!(matches!(
            versioned.decode_struct(&mut stream, None, 0),
            Err(Error::MissingField(_))
        ));
    }

    #[test]
    fn test_nested_version() {
        let inner = Arc::new(
            VersionedStructure::inline(Number::U8).version(3, vec![field("value", Number::U8)]),
        );
        let outer = VersionedStructure::inline(Number::U8).nested(1, inner);
        let mut stream = DecodeStream::new(vec![1, 3, 42]);
        let res = outer.decode_struct(&mut stream, None, 0).unwrap();
        assert_eq!(res.int("version").unwrap(), 3);
        assert_eq!(res.int("value").unwrap(), 42);
    }
}
