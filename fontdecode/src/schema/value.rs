use std::fmt;
use std::rc::Rc;

use super::lazy_array::LazyArrayValue;
use super::pointer::LazyValue;
use crate::error::{Error, Result};

/// A decoded value.
#[derive(Debug, Clone)]
pub enum Value {
    /// A pointer whose offset equals its null value.
    Null,
    /// Produced by reserved padding and absent optional fields. Never stored in a struct.
    Void,
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Rc<[u8]>),
    Array(Rc<Vec<Value>>),
    LazyArray(Rc<LazyArrayValue>),
    Struct(Rc<Struct>),
    Flags(Rc<Flags>),
    Map(Rc<TagMap>),
    /// The absolute target of a pointer without a target type.
    Offset(usize),
    /// A pointer target that is decoded on first access.
    Lazy(Rc<LazyValue>),
}

impl Value {
    /// Forces a deferred pointer target, returning any other value as is.
    pub fn resolve(&self) -> Result<&Value> {
        match self {
            Value::Lazy(lazy) => lazy.get(),
            other => Ok(other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Rc<Struct>> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_lazy_array(&self) -> Option<&Rc<LazyArrayValue>> {
        match self {
            Value::LazyArray(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_flags(&self) -> Option<&Flags> {
        match self {
            Value::Flags(flags) => Some(flags),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Rc<TagMap>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_offset(&self) -> Option<usize> {
        match self {
            Value::Offset(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Child lookup used when following dotted paths.
    pub(crate) fn child(&self, name: &str) -> Option<Value> {
        match self.resolve().ok()? {
            Value::Struct(s) => s.get(name).cloned(),
            Value::Map(m) => m.get(name).cloned(),
            _ => None,
        }
    }
}

/// An ordered record of named fields together with the offsets it was decoded at.
#[derive(Debug, Clone, Default)]
pub struct Struct {
    fields: Vec<(&'static str, Value)>,
    pub(crate) start_offset: usize,
    pub(crate) current_offset: usize,
    pub(crate) length: usize,
}

impl Struct {
    pub(crate) fn new(start_offset: usize, length: usize) -> Self {
        Struct {
            fields: Vec::new(),
            start_offset,
            current_offset: 0,
            length,
        }
    }

    /// Absolute position in the stream the struct was decoded at.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Number of bytes consumed so far, relative to `start_offset`.
    pub fn current_offset(&self) -> usize {
        self.current_offset
    }

    /// Declared byte length, or 0 when unknown.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Inserts or replaces a field. Void values are dropped.
    pub fn set(&mut self, name: &'static str, value: Value) {
        if let Value::Void = value {
            return;
        }
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let ix = self.fields.iter().position(|(n, _)| *n == name)?;
        Some(self.fields.remove(ix).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| *n == name)
    }

    /// Raw field access; deferred pointer targets are not forced.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Field access that forces deferred pointer targets.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| Error::missing(name))?.resolve()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        self.field(name)?
            .as_int()
            .ok_or_else(|| Error::mismatch(name, "integer"))
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        self.field(name)?
            .as_f64()
            .ok_or_else(|| Error::mismatch(name, "number"))
    }

    pub fn string(&self, name: &str) -> Result<&str> {
        self.field(name)?
            .as_str()
            .ok_or_else(|| Error::mismatch(name, "string"))
    }

    pub fn structure(&self, name: &str) -> Result<&Rc<Struct>> {
        self.field(name)?
            .as_struct()
            .ok_or_else(|| Error::mismatch(name, "struct"))
    }

    pub fn array(&self, name: &str) -> Result<&[Value]> {
        self.field(name)?
            .as_array()
            .ok_or_else(|| Error::mismatch(name, "array"))
    }

    pub fn lazy_array(&self, name: &str) -> Result<&Rc<LazyArrayValue>> {
        self.field(name)?
            .as_lazy_array()
            .ok_or_else(|| Error::mismatch(name, "lazy array"))
    }

    pub fn flags(&self, name: &str) -> Result<&Flags> {
        self.field(name)?
            .as_flags()
            .ok_or_else(|| Error::mismatch(name, "flags"))
    }

    /// Integer elements of an array field.
    pub fn ints(&self, name: &str) -> Result<Vec<i64>> {
        self.array(name)?
            .iter()
            .map(|v| v.as_int().ok_or_else(|| Error::mismatch(name, "integer array")))
            .collect()
    }
}

/// Named boolean flags decoded from an integer, least significant bit first.
#[derive(Debug, Clone, PartialEq)]
pub struct Flags {
    pub(crate) raw: i64,
    pub(crate) names: Vec<(&'static str, bool)>,
}

impl Flags {
    pub fn raw(&self) -> i64 {
        self.raw
    }

    pub fn get(&self, name: &str) -> bool {
        self.names.iter().any(|(n, set)| *n == name && *set)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.names.iter().copied()
    }
}

/// An insertion ordered mapping from four byte table tags to values. Inserting an existing tag
/// replaces the value in place.
#[derive(Clone, Default)]
pub struct TagMap {
    entries: Vec<(String, Value)>,
}

impl TagMap {
    pub fn new() -> Self {
        TagMap::default()
    }

    pub fn insert(&mut self, tag: String, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((tag, value));
                None
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.entries.iter().find(|(t, _)| t == tag).map(|(_, v)| v)
    }

    pub fn contains_key(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TagMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
