use super::value::{Struct, Value};
use crate::error::{Error, Result};

/// Offsets of an enclosing decode scope that outlive the decode call itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// `None` for the font root.
    pub start_offset: Option<usize>,
    pub length: usize,
}

/// The root of a decode chain, usually the font. Resolves top-level names such as table tags.
pub trait Resolve {
    fn resolve(&self, name: &str) -> Option<Value>;
}

#[derive(Clone, Copy)]
enum Scope<'a> {
    Struct(&'a Struct),
    Frame(Frame),
    Root(&'a dyn Resolve),
}

/// The chain of enclosing scopes visible to a descriptor while it decodes. Each link borrows its
/// parent, so a context only lives as long as the decode call that created it.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    scope: Scope<'a>,
    parent: Option<&'a Context<'a>>,
}

impl<'a> Context<'a> {
    pub fn root(root: &'a dyn Resolve) -> Self {
        Context {
            scope: Scope::Root(root),
            parent: None,
        }
    }

    pub fn from_frame(frame: Frame, parent: Option<&'a Context<'a>>) -> Self {
        Context {
            scope: Scope::Frame(frame),
            parent,
        }
    }

    pub(crate) fn for_struct(value: &'a Struct, parent: Option<&'a Context<'a>>) -> Self {
        Context {
            scope: Scope::Struct(value),
            parent,
        }
    }

    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    pub fn start_offset(&self) -> Option<usize> {
        match self.scope {
            Scope::Struct(s) => Some(s.start_offset),
            Scope::Frame(f) => f.start_offset,
            Scope::Root(_) => None,
        }
    }

    pub fn length(&self) -> usize {
        match self.scope {
            Scope::Struct(s) => s.length,
            Scope::Frame(f) => f.length,
            Scope::Root(_) => 0,
        }
    }

    pub fn current_offset(&self) -> usize {
        match self.scope {
            Scope::Struct(s) => s.current_offset,
            _ => 0,
        }
    }

    pub fn frame(&self) -> Frame {
        Frame {
            start_offset: self.start_offset(),
            length: self.length(),
        }
    }

    /// A named value of this scope. Frames carry no values.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.scope {
            Scope::Struct(s) => s.get(name).cloned(),
            Scope::Frame(_) => None,
            Scope::Root(root) => root.resolve(name),
        }
    }

    /// Looks up a dotted path like `head.indexToLocFormat`, starting at this scope.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut value = self.get(first)?;
        for segment in segments {
            value = value.child(segment)?;
        }
        Some(value)
    }

    /// Integer value of a dotted path.
    pub fn int(&self, path: &str) -> Result<i64> {
        self.lookup(path)
            .ok_or_else(|| Error::missing(path))?
            .as_int()
            .ok_or_else(|| Error::mismatch(path, "integer"))
    }

    /// Integer value of a dotted path looked up from the parent scope.
    pub fn parent_int(&self, path: &str) -> Result<i64> {
        self.parent
            .ok_or_else(|| Error::missing(path))?
            .int(path)
    }

    /// Start offset of the outermost scope, the origin of global pointers.
    pub fn root_offset(&self) -> usize {
        let mut ctx = self;
        while let Some(parent) = ctx.parent {
            ctx = parent;
        }
        ctx.start_offset().unwrap_or(0)
    }

    /// Frames of this scope and all its ancestors, outermost first.
    pub fn ancestry(&self) -> Vec<Frame> {
        let mut frames = vec![self.frame()];
        let mut ctx = self;
        while let Some(parent) = ctx.parent {
            frames.push(parent.frame());
            ctx = parent;
        }
        frames.reverse();
        frames
    }
}

/// Rebuilds a context chain from frames captured with [`Context::ancestry`] and runs `f` with
/// the innermost one.
pub(crate) fn with_ancestry<R, F>(frames: &[Frame], f: F) -> R
where
    F: FnOnce(Option<&Context<'_>>) -> R,
{
    fn walk<R, F>(frames: &[Frame], parent: Option<&Context<'_>>, f: F) -> R
    where
        F: FnOnce(Option<&Context<'_>>) -> R,
    {
        match frames.split_first() {
            None => f(parent),
            Some((frame, rest)) => {
                let ctx = Context::from_frame(*frame, parent);
                walk(rest, Some(&ctx), f)
            }
        }
    }

    walk(frames, None, f)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Tables;

    impl Resolve for Tables {
        fn resolve(&self, name: &str) -> Option<Value> {
            match name {
                "count" => Some(Value::Int(7)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_lookup_through_chain() {
        let root = Tables;
        let root = Context::root(&root);
        let mut inner = Struct::new(40, 10);
        inner.set("format", Value::Int(4));
        let frame = Context::from_frame(
            Frame {
                start_offset: Some(32),
                length: 20,
            },
            Some(&root),
        );
        let ctx = Context::for_struct(&inner, Some(&frame));

        assert_eq!(ctx.int("format").unwrap(), 4);
        assert!(ctx.lookup("count").is_none());
        assert_eq!(ctx.parent().unwrap().parent().unwrap().int("count").unwrap(), 7);
        assert_eq!(ctx.root_offset(), 0);
        assert_eq!(
            ctx.ancestry(),
            vec![
                Frame {
                    start_offset: None,
                    length: 0
                },
                Frame {
                    start_offset: Some(32),
                    length: 20
                },
                Frame {
                    start_offset: Some(40),
                    length: 10
                },
            ]
        );
    }

    #[test]
    fn test_with_ancestry_restores_offsets() {
        let frames = vec![
            Frame {
                start_offset: Some(100),
                length: 0,
            },
            Frame {
                start_offset: Some(120),
                length: 8,
            },
        ];
        let (start, parent_start, root) = with_ancestry(&frames, |ctx: Option<&Context<'_>>| {
            let ctx = ctx.unwrap();
            (
                ctx.start_offset(),
                ctx.parent().and_then(|p| p.start_offset()),
                ctx.root_offset(),
            )
        });
        assert_eq!(start, Some(120));
        assert_eq!(parent_start, Some(100));
        assert_eq!(root, 100);
    }
}
