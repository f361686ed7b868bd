//! Decoding of TrueType and OpenType fonts, WOFF and WOFF2 web fonts and TrueType collections.
//!
//! Tables are described by declarative schemas (see [`schema`]) and decoded lazily on first
//! access. A table that fails to decode is logged and reads as absent, so a single broken table
//! does not prevent using the rest of a font.
//!
//! ```ignore
//! let font = fontdecode::create(data, None)?.into_font().unwrap();
//! let glyphs = font.glyphs_for_string("Hello")?;
//! ```

pub mod cmap;
mod collection;
mod decompress;
pub mod encodings;
mod error;
mod font;
mod glyph;
mod path;
pub mod schema;
pub mod stream;
pub mod tables;
pub mod woff2;

pub use cmap::CmapProcessor;
pub use collection::TrueTypeCollection;
pub use decompress::{Decompressor, DefaultDecompressor};
pub use error::{Error, Result};
pub use font::{create, AnyFont, Flavor, Font, Format, OpenOptions};
pub use glyph::Glyph;
pub use path::{Path, PathCommand};
pub use tables::glyf::{Component, Outline, Point};
