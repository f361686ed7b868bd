use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

use crate::decompress::Decompressor;
use crate::error::{Error, Result};
use crate::font::Font;
use crate::schema::{Struct, Type, Value};
use crate::stream::DecodeStream;
use crate::tables::ttc::HEADER;

/// A TrueType collection: several fonts sharing one file. Fonts are opened on request.
/// See spec: https://docs.microsoft.com/en-us/typography/opentype/spec/otff#collections
pub struct TrueTypeCollection {
    stream: DecodeStream,
    header: Rc<Struct>,
    /// Absolute offsets of the table directories of the fonts.
    offsets: Vec<usize>,
    decompressor: Rc<dyn Decompressor>,
}

impl TrueTypeCollection {
    pub(crate) fn new(stream: DecodeStream, decompressor: Rc<dyn Decompressor>) -> Result<Self> {
        let mut cursor = stream.clone();
        cursor.seek(0)?;
        let tag = cursor.read_tag()?;
        if tag != "ttcf" {
            return Err(Error::UnknownFormat);
        }
        let header = match HEADER.decode(&mut cursor, None)? {
            Value::Struct(header) => header,
            _ => return Err(Error::mismatch("ttcf", "struct")),
        };
        let offsets = header
            .ints("offsets")?
            .into_iter()
            .map(|offset| {
                usize::try_from(offset).map_err(|_| Error::invalid("negative font offset"))
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "collection version {:#x} with {} fonts",
            header.int("version")?,
            offsets.len()
        );
        Ok(TrueTypeCollection {
            stream,
            header,
            offsets,
            decompressor,
        })
    }

    pub fn version(&self) -> u32 {
        self.header.int("version").map_or(0, |version| version as u32)
    }

    pub fn num_fonts(&self) -> usize {
        self.offsets.len()
    }

    /// Opens the font at an index, `None` for indices past the last font.
    pub fn font(&self, index: usize) -> Result<Option<Font>> {
        let offset = match self.offsets.get(index) {
            Some(offset) => *offset,
            None => return Ok(None),
        };
        Font::open_at(self.stream.clone(), offset, self.decompressor.clone()).map(Some)
    }

    /// Opens all fonts in order.
    pub fn fonts(&self) -> Result<Vec<Font>> {
        self.offsets
            .iter()
            .map(|offset| Font::open_at(self.stream.clone(), *offset, self.decompressor.clone()))
            .collect()
    }

    /// The first font with the given PostScript name. Fonts that fail to open are skipped.
    pub fn font_by_name(&self, postscript_name: &str) -> Result<Option<Font>> {
        for (index, offset) in self.offsets.iter().enumerate() {
            let font = match Font::open_at(self.stream.clone(), *offset, self.decompressor.clone())
            {
                Ok(font) => font,
                Err(err) => {
                    log::warn!("skipping font {} of collection: {}", index, err);
                    continue;
                }
            };
            if font.postscript_name().as_deref() == Some(postscript_name) {
                return Ok(Some(font));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for TrueTypeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeCollection")
            .field("version", &self.version())
            .field("offsets", &self.offsets)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decompress::DefaultDecompressor;
    use fontdecode_test_data::{sample, ttc};
    use pretty_assertions::assert_eq;

    fn collection(names: &[&str]) -> TrueTypeCollection {
        let fonts: Vec<_> = names.iter().map(|name| sample::font(name)).collect();
        let data = ttc::collection(&fonts);
        TrueTypeCollection::new(DecodeStream::new(data), Rc::new(DefaultDecompressor)).unwrap()
    }

    #[test]
    fn test_open_fonts() {
        let collection = collection(&["Sample-Regular", "Sample-Bold"]);
        assert_eq!(collection.version(), 0x0001_0000);
        assert_eq!(collection.num_fonts(), 2);
        let names: Vec<_> = collection
            .fonts()
            .unwrap()
            .iter()
            .map(|font| font.postscript_name().unwrap())
            .collect();
        assert_eq!(names, vec!["Sample-Regular", "Sample-Bold"]);
        assert!(collection.font(2).unwrap().is_none());
    }

    #[test]
    fn test_font_by_name() {
        let collection = collection(&["Sample-Regular", "Sample-Bold"]);
        let font = collection.font_by_name("Sample-Bold").unwrap().unwrap();
        assert_eq!(font.full_name().as_deref(), Some("Sample Bold"));
        assert!(collection.font_by_name("Sample-Light").unwrap().is_none());
    }

    #[test]
    fn test_not_a_collection() {
        let data = sample::font("Sample-Regular").build();
        assert!(matches!(
            TrueTypeCollection::new(DecodeStream::new(data), Rc::new(DefaultDecompressor)),
            Err(Error::UnknownFormat)
        ));
    }
}
