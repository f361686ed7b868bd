use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::cmap::CmapProcessor;
use crate::collection::TrueTypeCollection;
use crate::decompress::{Decompressor, DefaultDecompressor};
use crate::error::{Error, Result};
use crate::glyph::Glyph;
use crate::schema::{Context, Frame, Resolve, Type, TypeRef, Value};
use crate::stream::DecodeStream;
use crate::tables::cmap::CmapTable;
use crate::tables::directory::{self, TableDirectory, TableRecord};
use crate::tables::glyf::GlyfTable;
use crate::tables::head::HeadTable;
use crate::tables::hhea::HheaTable;
use crate::tables::hmtx::HmtxTable;
use crate::tables::loca::LocaTable;
use crate::tables::maxp::MaxpTable;
use crate::tables::name::{name_id, NameTable};
use crate::tables::os2::Os2Table;
use crate::tables::post::PostTable;
use crate::tables::{schema_for, woff, woff2, FontTable};
use crate::woff2::{reconstruct_glyf, Payload};

/// Tables that can be decoded by tag.
const KNOWN_TABLES: [&str; 9] = [
    "head", "hhea", "maxp", "hmtx", "loca", "cmap", "OS/2", "post", "name",
];

/// Variation selectors U+FE00..U+FE0F and U+E0100..U+E01EF.
fn is_variation_selector(code_point: u32) -> bool {
    (0xfe00..=0xfe0f).contains(&code_point) || (0xe0100..=0xe01ef).contains(&code_point)
}

/// A font file format, recognized by the first four bytes of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// TrueType or OpenType font.
    Sfnt,
    Woff,
    Woff2,
    /// TrueType collection.
    Collection,
}

impl Format {
    pub fn probe(data: &[u8]) -> Option<Format> {
        match data.get(..4)? {
            b"true" | b"OTTO" | [0x00, 0x01, 0x00, 0x00] => Some(Format::Sfnt),
            b"wOFF" => Some(Format::Woff),
            b"wOF2" => Some(Format::Woff2),
            b"ttcf" => Some(Format::Collection),
            _ => None,
        }
    }
}

/// The container a single font's tables are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Sfnt,
    Woff,
    Woff2,
}

enum Container {
    Sfnt,
    Woff,
    Woff2(Payload),
}

/// A single font. Tables are decoded on first access and cached.
pub struct Font {
    stream: DecodeStream,
    /// Offset of the font's directory; non-zero for fonts inside a collection.
    start: usize,
    container: Container,
    directory: TableDirectory,
    decompressor: Rc<dyn Decompressor>,
    /// Decoded known tables. `None` once decoding failed.
    tables: HashMap<&'static str, OnceCell<Option<Value>>>,
    glyf: OnceCell<GlyfTable>,
    cmap: OnceCell<CmapProcessor>,
}

impl Font {
    pub(crate) fn open_at(
        stream: DecodeStream,
        start: usize,
        decompressor: Rc<dyn Decompressor>,
    ) -> Result<Self> {
        let flavor = match Format::probe(stream.buffer().get(start..).unwrap_or(&[])) {
            Some(Format::Sfnt) => Flavor::Sfnt,
            Some(Format::Woff) => Flavor::Woff,
            Some(Format::Woff2) => Flavor::Woff2,
            Some(Format::Collection) | None => return Err(Error::UnknownFormat),
        };
        let schema: &TypeRef = match flavor {
            Flavor::Sfnt => &*directory::DIRECTORY,
            Flavor::Woff => &*woff::DIRECTORY,
            Flavor::Woff2 => &*woff2::DIRECTORY,
        };

        let mut cursor = stream.clone();
        cursor.seek(start)?;
        // table offsets are relative to the start of the file, also inside collections
        let root = Context::from_frame(
            Frame {
                start_offset: Some(0),
                length: 0,
            },
            None,
        );
        let directory = TableDirectory::from_value(schema.decode(&mut cursor, Some(&root))?)?;
        log::debug!(
            "decoded {:?} directory with {} tables at {}",
            flavor,
            directory.records().len(),
            start
        );

        let container = match flavor {
            Flavor::Sfnt => Container::Sfnt,
            Flavor::Woff => Container::Woff,
            Flavor::Woff2 => {
                if directory.flavor == Some(u32::from_be_bytes(*b"ttcf")) {
                    return Err(Error::invalid("WOFF2 collections are not supported"));
                }
                let raw = directory.raw();
                Container::Woff2(Payload::new(
                    stream.clone(),
                    cursor.pos(),
                    raw.int("totalCompressedSize")? as usize,
                    raw.int("uncompressedSize")? as usize,
                ))
            }
        };

        let tables = KNOWN_TABLES
            .iter()
            .filter(|tag| directory.record(tag).map_or(false, |r| r.length > 0))
            .map(|tag| (*tag, OnceCell::new()))
            .collect();

        Ok(Font {
            stream,
            start,
            container,
            directory,
            decompressor,
            tables,
            glyf: OnceCell::new(),
            cmap: OnceCell::new(),
        })
    }

    pub fn flavor(&self) -> Flavor {
        match self.container {
            Container::Sfnt => Flavor::Sfnt,
            Container::Woff => Flavor::Woff,
            Container::Woff2(_) => Flavor::Woff2,
        }
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    pub fn has_table(&self, tag: &str) -> bool {
        self.directory.record(tag).is_some()
    }

    /// Whether a known table has been decoded, successfully or not.
    pub fn is_table_decoded(&self, tag: &str) -> bool {
        self.tables.get(tag).map_or(false, |cell| cell.get().is_some())
    }

    /// Whether the Brotli payload of a WOFF2 font has been decompressed.
    pub fn is_decompressed(&self) -> bool {
        match &self.container {
            Container::Woff2(payload) => payload.is_decompressed(),
            _ => true,
        }
    }

    /// A stream positioned at the start of a table's data.
    fn table_stream(&self, record: &TableRecord) -> Result<DecodeStream> {
        match &self.container {
            Container::Sfnt => {
                let mut stream = self.stream.clone();
                stream.seek(record.offset)?;
                Ok(stream)
            }
            Container::Woff => {
                let mut stream = self.stream.clone();
                stream.seek(record.offset)?;
                if record.stored_length >= record.length {
                    return Ok(stream);
                }
                let compressed = stream.read_bytes(record.stored_length)?;
                // skip the zlib header
                let deflated = compressed
                    .get(2..)
                    .ok_or_else(|| Error::invalid(format!("truncated `{}` table", record.tag)))?;
                let data = self
                    .decompressor
                    .inflate(&record.tag, deflated, record.length)?;
                log::trace!("inflated `{}` to {} bytes", record.tag, data.len());
                Ok(DecodeStream::new(data))
            }
            Container::Woff2(payload) => {
                let mut stream = payload.stream(self.decompressor.as_ref())?.clone();
                stream.seek(record.offset)?;
                Ok(stream)
            }
        }
    }

    fn decode_table(&self, tag: &str) -> Result<Option<Value>> {
        let (record, schema) = match (self.directory.record(tag), schema_for(tag)) {
            (Some(record), Some(schema)) => (record, schema),
            _ => return Ok(None),
        };
        if record.transformed {
            // a transformed `loca` is rebuilt together with `glyf`
            if tag == "loca" {
                return Ok(None);
            }
            return Err(Error::invalid(format!(
                "transformed `{}` table is not supported",
                tag
            )));
        }

        let mut stream = self.table_stream(record)?;
        let root = Context::root(self);
        let value = schema.decode_with_length(&mut stream, Some(&root), record.length)?;
        log::debug!("decoded table `{}` ({} bytes)", tag, record.length);
        Ok(Some(value))
    }

    /// The decoded structure of a known table. Tables that are missing or fail to decode read as
    /// `None`; decode failures are logged.
    pub fn table(&self, tag: &str) -> Option<Value> {
        let cell = self.tables.get(tag)?;
        cell.get_or_init(|| match self.decode_table(tag) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("failed to decode table `{}`: {}", tag, err);
                None
            }
        })
        .clone()
    }

    /// A typed view of a known table.
    pub fn table_as<T: FontTable>(&self) -> Option<T> {
        let value = self.table(T::TAG)?;
        match T::from_struct(value.as_struct()?) {
            Ok(table) => Some(table),
            Err(err) => {
                log::warn!("invalid table `{}`: {}", T::TAG, err);
                None
            }
        }
    }

    fn required<T: FontTable>(&self) -> Result<T> {
        self.table_as().ok_or(Error::MissingTable(T::TAG))
    }

    /// The glyph outlines, either sliced through `loca` or reconstructed from a transformed WOFF2
    /// `glyf` table.
    pub fn glyf(&self) -> Result<&GlyfTable> {
        self.glyf.get_or_try_init(|| {
            let record = self
                .directory
                .record("glyf")
                .ok_or(Error::MissingTable("glyf"))?;
            let mut stream = self.table_stream(record)?;
            if record.transformed {
                return Ok(GlyfTable::Reconstructed(reconstruct_glyf(&mut stream)?));
            }
            let loca = self.required::<LocaTable>()?;
            let data = stream.read_buffer(record.length)?;
            Ok(GlyfTable::Raw { data, loca })
        })
    }

    /// The character map processor over the preferred `cmap` subtable.
    pub fn cmap(&self) -> Result<&CmapProcessor> {
        self.cmap
            .get_or_try_init(|| CmapProcessor::new(&self.required::<CmapTable>()?))
    }

    fn name(&self, name_id: u16) -> Option<String> {
        self.table_as::<NameTable>()?
            .get(name_id)
            .map(String::from)
    }

    pub fn postscript_name(&self) -> Option<String> {
        self.name(name_id::POSTSCRIPT_NAME)
    }

    pub fn full_name(&self) -> Option<String> {
        self.name(name_id::FULL_NAME)
    }

    pub fn family_name(&self) -> Option<String> {
        self.name(name_id::FAMILY)
    }

    pub fn subfamily_name(&self) -> Option<String> {
        self.name(name_id::SUBFAMILY)
    }

    pub fn copyright(&self) -> Option<String> {
        self.name(name_id::COPYRIGHT)
    }

    pub fn version(&self) -> Option<String> {
        self.name(name_id::VERSION)
    }

    pub fn units_per_em(&self) -> Result<u16> {
        Ok(self.required::<HeadTable>()?.units_per_em())
    }

    pub fn ascent(&self) -> Result<i16> {
        Ok(self.required::<HheaTable>()?.ascent())
    }

    pub fn descent(&self) -> Result<i16> {
        Ok(self.required::<HheaTable>()?.descent())
    }

    pub fn line_gap(&self) -> Result<i16> {
        Ok(self.required::<HheaTable>()?.line_gap())
    }

    pub fn underline_position(&self) -> Option<i16> {
        self.table_as::<PostTable>()
            .map(|post| post.underline_position())
    }

    pub fn underline_thickness(&self) -> Option<i16> {
        self.table_as::<PostTable>()
            .map(|post| post.underline_thickness())
    }

    pub fn italic_angle(&self) -> Option<f64> {
        self.table_as::<PostTable>().map(|post| post.italic_angle())
    }

    /// Height of capital letters above the baseline. Falls back to the ascent for `OS/2` tables
    /// older than version 2.
    pub fn cap_height(&self) -> Result<i16> {
        match self.table_as::<Os2Table>().and_then(|os2| os2.cap_height()) {
            Some(cap_height) => Ok(cap_height),
            None => self.ascent(),
        }
    }

    /// Height of lower case letters. Zero if the `OS/2` table does not define it.
    pub fn x_height(&self) -> i16 {
        self.table_as::<Os2Table>()
            .and_then(|os2| os2.x_height())
            .unwrap_or(0)
    }

    pub fn num_glyphs(&self) -> Result<u16> {
        Ok(self.required::<MaxpTable>()?.num_glyphs())
    }

    /// Bounding box `[x_min, y_min, x_max, y_max]` of all glyphs.
    pub fn bbox(&self) -> Result<[i16; 4]> {
        Ok(self.required::<HeadTable>()?.bbox())
    }

    /// All code points the font maps, sorted.
    pub fn character_set(&self) -> Result<Vec<u32>> {
        self.cmap()?.character_set()
    }

    pub fn has_glyph_for_code_point(&self, code_point: u32) -> Result<bool> {
        Ok(self.cmap()?.lookup(code_point, None)? != 0)
    }

    /// The glyph a code point maps to, the `.notdef` glyph for unmapped code points.
    pub fn glyph_for_code_point(&self, code_point: u32) -> Result<Option<Glyph>> {
        let glyph_id = self.cmap()?.lookup(code_point, None)?;
        let mut glyph = self.glyph(glyph_id)?;
        if let Some(glyph) = &mut glyph {
            glyph.code_points = vec![code_point];
        }
        Ok(glyph)
    }

    /// Maps each character of a string to a glyph. A character followed by a variation selector
    /// is looked up as a variation sequence. Selectors without a base character are skipped.
    pub fn glyphs_for_string(&self, text: &str) -> Result<Vec<Glyph>> {
        let cmap = self.cmap()?;
        let mut glyphs = Vec::new();
        let mut chars = text.chars().map(u32::from).peekable();
        while let Some(code_point) = chars.next() {
            if is_variation_selector(code_point) {
                log::trace!("skipping variation selector U+{:04X}", code_point);
                continue;
            }
            let selector = chars.next_if(|next| is_variation_selector(*next));
            let glyph_id = cmap.lookup(code_point, selector)?;
            if let Some(mut glyph) = self.glyph(glyph_id)? {
                glyph.code_points = std::iter::once(code_point).chain(selector).collect();
                glyphs.push(glyph);
            }
        }
        Ok(glyphs)
    }

    /// A glyph by id, `None` for ids past the last glyph.
    pub fn glyph(&self, glyph_id: u16) -> Result<Option<Glyph>> {
        let glyf = self.glyf()?;
        let data = match glyf.glyph(glyph_id)? {
            Some(data) => data,
            None => return Ok(None),
        };
        let advance_width = self
            .table_as::<HmtxTable>()
            .and_then(|hmtx| hmtx.advance_width(glyph_id).ok())
            .unwrap_or(0);
        let name = self
            .table_as::<PostTable>()
            .and_then(|post| post.glyph_name(glyph_id).map(String::from));
        Glyph::new(glyf, glyph_id, data, advance_width, name).map(Some)
    }
}

impl Resolve for Font {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.table(name)
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("flavor", &self.flavor())
            .field("start", &self.start)
            .field("tables", &self.directory.records().len())
            .finish()
    }
}

/// Either a single font or a collection of fonts.
#[derive(Debug)]
pub enum AnyFont {
    Single(Font),
    Collection(TrueTypeCollection),
}

impl AnyFont {
    pub fn into_font(self) -> Option<Font> {
        match self {
            AnyFont::Single(font) => Some(font),
            AnyFont::Collection(_) => None,
        }
    }

    pub fn into_collection(self) -> Option<TrueTypeCollection> {
        match self {
            AnyFont::Collection(collection) => Some(collection),
            AnyFont::Single(_) => None,
        }
    }
}

/// Options for opening a font file.
///
/// ```ignore
/// let font = OpenOptions::new().postscript_name("Sample-Bold").open(data)?;
/// ```
#[derive(Clone)]
pub struct OpenOptions {
    postscript_name: Option<String>,
    decompressor: Rc<dyn Decompressor>,
}

impl OpenOptions {
    pub fn new() -> Self {
        OpenOptions {
            postscript_name: None,
            decompressor: Rc::new(DefaultDecompressor),
        }
    }

    /// Selects the font with this PostScript name. For single fonts, opening fails when the name
    /// does not match.
    pub fn postscript_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.postscript_name = Some(name.into());
        self
    }

    /// Replaces the Brotli and zlib implementation.
    pub fn decompressor(&mut self, decompressor: impl Decompressor + 'static) -> &mut Self {
        self.decompressor = Rc::new(decompressor);
        self
    }

    pub fn open(&self, data: impl Into<Rc<[u8]>>) -> Result<AnyFont> {
        let stream = DecodeStream::new(data);
        let format = Format::probe(stream.buffer()).ok_or(Error::UnknownFormat)?;
        log::debug!("opening {:?} font of {} bytes", format, stream.len());
        let font = match format {
            Format::Collection => AnyFont::Collection(TrueTypeCollection::new(
                stream,
                self.decompressor.clone(),
            )?),
            _ => AnyFont::Single(Font::open_at(stream, 0, self.decompressor.clone())?),
        };

        let name = match &self.postscript_name {
            Some(name) => name,
            None => return Ok(font),
        };
        match font {
            AnyFont::Collection(collection) => collection
                .font_by_name(name)?
                .map(AnyFont::Single)
                .ok_or_else(|| Error::FontNotFound(name.clone())),
            AnyFont::Single(font) => {
                if font.postscript_name().as_deref() == Some(name.as_str()) {
                    Ok(AnyFont::Single(font))
                } else {
                    Err(Error::FontNotFound(name.clone()))
                }
            }
        }
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions::new()
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("postscript_name", &self.postscript_name)
            .finish()
    }
}

/// Opens a font file with the default decompressor. For collections, `postscript_name` selects
/// a single font.
pub fn create(data: impl Into<Rc<[u8]>>, postscript_name: Option<&str>) -> Result<AnyFont> {
    let mut options = OpenOptions::new();
    if let Some(name) = postscript_name {
        options.postscript_name(name);
    }
    options.open(data)
}

#[cfg(test)]
mod test {
    use super::*;
    use fontdecode_test_data::sample;
    use pretty_assertions::assert_eq;

    fn sample_font() -> Font {
        let data = sample::font("Sample-Regular").build();
        Font::open_at(DecodeStream::new(data), 0, Rc::new(DefaultDecompressor)).unwrap()
    }

    #[test]
    fn test_probe() {
        assert_eq!(Format::probe(b"true...."), Some(Format::Sfnt));
        assert_eq!(Format::probe(b"OTTO"), Some(Format::Sfnt));
        assert_eq!(Format::probe(&[0, 1, 0, 0, 0, 9]), Some(Format::Sfnt));
        assert_eq!(Format::probe(b"wOFF"), Some(Format::Woff));
        assert_eq!(Format::probe(b"wOF2"), Some(Format::Woff2));
        assert_eq!(Format::probe(b"ttcf"), Some(Format::Collection));
        assert_eq!(Format::probe(b"wOF"), None);
        assert_eq!(Format::probe(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_tables_are_decoded_on_demand() {
        let font = sample_font();
        assert!(!font.is_table_decoded("head"));
        assert_eq!(font.units_per_em().unwrap(), sample::UNITS_PER_EM);
        assert!(font.is_table_decoded("head"));
        assert!(!font.is_table_decoded("cmap"));
        assert!(!font.is_table_decoded("glyf"));
    }

    #[test]
    fn test_hmtx_resolves_counts_through_font() {
        let font = sample_font();
        let hmtx = font.table_as::<HmtxTable>().unwrap();
        assert_eq!(hmtx.advance_width(0).unwrap(), sample::NOTDEF_ADVANCE);
        assert!(font.is_table_decoded("hhea"));
        assert!(font.is_table_decoded("maxp"));
    }

    #[test]
    fn test_unknown_tables_are_not_decoded() {
        let font = sample_font();
        assert!(font.has_table("glyf"));
        assert!(font.table("glyf").is_none());
        assert!(font.table("GSUB").is_none());
    }

    #[test]
    fn test_glyphs_for_string_pairs_variation_selectors() {
        let font = sample_font();
        let glyphs = font.glyphs_for_string("\u{fe0f}A\u{fe0f}\u{20ac}B").unwrap();
        let ids: Vec<_> = glyphs.iter().map(|g| g.id()).collect();
        assert_eq!(ids, vec![sample::A, sample::EURO, sample::A + 1]);
        assert_eq!(glyphs[0].code_points(), &[0x41, 0xfe0f]);
        assert_eq!(glyphs[1].code_points(), &[0x20ac]);
    }
}
