use std::convert::TryFrom;

use once_cell::sync::Lazy;

use super::{int, FontTable};
use crate::encodings::Encoding;
use crate::error::Result;
use crate::schema::{
    field, type_ref, Array, Fixed, Length, Number, Struct, Text, TypeRef, VersionedStructure,
};

static POST: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(
        VersionedStructure::inline(Number::U32)
            .header(vec![
                field("italicAngle", Fixed::FIXED32),
                field("underlinePosition", Number::I16),
                field("underlineThickness", Number::I16),
                field("isFixedPitch", Number::U32),
                field("minMemType42", Number::U32),
                field("maxMemType42", Number::U32),
                field("minMemType1", Number::U32),
                field("maxMemType1", Number::U32),
            ])
            .version(0x0001_0000, vec![])
            .version(
                0x0002_0000,
                vec![
                    field("numberOfGlyphs", Number::U16),
                    field("glyphNameIndex", Array::new(Number::U16, "numberOfGlyphs")),
                    field(
                        "names",
                        Array::unbounded(Text::new(Number::U8, Encoding::Ascii)),
                    ),
                ],
            )
            .version(
                0x0002_5000,
                vec![
                    field("numberOfGlyphs", Number::U16),
                    field("offsets", Array::new(Number::I8, "numberOfGlyphs")),
                ],
            )
            .version(0x0003_0000, vec![])
            .version(
                0x0004_0000,
                vec![field(
                    "map",
                    Array::new(
                        Number::U16,
                        Length::Callback(|ctx| ctx.parent_int("maxp.numGlyphs")),
                    ),
                )],
            ),
    )
});

#[derive(Debug, PartialEq, Clone)]
enum GlyphNames {
    /// Version 1.0: the standard Macintosh glyph order.
    Standard,
    /// Version 2.0: indices into the standard names, followed by custom names.
    Indexed { indices: Vec<u16>, names: Vec<String> },
    /// Version 2.5: offsets into the standard names.
    Offsets(Vec<i8>),
    None,
}

/// This table contains additional information needed to use TrueType or OpenType fonts on
/// PostScript printers.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/post
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6post.html
#[derive(Debug, PartialEq, Clone)]
pub struct PostTable {
    /// 0x00010000, 0x00020000, 0x00025000, 0x00030000 or 0x00040000.
    pub(crate) version: u32,
    /// Italic angle in counter-clockwise degrees from the vertical. Zero for upright text, negative
    /// for text that leans to the right (forward).
    pub(crate) italic_angle: f64,
    /// This is the suggested distance of the top of the underline from the baseline (negative
    /// values indicate below baseline).
    pub(crate) underline_position: i16,
    /// Suggested values for the underline thickness.
    pub(crate) underline_thickness: i16,
    /// Set to 0 if the font is proportionally spaced, non-zero if the font is not proportionally
    /// spaced (i.e. monospaced).
    pub(crate) is_fixed_pitch: bool,
    glyph_names: GlyphNames,
}

impl PostTable {
    pub fn italic_angle(&self) -> f64 {
        self.italic_angle
    }

    pub fn underline_position(&self) -> i16 {
        self.underline_position
    }

    pub fn underline_thickness(&self) -> i16 {
        self.underline_thickness
    }

    pub fn is_fixed_pitch(&self) -> bool {
        self.is_fixed_pitch
    }

    /// PostScript name of a glyph, if the table version stores glyph names.
    pub fn glyph_name(&self, glyph_id: u16) -> Option<&str> {
        let gid = usize::from(glyph_id);
        match &self.glyph_names {
            GlyphNames::Standard => STANDARD_NAMES.get(gid).copied(),
            GlyphNames::Indexed { indices, names } => {
                let index = usize::from(*indices.get(gid)?);
                if index < STANDARD_NAMES.len() {
                    Some(STANDARD_NAMES[index])
                } else {
                    names.get(index - STANDARD_NAMES.len()).map(String::as_str)
                }
            }
            GlyphNames::Offsets(offsets) => {
                let index = gid as i64 + i64::from(*offsets.get(gid)?);
                STANDARD_NAMES.get(usize::try_from(index).ok()?).copied()
            }
            GlyphNames::None => None,
        }
    }
}

impl FontTable for PostTable {
    const TAG: &'static str = "post";

    fn schema() -> &'static TypeRef {
        &POST
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        let version: u32 = int(table, "version")?;
        let glyph_names = match version {
            0x0001_0000 => GlyphNames::Standard,
            0x0002_0000 => GlyphNames::Indexed {
                indices: table
                    .ints("glyphNameIndex")?
                    .into_iter()
                    .map(|i| i as u16)
                    .collect(),
                names: table
                    .array("names")?
                    .iter()
                    .filter_map(|name| name.as_str().map(String::from))
                    .collect(),
            },
            0x0002_5000 => {
                GlyphNames::Offsets(table.ints("offsets")?.into_iter().map(|o| o as i8).collect())
            }
            _ => GlyphNames::None,
        };
        Ok(PostTable {
            version,
            italic_angle: table.float("italicAngle")?,
            underline_position: int(table, "underlinePosition")?,
            underline_thickness: int(table, "underlineThickness")?,
            is_fixed_pitch: table.int("isFixedPitch")? != 0,
            glyph_names,
        })
    }
}

/// The 258 glyph names of the standard Macintosh glyph order.
static STANDARD_NAMES: [&str; 258] = [
    ".notdef", ".null", "nonmarkingreturn", "space", "exclam", "quotedbl", "numbersign", "dollar",
    "percent", "ampersand", "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma",
    "hyphen", "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question", "at", "A", "B",
    "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U",
    "V", "W", "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum",
    "underscore", "grave", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
    "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "braceleft", "bar", "braceright",
    "asciitilde", "Adieresis", "Aring", "Ccedilla", "Eacute", "Ntilde", "Odieresis", "Udieresis",
    "aacute", "agrave", "acircumflex", "adieresis", "atilde", "aring", "ccedilla", "eacute",
    "egrave", "ecircumflex", "edieresis", "iacute", "igrave", "icircumflex", "idieresis", "ntilde",
    "oacute", "ograve", "ocircumflex", "odieresis", "otilde", "uacute", "ugrave", "ucircumflex",
    "udieresis", "dagger", "degree", "cent", "sterling", "section", "bullet", "paragraph",
    "germandbls", "registered", "copyright", "trademark", "acute", "dieresis", "notequal", "AE",
    "Oslash", "infinity", "plusminus", "lessequal", "greaterequal", "yen", "mu", "partialdiff",
    "summation", "product", "pi", "integral", "ordfeminine", "ordmasculine", "Omega", "ae",
    "oslash", "questiondown", "exclamdown", "logicalnot", "radical", "florin", "approxequal",
    "Delta", "guillemotleft", "guillemotright", "ellipsis", "nonbreakingspace", "Agrave", "Atilde",
    "Otilde", "OE", "oe", "endash", "emdash", "quotedblleft", "quotedblright", "quoteleft",
    "quoteright", "divide", "lozenge", "ydieresis", "Ydieresis", "fraction", "currency",
    "guilsinglleft", "guilsinglright", "fi", "fl", "daggerdbl", "periodcentered", "quotesinglbase",
    "quotedblbase", "perthousand", "Acircumflex", "Ecircumflex", "Aacute", "Edieresis", "Egrave",
    "Iacute", "Icircumflex", "Idieresis", "Igrave", "Oacute", "Ocircumflex", "apple", "Ograve",
    "Uacute", "Ucircumflex", "Ugrave", "dotlessi", "circumflex", "tilde", "macron", "breve",
    "dotaccent", "ring", "cedilla", "hungarumlaut", "ogonek", "caron", "Lslash", "lslash", "Scaron",
    "scaron", "Zcaron", "zcaron", "brokenbar", "Eth", "eth", "Yacute", "yacute", "Thorn", "thorn",
    "minus", "multiply", "onesuperior", "twosuperior", "threesuperior", "onehalf", "onequarter",
    "threequarters", "franc", "Gbreve", "gbreve", "Idotaccent", "Scedilla", "scedilla", "Cacute",
    "cacute", "Ccaron", "ccaron", "dcroat",
];

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Type;
    use crate::stream::DecodeStream;
    use fontdecode_test_data::tables::{post_v2, post_v3};
    use pretty_assertions::assert_eq;

    fn decode(data: Vec<u8>) -> PostTable {
        let len = data.len();
        let mut stream = DecodeStream::new(data);
        let value = PostTable::schema()
            .decode_with_length(&mut stream, None, len)
            .unwrap();
        PostTable::from_struct(value.as_struct().unwrap()).unwrap()
    }

    #[test]
    fn test_post_v3() {
        let table = decode(post_v3(-12.5, -75, 50, true));
        assert_eq!(table.version, 0x0003_0000);
        assert_eq!(table.italic_angle(), -12.5);
        assert_eq!(table.underline_position(), -75);
        assert_eq!(table.underline_thickness(), 50);
        assert!(table.is_fixed_pitch());
        assert_eq!(table.glyph_name(1), None);
    }

    #[test]
    fn test_post_v2_names() {
        let table = decode(post_v2(&[0, 36, 258, 259], &["A.alt", "foo"]));
        assert_eq!(table.glyph_name(0), Some(".notdef"));
        assert_eq!(table.glyph_name(1), Some("A"));
        assert_eq!(table.glyph_name(2), Some("A.alt"));
        assert_eq!(table.glyph_name(3), Some("foo"));
        assert_eq!(table.glyph_name(4), None);
    }

    #[test]
    fn test_standard_names() {
        assert_eq!(STANDARD_NAMES[3], "space");
        assert_eq!(STANDARD_NAMES[68], "a");
        assert_eq!(STANDARD_NAMES[257], "dcroat");
    }
}
