use once_cell::sync::Lazy;

use super::{int, opt_int, FontTable};
use crate::encodings::Encoding;
use crate::error::Result;
use crate::schema::{
    field, type_ref, Array, Bitfield, Field, Number, Struct, Text, TypeRef, VersionedStructure,
};

static FS_TYPE: [Option<&str>; 10] = [
    None,
    Some("noEmbedding"),
    Some("viewOnly"),
    Some("editable"),
    None,
    None,
    None,
    None,
    Some("noSubsetting"),
    Some("bitmapOnly"),
];

static FS_SELECTION: [Option<&str>; 10] = [
    Some("italic"),
    Some("underscore"),
    Some("negative"),
    Some("outlined"),
    Some("strikeout"),
    Some("bold"),
    Some("regular"),
    Some("useTypoMetrics"),
    Some("wws"),
    Some("oblique"),
];

fn version0() -> Vec<Field> {
    vec![
        field("typoAscender", Number::I16),
        field("typoDescender", Number::I16),
        field("typoLineGap", Number::I16),
        field("winAscent", Number::U16),
        field("winDescent", Number::U16),
    ]
}

fn version1() -> Vec<Field> {
    let mut fields = version0();
    fields.push(field("codePageRange", Array::new(Number::U32, 2)));
    fields
}

fn version2() -> Vec<Field> {
    let mut fields = version1();
    fields.extend(vec![
        field("xHeight", Number::I16),
        field("capHeight", Number::I16),
        field("defaultChar", Number::U16),
        field("breakChar", Number::U16),
        field("maxContent", Number::U16),
    ]);
    fields
}

fn version5() -> Vec<Field> {
    let mut fields = version2();
    fields.extend(vec![
        field("usLowerOpticalPointSize", Number::U16),
        field("usUpperOpticalPointSize", Number::U16),
    ]);
    fields
}

static OS2: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(
        VersionedStructure::inline(Number::U16)
            .header(vec![
                field("xAvgCharWidth", Number::I16),
                field("usWeightClass", Number::U16),
                field("usWidthClass", Number::U16),
                field("fsType", Bitfield::new(Number::U16, &FS_TYPE)),
                field("ySubscriptXSize", Number::I16),
                field("ySubscriptYSize", Number::I16),
                field("ySubscriptXOffset", Number::I16),
                field("ySubscriptYOffset", Number::I16),
                field("ySuperscriptXSize", Number::I16),
                field("ySuperscriptYSize", Number::I16),
                field("ySuperscriptXOffset", Number::I16),
                field("ySuperscriptYOffset", Number::I16),
                field("yStrikeoutSize", Number::I16),
                field("yStrikeoutPosition", Number::I16),
                field("sFamilyClass", Number::I16),
                field("panose", Array::new(Number::U8, 10)),
                field("ulCharRange", Array::new(Number::U32, 4)),
                field("vendorID", Text::new(4, Encoding::Ascii)),
                field("fsSelection", Bitfield::new(Number::U16, &FS_SELECTION)),
                field("usFirstCharIndex", Number::U16),
                field("usLastCharIndex", Number::U16),
            ])
            .version(0, version0())
            .version(1, version1())
            .version(2, version2())
            .version(3, version2())
            .version(4, version2())
            .version(5, version5()),
    )
});

/// The OS/2 table consists of a set of metrics and other data that are required in OpenType
/// fonts.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/os2
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6OS2.html
#[derive(Debug, PartialEq, Clone)]
pub struct Os2Table {
    pub(crate) version: u16,
    pub(crate) x_avg_char_width: i16,
    /// Visual weight (degree of blackness or thickness of strokes) of the characters.
    pub(crate) us_weight_class: u16,
    pub(crate) us_width_class: u16,
    /// Font embedding licensing rights.
    pub(crate) fs_type: u16,
    pub(crate) y_strikeout_size: i16,
    pub(crate) y_strikeout_position: i16,
    pub(crate) vendor_id: String,
    pub(crate) fs_selection: u16,
    pub(crate) s_typo_ascender: Option<i16>,
    pub(crate) s_typo_descender: Option<i16>,
    pub(crate) s_typo_line_gap: Option<i16>,
    /// Distance between the baseline and the approximate height of non-ascending lowercase
    /// letters. Since version 2.
    pub(crate) sx_height: Option<i16>,
    /// Distance between the baseline and the approximate height of uppercase letters. Since
    /// version 2.
    pub(crate) s_cap_height: Option<i16>,
}

impl Os2Table {
    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn weight_class(&self) -> u16 {
        self.us_weight_class
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    pub fn x_height(&self) -> Option<i16> {
        self.sx_height
    }

    pub fn cap_height(&self) -> Option<i16> {
        self.s_cap_height
    }
}

impl FontTable for Os2Table {
    const TAG: &'static str = "OS/2";

    fn schema() -> &'static TypeRef {
        &OS2
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        Ok(Os2Table {
            version: int(table, "version")?,
            x_avg_char_width: int(table, "xAvgCharWidth")?,
            us_weight_class: int(table, "usWeightClass")?,
            us_width_class: int(table, "usWidthClass")?,
            fs_type: table.flags("fsType")?.raw() as u16,
            y_strikeout_size: int(table, "yStrikeoutSize")?,
            y_strikeout_position: int(table, "yStrikeoutPosition")?,
            vendor_id: table.string("vendorID")?.to_string(),
            fs_selection: table.flags("fsSelection")?.raw() as u16,
            s_typo_ascender: opt_int(table, "typoAscender")?,
            s_typo_descender: opt_int(table, "typoDescender")?,
            s_typo_line_gap: opt_int(table, "typoLineGap")?,
            sx_height: opt_int(table, "xHeight")?,
            s_cap_height: opt_int(table, "capHeight")?,
        })
    }
}
