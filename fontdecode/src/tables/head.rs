use once_cell::sync::Lazy;

use super::{int, FontTable};
use crate::error::Result;
use crate::schema::{field, type_ref, Array, Bitfield, Fixed, Number, Struct, Structure, TypeRef};

static MAC_STYLE: [Option<&str>; 7] = [
    Some("bold"),
    Some("italic"),
    Some("underline"),
    Some("outline"),
    Some("shadow"),
    Some("condensed"),
    Some("extended"),
];

static HEAD: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(Structure::new(vec![
        field("version", Fixed::FIXED32),
        field("revision", Fixed::FIXED32),
        field("checkSumAdjustment", Number::U32),
        field("magicNumber", Number::U32),
        field("flags", Number::U16),
        field("unitsPerEm", Number::U16),
        field("created", Array::new(Number::I32, 2)),
        field("modified", Array::new(Number::I32, 2)),
        field("xMin", Number::I16),
        field("yMin", Number::I16),
        field("xMax", Number::I16),
        field("yMax", Number::I16),
        field("macStyle", Bitfield::new(Number::U16, &MAC_STYLE)),
        field("lowestRecPPEM", Number::U16),
        field("fontDirectionHint", Number::I16),
        field("indexToLocFormat", Number::I16),
        field("glyphDataFormat", Number::I16),
    ]))
});

/// This table gives global information about the font.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/head
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6head.html
#[derive(Debug, PartialEq, Clone)]
pub struct HeadTable {
    /// Set by font manufacturer.
    pub(crate) font_revision: f64,
    /// Valid range is from 16 to 16384. This value should be a power of 2 for fonts that have
    /// TrueType outlines.
    pub(crate) units_per_em: u16,
    /// Seconds since 12:00 midnight that started January 1st 1904 in GMT/UTC time zone.
    pub(crate) created: i64,
    pub(crate) modified: i64,
    /// Bounding box for all glyphs.
    pub(crate) x_min: i16,
    pub(crate) y_min: i16,
    pub(crate) x_max: i16,
    pub(crate) y_max: i16,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    /// 0 for short offsets (Offset16), 1 for long (Offset32).
    pub(crate) index_to_loc_format: i16,
}

impl HeadTable {
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn font_revision(&self) -> f64 {
        self.font_revision
    }

    pub fn bbox(&self) -> [i16; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    pub fn index_to_loc_format(&self) -> i16 {
        self.index_to_loc_format
    }
}

fn long_date_time(table: &Struct, name: &str) -> Result<i64> {
    let parts = table.ints(name)?;
    Ok(match parts.as_slice() {
        [high, low] => (high << 32) | (low & 0xffff_ffff),
        _ => 0,
    })
}

impl FontTable for HeadTable {
    const TAG: &'static str = "head";

    fn schema() -> &'static TypeRef {
        &HEAD
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        let mac_style = table.flags("macStyle")?;
        Ok(HeadTable {
            font_revision: table.float("revision")?,
            units_per_em: int(table, "unitsPerEm")?,
            created: long_date_time(table, "created")?,
            modified: long_date_time(table, "modified")?,
            x_min: int(table, "xMin")?,
            y_min: int(table, "yMin")?,
            x_max: int(table, "xMax")?,
            y_max: int(table, "yMax")?,
            bold: mac_style.get("bold"),
            italic: mac_style.get("italic"),
            index_to_loc_format: int(table, "indexToLocFormat")?,
        })
    }
}
