use once_cell::sync::Lazy;

use super::{int, opt_int, FontTable};
use crate::error::Result;
use crate::schema::{field, type_ref, Number, Struct, TypeRef, VersionedStructure};

static MAXP: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(
        VersionedStructure::inline(Number::U32)
            .header(vec![field("numGlyphs", Number::U16)])
            .version(0x0000_5000, vec![])
            .version(
                0x0001_0000,
                vec![
                    field("maxPoints", Number::U16),
                    field("maxContours", Number::U16),
                    field("maxComponentPoints", Number::U16),
                    field("maxComponentContours", Number::U16),
                    field("maxZones", Number::U16),
                    field("maxTwilightPoints", Number::U16),
                    field("maxStorage", Number::U16),
                    field("maxFunctionDefs", Number::U16),
                    field("maxInstructionDefs", Number::U16),
                    field("maxStackElements", Number::U16),
                    field("maxSizeOfInstructions", Number::U16),
                    field("maxComponentElements", Number::U16),
                    field("maxComponentDepth", Number::U16),
                ],
            ),
    )
});

/// This table establishes the memory requirements for this font.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/maxp
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6maxp.html
#[derive(Debug, PartialEq, Clone)]
pub struct MaxpTable {
    /// 0x00005000 for fonts with CFF outlines, 0x00010000 for TrueType outlines.
    pub(crate) version: u32,
    /// The number of glyphs in the font.
    pub(crate) num_glyphs: u16,
    /// Maximum levels of recursion; 1 for simple components. Only present in version 1.0.
    pub(crate) max_component_depth: Option<u16>,
}

impl MaxpTable {
    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }
}

impl FontTable for MaxpTable {
    const TAG: &'static str = "maxp";

    fn schema() -> &'static TypeRef {
        &MAXP
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        Ok(MaxpTable {
            version: int(table, "version")?,
            num_glyphs: int(table, "numGlyphs")?,
            max_component_depth: opt_int(table, "maxComponentDepth")?,
        })
    }
}
