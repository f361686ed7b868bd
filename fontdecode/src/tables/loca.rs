use std::rc::Rc;

use once_cell::sync::Lazy;

use super::FontTable;
use crate::error::Result;
use crate::schema::{field, type_ref, Array, Number, Struct, TypeRef, Value, VersionedStructure};

static LOCA: Lazy<TypeRef> = Lazy::new(|| {
    type_ref(
        VersionedStructure::path("head.indexToLocFormat")
            .version(0, vec![field("offsets", Array::unbounded(Number::U16))])
            .version(1, vec![field("offsets", Array::unbounded(Number::U32))])
            .with_process(|table| {
                if table.int("version")? != 0 {
                    return Ok(());
                }
                // short offsets are stored divided by two
                let offsets = table
                    .ints("offsets")?
                    .into_iter()
                    .map(|offset| Value::Int(offset * 2))
                    .collect();
                table.set("offsets", Value::Array(Rc::new(offsets)));
                Ok(())
            }),
    )
});

/// This table stores the offsets to the locations of the glyphs in the font, relative to the
/// beginning of the glyph data table.
/// See spec:
/// - https://docs.microsoft.com/en-us/typography/opentype/spec/loca
/// - https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6loca.html
#[derive(Debug, PartialEq, Clone)]
pub struct LocaTable {
    pub(crate) offsets: Vec<u32>,
}

impl LocaTable {
    /// Byte range of a glyph within the `glyf` table, `None` for glyph ids out of range.
    pub fn range(&self, glyph_id: u16) -> Option<(usize, usize)> {
        let index = usize::from(glyph_id);
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some((start as usize, end as usize))
    }
}

impl FontTable for LocaTable {
    const TAG: &'static str = "loca";

    fn schema() -> &'static TypeRef {
        &LOCA
    }

    fn from_struct(table: &Struct) -> Result<Self> {
        Ok(LocaTable {
            offsets: table
                .ints("offsets")?
                .into_iter()
                .map(|offset| offset as u32)
                .collect(),
        })
    }
}
